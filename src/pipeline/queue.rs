//! Visit event queue.
//!
//! Single-consumer FIFO: producers enqueue freely, one worker task drains
//! one event at a time and awaits its entire downstream pipeline before
//! taking the next. Latency of one event delays all subsequent ones —
//! deliberate backpressure, acceptable at human navigation pace.

use std::sync::{Arc, Mutex as StdMutex};

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::browser::HistoryItem;
use crate::pipeline::Pipeline;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

pub struct QueueController {
    tx: mpsc::UnboundedSender<HistoryItem>,
    rx: StdMutex<Option<mpsc::UnboundedReceiver<HistoryItem>>>,
    worker: StdMutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl QueueController {
    /// Create the queue. Events may be enqueued immediately; they sit in
    /// the channel until [`start`](Self::start) spawns the worker.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: StdMutex::new(Some(rx)),
            worker: StdMutex::new(None),
        }
    }

    pub fn enqueue(&self, item: HistoryItem) {
        if self.tx.send(item).is_err() {
            log_warn!("visit queue is closed, dropping event");
        }
    }

    pub fn start(&self, pipeline: Arc<Pipeline>) -> Result<()> {
        let mut worker = self.worker.lock().unwrap();
        if worker.is_some() {
            bail!("visit queue already running");
        }

        let Some(mut rx) = self.rx.lock().unwrap().take() else {
            bail!("visit queue was already stopped");
        };

        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    item = rx.recv() => {
                        let Some(item) = item else { break };
                        // A failed event is logged and dropped; the next one
                        // must still be processed.
                        if let Err(err) = pipeline.process(item).await {
                            log_error!("visit processing failed: {err:#}");
                        }
                    }
                    _ = token.cancelled() => {
                        log_info!("visit queue shutting down");
                        break;
                    }
                }
            }
        });

        *worker = Some((cancel, handle));
        Ok(())
    }

    pub async fn stop(&self) -> Result<()> {
        let taken = self.worker.lock().unwrap().take();
        if let Some((cancel, handle)) = taken {
            cancel.cancel();
            handle.await.context("queue worker failed to join")?;
        }
        Ok(())
    }
}

impl Default for QueueController {
    fn default() -> Self {
        Self::new()
    }
}
