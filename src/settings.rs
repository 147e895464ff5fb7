use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

/// Tunables for the collector. Defaults match production behavior; the
/// settings file only needs the keys it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectorSettings {
    /// Base URL of the remote record store, e.g.
    /// `https://project.supabase.co/rest/v1`.
    pub store_base_url: String,
    /// Optional `apikey` header sent alongside the bearer token.
    pub store_api_key: Option<String>,
    /// Inactivity gap after which a browsing session is abandoned.
    pub session_timeout_ms: i64,
    pub keepalive_interval_secs: u64,
    /// Debounce before the upload buffer flushes.
    pub debounce_ms: u64,
    pub retry_attempts: u32,
    pub retry_interval_ms: u64,
    /// Tolerance when matching a visit event against the visit log.
    pub visit_tolerance_ms: i64,
    pub favicon_size: u32,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            store_base_url: String::new(),
            store_api_key: None,
            session_timeout_ms: crate::session::SESSION_TIMEOUT_MS,
            keepalive_interval_secs: 60,
            debounce_ms: 1_500,
            retry_attempts: 5,
            retry_interval_ms: 500,
            visit_tolerance_ms: 1_000,
            favicon_size: 64,
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<CollectorSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            CollectorSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn settings(&self) -> CollectorSettings {
        self.data.read().unwrap().clone()
    }

    pub fn update(&self, settings: CollectorSettings) -> Result<()> {
        {
            let mut guard = self.data.write().unwrap();
            *guard = settings;
            self.persist(&guard)?;
        }
        Ok(())
    }

    fn persist(&self, data: &CollectorSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
