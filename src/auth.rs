//! Auth/token boundary.
//!
//! The collector consumes credentials from an embedder-supplied
//! [`TokenProvider`] before every remote-store call. Validation failures
//! abort the current operation; an expired token additionally kicks off an
//! asynchronous refresh, without blocking or retrying the caller.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{info, warn};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("no access token available")]
    TokenMissing,
    #[error("access token expired")]
    TokenExpired,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub user_id: String,
}

#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current credentials, or `None` when the user is signed out.
    async fn credentials(&self) -> Result<Option<Credentials>>;

    /// Attempt to obtain a fresh token. Side effect only; failures are the
    /// provider's problem to surface on the next `credentials` call.
    async fn refresh(&self) -> Result<()>;
}

pub fn validate(credentials: &Credentials, now: DateTime<Utc>) -> Result<(), AuthError> {
    if credentials.access_token.is_empty() {
        return Err(AuthError::TokenMissing);
    }
    if now > credentials.expires_at {
        return Err(AuthError::TokenExpired);
    }
    Ok(())
}

/// Fetch and validate credentials. An expired token spawns a background
/// refresh before the error is returned.
pub async fn authorize(provider: &Arc<dyn TokenProvider>) -> Result<Credentials, AuthError> {
    let credentials = match provider.credentials().await {
        Ok(Some(credentials)) => credentials,
        Ok(None) => return Err(AuthError::TokenMissing),
        Err(err) => {
            warn!("token provider failed: {err:#}");
            return Err(AuthError::TokenMissing);
        }
    };

    match validate(&credentials, Utc::now()) {
        Ok(()) => Ok(credentials),
        Err(AuthError::TokenExpired) => {
            let provider = provider.clone();
            tokio::spawn(async move {
                match provider.refresh().await {
                    Ok(()) => info!("access token refreshed"),
                    Err(err) => warn!("token refresh failed: {err:#}"),
                }
            });
            Err(AuthError::TokenExpired)
        }
        Err(err) => Err(err),
    }
}
