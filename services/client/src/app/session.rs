//! services/client/src/app/session.rs
//!
//! Stored credentials and the session guard that decides, without a server
//! round trip, whether they are still usable.

use chaekgoeul_core::{
    ports::{Clock, KeyValueStore, PortResult},
    token::{self, TokenStatus},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

//=========================================================================================
// TokenStore
//=========================================================================================

/// The access/refresh token pair in durable storage.
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn access_token(&self) -> PortResult<Option<String>> {
        self.store.get(ACCESS_TOKEN_KEY).await
    }

    pub async fn refresh_token(&self) -> PortResult<Option<String>> {
        self.store.get(REFRESH_TOKEN_KEY).await
    }

    /// Replaces the stored pair. A missing refresh token removes any old one.
    pub async fn save(&self, access_token: &str, refresh_token: Option<&str>) -> PortResult<()> {
        self.store.set(ACCESS_TOKEN_KEY, access_token).await?;
        match refresh_token {
            Some(refresh) => self.store.set(REFRESH_TOKEN_KEY, refresh).await,
            None => self.store.remove(REFRESH_TOKEN_KEY).await,
        }
    }

    pub async fn clear(&self) -> PortResult<()> {
        self.store.remove(ACCESS_TOKEN_KEY).await?;
        self.store.remove(REFRESH_TOKEN_KEY).await
    }
}

//=========================================================================================
// SessionGuard
//=========================================================================================

/// Evaluates the stored token against the clock and scrubs it once it is
/// expired or malformed. The latest result is published on a watch channel.
pub struct SessionGuard {
    tokens: Arc<TokenStore>,
    clock: Arc<dyn Clock>,
    status_tx: watch::Sender<TokenStatus>,
}

impl SessionGuard {
    pub fn new(tokens: Arc<TokenStore>, clock: Arc<dyn Clock>) -> Self {
        let (status_tx, _) = watch::channel(TokenStatus::Missing);
        Self {
            tokens,
            clock,
            status_tx,
        }
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// The most recently published status.
    pub fn status(&self) -> TokenStatus {
        *self.status_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<TokenStatus> {
        self.status_tx.subscribe()
    }

    /// Re-evaluates the stored token.
    pub async fn check(&self) -> PortResult<TokenStatus> {
        self.check_token().await.map(|(status, _)| status)
    }

    /// The stored token, but only while it is valid. Used when attaching the
    /// bearer header so an expired token never leaves the client.
    pub async fn valid_token(&self) -> PortResult<Option<String>> {
        self.check_token().await.map(|(_, token)| token)
    }

    async fn check_token(&self) -> PortResult<(TokenStatus, Option<String>)> {
        let stored = self.tokens.access_token().await?;
        let status = token::evaluate(stored.as_deref(), self.clock.now());

        if status.requires_purge() {
            warn!(?status, "Stored token is no longer usable; removing credentials");
            self.tokens.clear().await?;
        }

        let previous = self.status_tx.send_replace(status);
        if previous != status {
            debug!(?previous, ?status, "Session status changed");
        }

        let token = if status.is_authenticated() { stored } else { None };
        Ok((status, token))
    }

    /// Checks every `interval` until `cancel` fires. The first check comes one
    /// interval after the call; callers check up front themselves.
    pub fn spawn_watch(self: Arc<Self>, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let first = tokio::time::Instant::now() + interval;
        tokio::spawn(async move {
            info!(interval_ms = interval.as_millis() as u64, "Session watch started.");
            let mut ticker = tokio::time::interval_at(first, interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Session watch cancelled.");
                        return;
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = self.check().await {
                            warn!("Session check failed: {}", e);
                        }
                    }
                }
            }
        })
    }
}
