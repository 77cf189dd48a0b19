//! services/client/src/app/navigation.rs
//!
//! Route-level authorization. Every location change outside the public
//! allow-list is checked against the session guard; unauthenticated visits
//! are remembered for replay after login and sent back to the entry route.

use crate::app::session::SessionGuard;
use chaekgoeul_core::{
    ports::{KeyValueStore, PortResult},
    token::TokenStatus,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

pub const ENTRY_ROUTE: &str = "/";
pub const DEFAULT_LANDING_ROUTE: &str = "/main";
pub const OAUTH_CALLBACK_ROUTE: &str = "/oauth/callback";
pub const PUBLIC_ROUTES: &[&str] = &[ENTRY_ROUTE, "/register", OAUTH_CALLBACK_ROUTE];

/// Session-storage key for the path to replay after login.
pub const REDIRECT_PATH_KEY: &str = "redirectPath";

/// Why a visitor was sent back to the entry route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthNotice {
    LoginRequired,
    SessionExpired,
}

impl AuthNotice {
    pub fn message(self) -> &'static str {
        match self {
            AuthNotice::LoginRequired => "로그인이 필요합니다.",
            AuthNotice::SessionExpired => "세션이 만료되었습니다. 다시 로그인해주세요.",
        }
    }

    fn for_status(status: TokenStatus) -> Self {
        match status {
            TokenStatus::Missing => AuthNotice::LoginRequired,
            _ => AuthNotice::SessionExpired,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Allowed { path: String },
    Redirected { to: &'static str, notice: AuthNotice },
}

/// Tracks the current location and applies the auth redirect rules.
pub struct Navigator {
    guard: Arc<SessionGuard>,
    session_store: Arc<dyn KeyValueStore>,
    location: RwLock<String>,
}

pub fn is_public(path: &str) -> bool {
    let route = path.split(&['?', '#'][..]).next().unwrap_or(path);
    PUBLIC_ROUTES.contains(&route)
}

impl Navigator {
    pub fn new(guard: Arc<SessionGuard>, session_store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            guard,
            session_store,
            location: RwLock::new(ENTRY_ROUTE.to_string()),
        }
    }

    pub async fn current_path(&self) -> String {
        self.location.read().await.clone()
    }

    /// Moves to `path` if the session allows it.
    pub async fn navigate(&self, path: &str) -> PortResult<Navigation> {
        if is_public(path) {
            self.set_location(path).await;
            return Ok(Navigation::Allowed { path: path.to_string() });
        }

        let status = self.guard.check().await?;
        if status.is_authenticated() {
            self.set_location(path).await;
            return Ok(Navigation::Allowed { path: path.to_string() });
        }

        let notice = AuthNotice::for_status(status);
        info!(path, ?status, "Blocked protected route; redirecting to entry.");
        self.remember(path).await?;
        self.set_location(ENTRY_ROUTE).await;
        Ok(Navigation::Redirected { to: ENTRY_ROUTE, notice })
    }

    /// Global reaction to a 401/403 from the backend.
    pub async fn on_unauthorized(&self) -> PortResult<()> {
        self.guard.tokens().clear().await?;
        self.guard.check().await?;

        let current = self.current_path().await;
        if !is_public(&current) {
            self.remember(&current).await?;
        }
        info!(path = %current, "Backend rejected credentials; returning to entry route.");
        self.set_location(ENTRY_ROUTE).await;
        Ok(())
    }

    /// Consumes the saved path, if any.
    pub async fn take_redirect_path(&self) -> PortResult<Option<String>> {
        let saved = self.session_store.get(REDIRECT_PATH_KEY).await?;
        if saved.is_some() {
            self.session_store.remove(REDIRECT_PATH_KEY).await?;
        }
        Ok(saved)
    }

    /// Where to go after a successful login: the saved path or the default
    /// landing route. Moves there.
    pub async fn replay_after_login(&self) -> PortResult<String> {
        let target = self
            .take_redirect_path()
            .await?
            .unwrap_or_else(|| DEFAULT_LANDING_ROUTE.to_string());
        self.set_location(&target).await;
        Ok(target)
    }

    async fn remember(&self, path: &str) -> PortResult<()> {
        self.session_store.set(REDIRECT_PATH_KEY, path).await
    }

    async fn set_location(&self, path: &str) {
        debug!(path, "Location changed");
        *self.location.write().await = path.to_string();
    }
}
