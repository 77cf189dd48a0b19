//! services/client/src/app/auth.rs
//!
//! Login, registration, OAuth completion and session teardown.

use crate::app::{likes::LikeSync, navigation::Navigator, session::SessionGuard};
use chaekgoeul_core::{
    domain::{Credentials, UserProfile},
    ports::{AuthApi, PortError, PortResult},
};
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct AuthService {
    api: Arc<dyn AuthApi>,
    guard: Arc<SessionGuard>,
    navigator: Arc<Navigator>,
    likes: Arc<LikeSync>,
}

fn credentials(username: &str, password: &str) -> PortResult<Credentials> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(PortError::Validation(
            "username and password are required".to_string(),
        ));
    }
    Ok(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

impl AuthService {
    pub fn new(
        api: Arc<dyn AuthApi>,
        guard: Arc<SessionGuard>,
        navigator: Arc<Navigator>,
        likes: Arc<LikeSync>,
    ) -> Self {
        Self {
            api,
            guard,
            navigator,
            likes,
        }
    }

    /// Logs in and returns the route to continue at.
    pub async fn login(&self, username: &str, password: &str) -> PortResult<String> {
        let credentials = credentials(username, password)?;
        let access_token = self.api.login(&credentials).await.map_err(|e| {
            error!("Login failed: {}", e);
            e
        })?;

        self.start_session(&access_token, None).await
    }

    pub async fn register(&self, username: &str, password: &str) -> PortResult<()> {
        let credentials = credentials(username, password)?;
        self.api.register(&credentials).await.map_err(|e| {
            error!("Registration failed: {}", e);
            e
        })?;
        info!(username = %credentials.username, "Registered new account.");
        Ok(())
    }

    /// Finishes an OAuth round trip whose callback delivered the tokens.
    pub async fn complete_oauth(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> PortResult<String> {
        if access_token.is_empty() {
            return Err(PortError::Validation("OAuth callback carried no access token".to_string()));
        }
        self.start_session(access_token, refresh_token).await
    }

    pub async fn me(&self) -> PortResult<UserProfile> {
        self.api.me().await
    }

    /// Ends the session. Local state is torn down even if the server call
    /// fails; the server's answer is still reported.
    pub async fn logout(&self) -> PortResult<()> {
        let outcome = self.api.logout().await;
        if let Err(e) = &outcome {
            warn!("Server logout failed, clearing local session anyway: {}", e);
        }
        self.teardown().await?;
        outcome
    }

    /// Deletes the account. Same best-effort local teardown as `logout`.
    pub async fn delete_account(&self) -> PortResult<()> {
        let outcome = self.api.delete_account().await;
        if let Err(e) = &outcome {
            warn!("Account deletion failed, clearing local session anyway: {}", e);
        }
        self.teardown().await?;
        outcome
    }

    async fn start_session(&self, access_token: &str, refresh_token: Option<&str>) -> PortResult<String> {
        self.guard.tokens().save(access_token, refresh_token).await?;
        let status = self.guard.check().await?;
        if !status.is_authenticated() {
            warn!(?status, "Issued token is not usable.");
            return Err(PortError::Unauthorized);
        }

        if let Err(e) = self.likes.fetch().await {
            warn!("Could not load liked books after login: {}", e);
        }

        let target = self.navigator.replay_after_login().await?;
        info!(target = %target, "Session started.");
        Ok(target)
    }

    async fn teardown(&self) -> PortResult<()> {
        self.likes.clear();
        self.guard.tokens().clear().await?;
        self.guard.check().await?;
        info!("Local session cleared.");
        Ok(())
    }
}
