//! services/client/src/oauth_callback.rs
//!
//! Local listener for the OAuth redirect. The provider sends the browser to
//! `/oauth/callback?accessToken=..&refreshToken=..`; the first request that
//! carries an access token completes the wait, and the listener shuts down.

use crate::app::navigation::OAUTH_CALLBACK_ROUTE;
use crate::error::ClientError;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const SUCCESS_PAGE: &str = "<html><body><h1>로그인되었습니다</h1><p>이 창을 닫고 터미널로 돌아가세요.</p></body></html>";
const MISSING_TOKEN_PAGE: &str = "<html><body><h1>로그인 실패</h1><p>토큰이 전달되지 않았습니다.</p></body></html>";
const ALREADY_DONE_PAGE: &str = "<html><body><h1>이미 처리된 요청입니다</h1></body></html>";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackParams {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

type Slot = Arc<Mutex<Option<oneshot::Sender<OAuthTokens>>>>;

async fn callback_handler(
    State(slot): State<Slot>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, Html<&'static str>) {
    let Some(access_token) = params.access_token.filter(|t| !t.is_empty()) else {
        warn!("OAuth callback arrived without an access token.");
        return (StatusCode::BAD_REQUEST, Html(MISSING_TOKEN_PAGE));
    };

    match slot.lock().await.take() {
        Some(tx) => {
            let tokens = OAuthTokens {
                access_token,
                refresh_token: params.refresh_token.filter(|t| !t.is_empty()),
            };
            if tx.send(tokens).is_err() {
                warn!("OAuth callback received after the waiter gave up.");
            }
            (StatusCode::OK, Html(SUCCESS_PAGE))
        }
        None => (StatusCode::GONE, Html(ALREADY_DONE_PAGE)),
    }
}

/// A bound callback listener.
pub struct CallbackListener {
    listener: TcpListener,
}

impl CallbackListener {
    pub async fn bind(addr: SocketAddr) -> Result<Self, ClientError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ClientError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn callback_url(&self) -> Result<String, ClientError> {
        Ok(format!("http://{}{}", self.local_addr()?, OAUTH_CALLBACK_ROUTE))
    }

    /// Serves until the tokens arrive or `cancel` fires.
    pub async fn wait_for_tokens(self, cancel: &CancellationToken) -> Result<OAuthTokens, ClientError> {
        let (tx, rx) = oneshot::channel();
        let slot: Slot = Arc::new(Mutex::new(Some(tx)));
        let app = Router::new()
            .route(OAUTH_CALLBACK_ROUTE, get(callback_handler))
            .with_state(slot);

        info!("📡 Waiting for OAuth callback on {}", self.local_addr()?);
        let shutdown = CancellationToken::new();
        let server_shutdown = shutdown.clone();
        let server = tokio::spawn(async move {
            axum::serve(self.listener, app)
                .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
                .await
        });

        let result = tokio::select! {
            _ = cancel.cancelled() => Err(ClientError::Internal("OAuth login cancelled".to_string())),
            tokens = rx => tokens.map_err(|_| ClientError::Internal("OAuth listener stopped".to_string())),
        };

        shutdown.cancel();
        match server.await {
            Ok(Err(e)) => warn!("OAuth callback listener error: {}", e),
            Err(e) => warn!("OAuth callback listener task failed: {}", e),
            Ok(Ok(())) => {}
        }

        if result.is_ok() {
            info!("✅ Received OAuth tokens");
        }
        result
    }
}
