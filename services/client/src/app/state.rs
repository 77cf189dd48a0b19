//! services/client/src/app/state.rs
//!
//! Wires the adapters and services together. One `AppState` owns the whole
//! client session; there is no process-global state.

use crate::adapters::http::HttpApi;
use crate::app::{
    applications::ApplicationService, auth::AuthService, catalog::BookCatalog, likes::LikeSync,
    navigation::Navigator, quiz::QuizService, session::SessionGuard, session::TokenStore,
    summary::SummaryService,
};
use crate::config::Config;
use crate::error::ClientError;
use chaekgoeul_core::ports::{Clock, KeyValueStore};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// The client's shared state, created once at startup.
pub struct AppState {
    pub config: Arc<Config>,
    pub guard: Arc<SessionGuard>,
    pub navigator: Arc<Navigator>,
    pub likes: Arc<LikeSync>,
    pub summaries: Arc<SummaryService>,
    pub auth: Arc<AuthService>,
    pub catalog: Arc<BookCatalog>,
    pub quiz: Arc<QuizService>,
    pub applications: Arc<ApplicationService>,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn build(
        config: Arc<Config>,
        durable: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ClientError> {
        let tokens = Arc::new(TokenStore::new(durable.clone()));
        let guard = Arc::new(SessionGuard::new(tokens, clock));
        let navigator = Arc::new(Navigator::new(guard.clone(), session));

        let api = Arc::new(HttpApi::new(
            config.api_base_url.clone(),
            config.http_timeout,
            guard.clone(),
            navigator.clone(),
        )?);

        let likes = Arc::new(LikeSync::new(api.clone()));
        let summaries = Arc::new(SummaryService::new(api.clone(), config.summary_poll));
        let auth = Arc::new(AuthService::new(
            api.clone(),
            guard.clone(),
            navigator.clone(),
            likes.clone(),
        ));
        let catalog = Arc::new(BookCatalog::new(api.clone(), durable));
        let quiz = Arc::new(QuizService::new(api.clone()));
        let applications = Arc::new(ApplicationService::new(api));

        Ok(Self {
            config,
            guard,
            navigator,
            likes,
            summaries,
            auth,
            catalog,
            quiz,
            applications,
            shutdown: CancellationToken::new(),
        })
    }

    /// Runs the startup checks and starts the periodic session watch.
    /// Liked books are loaded when a valid session already exists.
    pub async fn start(&self) -> Result<JoinHandle<()>, ClientError> {
        let status = self.guard.check().await?;
        info!(?status, "Initial session check complete.");
        if status.is_authenticated() {
            if let Err(e) = self.likes.fetch().await {
                warn!("Could not load liked books at startup: {}", e);
            }
        }

        Ok(self
            .guard
            .clone()
            .spawn_watch(self.config.session_check_interval, self.shutdown.child_token()))
    }

    /// A token cancelled when the state shuts down; hand it to long-running
    /// operations such as summary polling.
    pub fn lifetime(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    pub fn shutdown(&self) {
        info!("Shutting down client state.");
        self.shutdown.cancel();
    }
}
