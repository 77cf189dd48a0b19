//! services/client/src/app/applications.rs
//!
//! Review of users' book applications.

use chaekgoeul_core::{
    domain::BookApplication,
    ports::{ApplicationApi, PortError, PortResult},
};
use std::sync::Arc;
use tracing::{error, info};

pub struct ApplicationService {
    api: Arc<dyn ApplicationApi>,
}

impl ApplicationService {
    pub fn new(api: Arc<dyn ApplicationApi>) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> PortResult<Vec<BookApplication>> {
        self.api.list_applications().await
    }

    pub async fn approve(&self, id: i64) -> PortResult<BookApplication> {
        let application = self.api.approve_application(id).await.map_err(|e| {
            error!(id, "Approving application failed: {}", e);
            e
        })?;
        info!(id, "Application approved.");
        Ok(application)
    }

    /// Rejects an application. A reason is mandatory.
    pub async fn reject(&self, id: i64, reason: &str) -> PortResult<BookApplication> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(PortError::Validation("a rejection reason is required".to_string()));
        }
        let application = self.api.reject_application(id, reason).await.map_err(|e| {
            error!(id, "Rejecting application failed: {}", e);
            e
        })?;
        info!(id, "Application rejected.");
        Ok(application)
    }
}
