//! crates/chaekgoeul_core/src/ports.rs
//!
//! Defines the service contracts (traits) the client services are written against.
//! The backend REST API, client-side storage and the wall clock all sit behind
//! these traits so the session, polling and like-sync logic can be driven by
//! fakes in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Book, BookApplication, BookId, Credentials, LikedBooks, QuizAnswer, QuizQuestion,
    QuizRequest, QuizResult, Scene, UserProfile,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
///
/// Cloneable so one failed backend call can be reported to every caller
/// sharing the same in-flight job.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Client-side infrastructure ports
//=========================================================================================

/// String key/value storage. Backs both the durable store (tokens, recent
/// searches) and the session-scoped store (redirect path).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> PortResult<()>;
    async fn remove(&self, key: &str) -> PortResult<()>;
}

/// Source of wall-clock time for token expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

//=========================================================================================
// Backend API Ports
//=========================================================================================

#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Returns the issued access token.
    async fn login(&self, credentials: &Credentials) -> PortResult<String>;
    async fn register(&self, credentials: &Credentials) -> PortResult<()>;
    async fn me(&self) -> PortResult<UserProfile>;
    async fn logout(&self) -> PortResult<()>;
    async fn delete_account(&self) -> PortResult<()>;
}

#[async_trait]
pub trait BookApi: Send + Sync {
    async fn popular_books(&self) -> PortResult<Vec<Book>>;
    async fn recent_books(&self) -> PortResult<Vec<Book>>;
    async fn banner_book(&self) -> PortResult<Book>;
    async fn search_books(&self, query: &str) -> PortResult<Vec<Book>>;
    /// Flips the like for `book_id` server-side and returns the new membership.
    async fn toggle_like(&self, book_id: BookId) -> PortResult<bool>;
    async fn liked_books(&self) -> PortResult<LikedBooks>;
}

#[async_trait]
pub trait SummaryApi: Send + Sync {
    /// Asks the backend to start generating an illustrated summary.
    async fn request_summary(&self, book_id: BookId) -> PortResult<()>;
    /// Returns the generated scenes, or an empty list while still pending.
    async fn lookup_summary(&self, book_id: BookId) -> PortResult<Vec<Scene>>;
}

#[async_trait]
pub trait QuizApi: Send + Sync {
    async fn generate_quiz(&self, request: &QuizRequest) -> PortResult<Vec<QuizQuestion>>;
    async fn submit_quiz(&self, answers: &[QuizAnswer]) -> PortResult<QuizResult>;
}

#[async_trait]
pub trait ApplicationApi: Send + Sync {
    async fn list_applications(&self) -> PortResult<Vec<BookApplication>>;
    async fn approve_application(&self, id: i64) -> PortResult<BookApplication>;
    async fn reject_application(&self, id: i64, reason: &str) -> PortResult<BookApplication>;
}
