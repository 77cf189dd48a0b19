//! services/client/src/adapters/http.rs
//!
//! The REST adapter: implements every backend port over `reqwest`.
//!
//! Requests carry `Authorization: Bearer <token>` only while the stored token
//! is valid. A 401/403 from any endpoint runs the navigator's global
//! unauthorized handler before the error reaches the caller.

use crate::app::{navigation::Navigator, session::SessionGuard};
use async_trait::async_trait;
use chaekgoeul_core::{
    domain::{
        Book, BookApplication, BookId, Credentials, LikedBooks, QuizAnswer, QuizQuestion,
        QuizRequest, QuizResult, Scene, UserProfile,
    },
    ports::{ApplicationApi, AuthApi, BookApi, PortError, PortResult, QuizApi, SummaryApi},
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

//=========================================================================================
// Wire payloads
//=========================================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BookIdBody {
    book_id: BookId,
}

#[derive(Serialize)]
struct RejectBody<'a> {
    reason: &'a str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ToggleResponse {
    Flag(bool),
    Wrapped { liked: bool },
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct HttpApi {
    http: Client,
    base_url: String,
    guard: Arc<SessionGuard>,
    navigator: Arc<Navigator>,
}

impl HttpApi {
    /// Creates a new `HttpApi` against `base_url` (no trailing slash).
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        guard: Arc<SessionGuard>,
        navigator: Arc<Navigator>,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            guard,
            navigator,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attaches credentials, sends, and maps non-success statuses.
    async fn send(&self, builder: RequestBuilder) -> PortResult<Response> {
        let builder = match self.guard.valid_token().await? {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;

        let status = response.status();
        debug!(url = %response.url(), %status, "Backend responded");
        match status {
            s if s.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!(%status, "Backend rejected credentials");
                if let Err(e) = self.navigator.on_unauthorized().await {
                    error!("Failed to clear session after {}: {}", status, e);
                }
                Err(PortError::Unauthorized)
            }
            StatusCode::NOT_FOUND => {
                let text = response.text().await.unwrap_or_default();
                Err(PortError::NotFound(text))
            }
            s => {
                let text = response.text().await.unwrap_or_else(|_| s.to_string());
                Err(PortError::Unexpected(format!("{}: {}", s, text)))
            }
        }
    }

    async fn json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> PortResult<T> {
        self.send(builder)
            .await?
            .json::<T>()
            .await
            .map_err(|e| PortError::Unexpected(format!("invalid response body: {}", e)))
    }

    /// Reads a body that may legitimately be empty or non-JSON.
    async fn loose_json(&self, builder: RequestBuilder) -> PortResult<Value> {
        let text = self
            .send(builder)
            .await?
            .text()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;
        Ok(serde_json::from_str(&text).unwrap_or(Value::Null))
    }
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl AuthApi for HttpApi {
    async fn login(&self, credentials: &Credentials) -> PortResult<String> {
        let response: LoginResponse = self
            .json(self.http.post(self.url("/users/login")).json(credentials))
            .await?;
        Ok(response.access_token)
    }

    async fn register(&self, credentials: &Credentials) -> PortResult<()> {
        self.send(self.http.post(self.url("/users/register")).json(credentials))
            .await?;
        Ok(())
    }

    async fn me(&self) -> PortResult<UserProfile> {
        self.json(self.http.get(self.url("/users/me"))).await
    }

    async fn logout(&self) -> PortResult<()> {
        self.send(self.http.post(self.url("/users/logout"))).await?;
        Ok(())
    }

    async fn delete_account(&self) -> PortResult<()> {
        self.send(self.http.delete(self.url("/users/delete"))).await?;
        Ok(())
    }
}

#[async_trait]
impl BookApi for HttpApi {
    async fn popular_books(&self) -> PortResult<Vec<Book>> {
        self.json(self.http.get(self.url("/book/popular"))).await
    }

    async fn recent_books(&self) -> PortResult<Vec<Book>> {
        self.json(self.http.get(self.url("/book/recent"))).await
    }

    async fn banner_book(&self) -> PortResult<Book> {
        self.json(self.http.get(self.url("/book/banner"))).await
    }

    async fn search_books(&self, query: &str) -> PortResult<Vec<Book>> {
        self.json(
            self.http
                .get(self.url("/book/search"))
                .query(&[("query", query)]),
        )
        .await
    }

    async fn toggle_like(&self, book_id: BookId) -> PortResult<bool> {
        let response: ToggleResponse = self
            .json(self.http.post(self.url(&format!("/book/like/{}", book_id))))
            .await?;
        Ok(match response {
            ToggleResponse::Flag(liked) | ToggleResponse::Wrapped { liked } => liked,
        })
    }

    async fn liked_books(&self) -> PortResult<LikedBooks> {
        let body = self.loose_json(self.http.get(self.url("/book/like/view"))).await?;
        Ok(LikedBooks::from_json(body))
    }
}

#[async_trait]
impl SummaryApi for HttpApi {
    async fn request_summary(&self, book_id: BookId) -> PortResult<()> {
        self.send(
            self.http
                .post(self.url("/summaries"))
                .json(&BookIdBody { book_id }),
        )
        .await?;
        Ok(())
    }

    async fn lookup_summary(&self, book_id: BookId) -> PortResult<Vec<Scene>> {
        let body = self
            .loose_json(
                self.http
                    .post(self.url("/summaries/lookup"))
                    .json(&BookIdBody { book_id }),
            )
            .await?;
        match body {
            Value::Array(_) => serde_json::from_value(body)
                .map_err(|e| PortError::Unexpected(format!("invalid scene list: {}", e))),
            _ => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl QuizApi for HttpApi {
    async fn generate_quiz(&self, request: &QuizRequest) -> PortResult<Vec<QuizQuestion>> {
        self.json(self.http.post(self.url("/quiz/generate")).json(request))
            .await
    }

    async fn submit_quiz(&self, answers: &[QuizAnswer]) -> PortResult<QuizResult> {
        self.json(self.http.post(self.url("/quiz/submit/batch")).json(answers))
            .await
    }
}

#[async_trait]
impl ApplicationApi for HttpApi {
    async fn list_applications(&self) -> PortResult<Vec<BookApplication>> {
        self.json(self.http.get(self.url("/apply/all"))).await
    }

    async fn approve_application(&self, id: i64) -> PortResult<BookApplication> {
        self.json(self.http.patch(self.url(&format!("/apply/{}/approve", id))))
            .await
    }

    async fn reject_application(&self, id: i64, reason: &str) -> PortResult<BookApplication> {
        self.json(
            self.http
                .patch(self.url(&format!("/apply/{}/reject", id)))
                .json(&RejectBody { reason }),
        )
        .await
    }
}
