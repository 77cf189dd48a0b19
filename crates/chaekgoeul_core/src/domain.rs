//! crates/chaekgoeul_core/src/domain.rs
//!
//! Defines the core data structures shared by the client services.
//! Field names follow the backend's camelCase JSON so adapters can
//! (de)serialize these types directly.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Backend identifier of a book.
pub type BookId = i64;

/// A book as listed by the catalog endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub like_count: Option<u64>,
}

/// One page of an illustrated summary. Scenes are read in the order the
/// backend returns them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub page: u32,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Login / registration payload.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<i64>,
    pub username: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

// --- Quiz ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuizType {
    MultipleChoice,
    Ox,
    ShortAnswer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRequest {
    pub book_id: BookId,
    #[serde(rename = "type")]
    pub quiz_type: QuizType,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub quiz_id: i64,
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswer {
    pub quiz_id: i64,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizGrade {
    pub quiz_id: i64,
    pub correct: bool,
    #[serde(default)]
    pub correct_answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub score: u32,
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub results: Vec<QuizGrade>,
}

// --- Book applications ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

/// A user's request to add a book to the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookApplication {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub reject_reason: Option<String>,
}

// --- Likes ---

/// The liked-list endpoint answers either with bare ids or with full book
/// objects. Both shapes normalize into this struct; `books` is empty when
/// only ids were sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LikedBooks {
    pub ids: Vec<BookId>,
    pub books: Vec<Book>,
}

impl LikedBooks {
    /// Normalizes a raw liked-list response. Anything that is not an array
    /// is treated as an empty list. Array items that are neither an id nor
    /// a book object are skipped.
    pub fn from_json(value: Value) -> Self {
        let Value::Array(items) = value else {
            return Self::default();
        };

        let mut liked = Self::default();
        for item in items {
            match item {
                Value::Number(n) => {
                    if let Some(id) = n.as_i64() {
                        liked.push_id(id);
                    }
                }
                obj @ Value::Object(_) => {
                    if let Ok(book) = serde_json::from_value::<Book>(obj) {
                        liked.push_id(book.id);
                        liked.books.push(book);
                    }
                }
                _ => {}
            }
        }
        liked
    }

    fn push_id(&mut self, id: BookId) {
        if !self.ids.contains(&id) {
            self.ids.push(id);
        }
    }
}
