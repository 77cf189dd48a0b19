// Shared fakes and fixtures for the client integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chaekgoeul_core::{
    domain::{Book, BookId, Credentials, LikedBooks, Scene, UserProfile},
    ports::{AuthApi, BookApi, Clock, PortError, PortResult, SummaryApi},
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use client_lib::adapters::MemoryStore;
use client_lib::app::{Navigator, SessionGuard, TokenStore};
use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

//=========================================================================================
// Clock and tokens
//=========================================================================================

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

/// A clock that only moves when told to.
pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

pub fn token_expiring_at(exp: DateTime<Utc>) -> String {
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{},"sub":"reader"}}"#, exp.timestamp()))
    )
}

pub fn valid_token() -> String {
    token_expiring_at(base_time() + Duration::hours(1))
}

pub fn expired_token() -> String {
    token_expiring_at(base_time() - Duration::hours(1))
}

//=========================================================================================
// Session wiring
//=========================================================================================

pub struct Session {
    pub durable: Arc<MemoryStore>,
    pub session_store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
    pub tokens: Arc<TokenStore>,
    pub guard: Arc<SessionGuard>,
    pub navigator: Arc<Navigator>,
}

pub fn session() -> Session {
    let durable = Arc::new(MemoryStore::new());
    let session_store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(base_time()));
    let tokens = Arc::new(TokenStore::new(durable.clone()));
    let guard = Arc::new(SessionGuard::new(tokens.clone(), clock.clone()));
    let navigator = Arc::new(Navigator::new(guard.clone(), session_store.clone()));
    Session {
        durable,
        session_store,
        clock,
        tokens,
        guard,
        navigator,
    }
}

pub fn book(id: BookId) -> Book {
    Book {
        id,
        title: format!("책 {}", id),
        author: None,
        cover_image: None,
        description: None,
        like_count: None,
    }
}

pub fn scene(page: u32) -> Scene {
    Scene {
        page,
        content: format!("장면 {}", page),
        image_url: Some(format!("https://img.example/{}.png", page)),
    }
}

//=========================================================================================
// SummaryApi fake
//=========================================================================================

/// Replays scripted lookup results; an exhausted script reads as "pending".
pub struct ScriptedSummaryApi {
    enqueue_result: PortResult<()>,
    lookups: Mutex<VecDeque<PortResult<Vec<Scene>>>>,
    pub enqueue_calls: AtomicUsize,
    pub lookup_calls: AtomicUsize,
}

impl ScriptedSummaryApi {
    pub fn new(lookups: Vec<PortResult<Vec<Scene>>>) -> Self {
        Self {
            enqueue_result: Ok(()),
            lookups: Mutex::new(lookups.into()),
            enqueue_calls: AtomicUsize::new(0),
            lookup_calls: AtomicUsize::new(0),
        }
    }

    /// Ready on the `n`-th lookup.
    pub fn ready_on(n: usize, scenes: Vec<Scene>) -> Self {
        let mut script: Vec<PortResult<Vec<Scene>>> = (1..n).map(|_| Ok(Vec::new())).collect();
        script.push(Ok(scenes));
        Self::new(script)
    }

    pub fn never_ready() -> Self {
        Self::new(Vec::new())
    }

    pub fn failing_enqueue(error: PortError) -> Self {
        Self {
            enqueue_result: Err(error),
            ..Self::never_ready()
        }
    }

    pub fn enqueues(&self) -> usize {
        self.enqueue_calls.load(Ordering::SeqCst)
    }

    pub fn lookups(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SummaryApi for ScriptedSummaryApi {
    async fn request_summary(&self, _book_id: BookId) -> PortResult<()> {
        self.enqueue_calls.fetch_add(1, Ordering::SeqCst);
        self.enqueue_result.clone()
    }

    async fn lookup_summary(&self, _book_id: BookId) -> PortResult<Vec<Scene>> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        self.lookups
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

//=========================================================================================
// BookApi fake
//=========================================================================================

/// Keeps a server-side liked set and flips it on toggle.
#[derive(Default)]
pub struct FakeBookApi {
    pub server_likes: Mutex<BTreeSet<BookId>>,
    pub fail_toggle: AtomicBool,
    pub fail_liked: AtomicBool,
    /// Answer the liked list with bare ids instead of book objects.
    pub ids_only: AtomicBool,
    pub liked_calls: AtomicUsize,
    pub toggle_calls: AtomicUsize,
    hold_toggle: tokio::sync::Mutex<Option<oneshot::Receiver<()>>>,
    hold_liked: tokio::sync::Mutex<Option<oneshot::Receiver<()>>>,
}

impl FakeBookApi {
    pub fn with_likes(ids: &[BookId]) -> Self {
        let api = Self::default();
        api.server_likes.lock().unwrap().extend(ids.iter().copied());
        api
    }

    pub fn set_server_likes(&self, ids: &[BookId]) {
        let mut likes = self.server_likes.lock().unwrap();
        likes.clear();
        likes.extend(ids.iter().copied());
    }

    /// The next toggle waits until the returned sender fires.
    pub async fn hold_next_toggle(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.hold_toggle.lock().await = Some(rx);
        tx
    }

    /// The next liked-list read snapshots the server state, then waits
    /// until the returned sender fires.
    pub async fn hold_next_liked(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.hold_liked.lock().await = Some(rx);
        tx
    }

    pub fn liked_fetches(&self) -> usize {
        self.liked_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BookApi for FakeBookApi {
    async fn popular_books(&self) -> PortResult<Vec<Book>> {
        Ok(vec![book(1), book(2)])
    }

    async fn recent_books(&self) -> PortResult<Vec<Book>> {
        Ok(vec![book(3)])
    }

    async fn banner_book(&self) -> PortResult<Book> {
        Ok(book(1))
    }

    async fn search_books(&self, _query: &str) -> PortResult<Vec<Book>> {
        Err(PortError::Transport("connection reset".to_string()))
    }

    async fn toggle_like(&self, book_id: BookId) -> PortResult<bool> {
        self.toggle_calls.fetch_add(1, Ordering::SeqCst);
        let hold = self.hold_toggle.lock().await.take();
        if let Some(rx) = hold {
            let _ = rx.await;
        }
        if self.fail_toggle.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("500 Internal Server Error".to_string()));
        }
        let mut likes = self.server_likes.lock().unwrap();
        if likes.remove(&book_id) {
            Ok(false)
        } else {
            likes.insert(book_id);
            Ok(true)
        }
    }

    async fn liked_books(&self) -> PortResult<LikedBooks> {
        self.liked_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_liked.load(Ordering::SeqCst) {
            return Err(PortError::Transport("timed out".to_string()));
        }
        let ids: Vec<BookId> = self.server_likes.lock().unwrap().iter().copied().collect();
        let hold = self.hold_liked.lock().await.take();
        if let Some(rx) = hold {
            let _ = rx.await;
        }
        let books = if self.ids_only.load(Ordering::SeqCst) {
            Vec::new()
        } else {
            ids.iter().map(|id| book(*id)).collect()
        };
        Ok(LikedBooks { ids, books })
    }
}

//=========================================================================================
// AuthApi fake
//=========================================================================================

pub struct FakeAuthApi {
    pub issued_token: Mutex<String>,
    pub fail_logout: AtomicBool,
    pub login_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
}

impl FakeAuthApi {
    pub fn issuing(token: String) -> Self {
        Self {
            issued_token: Mutex::new(token),
            fail_logout: AtomicBool::new(false),
            login_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AuthApi for FakeAuthApi {
    async fn login(&self, _credentials: &Credentials) -> PortResult<String> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.issued_token.lock().unwrap().clone())
    }

    async fn register(&self, _credentials: &Credentials) -> PortResult<()> {
        Ok(())
    }

    async fn me(&self) -> PortResult<UserProfile> {
        Ok(UserProfile {
            id: Some(1),
            username: "reader".to_string(),
            nickname: Some("책벌레".to_string()),
            role: None,
        })
    }

    async fn logout(&self) -> PortResult<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_logout.load(Ordering::SeqCst) {
            return Err(PortError::Transport("connection refused".to_string()));
        }
        Ok(())
    }

    async fn delete_account(&self) -> PortResult<()> {
        Ok(())
    }
}
