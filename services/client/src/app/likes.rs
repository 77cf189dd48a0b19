//! services/client/src/app/likes.rs
//!
//! The client's mirror of which books the user has liked.
//!
//! The server is authoritative: a toggle is applied only after the server
//! reports the new membership, and a read of the liked list replaces the
//! mirror wholesale. Every request records the epoch it started in; `clear()`
//! (logout) bumps the epoch so responses that were in flight at logout are
//! dropped. Reads also record the toggle generation, so a list fetched before
//! a toggle committed never overwrites that toggle.

use chaekgoeul_core::{
    domain::{Book, BookId, LikedBooks},
    ports::{BookApi, PortResult},
};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info};

#[derive(Default)]
struct LikedQuery {
    value: Option<LikedBooks>,
    stale: bool,
}

#[derive(Default)]
struct LikeState {
    epoch: u64,
    /// Bumped by every committed toggle.
    generation: u64,
    ids: BTreeSet<BookId>,
    details: HashMap<BookId, Book>,
    liked_query: LikedQuery,
}

impl LikeState {
    /// The liked list with whatever details are known for each id.
    fn view(&self, ids: Vec<BookId>) -> LikedBooks {
        let books = ids
            .iter()
            .filter_map(|id| self.details.get(id).cloned())
            .collect();
        LikedBooks { ids, books }
    }
}

pub struct LikeSync {
    api: Arc<dyn BookApi>,
    state: Mutex<LikeState>,
}

impl LikeSync {
    pub fn new(api: Arc<dyn BookApi>) -> Self {
        Self {
            api,
            state: Mutex::new(LikeState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, LikeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replaces the liked set with the server's current list.
    pub async fn fetch(&self) -> PortResult<()> {
        self.reload().await.map(|_| ()).map_err(|e| {
            error!("Failed to fetch liked books: {}", e);
            e
        })
    }

    /// Read-through view of the liked list. Served from cache until a toggle
    /// marks it stale. Books whose details were never sent are listed in
    /// `ids` only.
    pub async fn liked_books(&self) -> PortResult<LikedBooks> {
        {
            let state = self.state();
            if let (Some(cached), false) = (&state.liked_query.value, state.liked_query.stale) {
                return Ok(cached.clone());
            }
        }
        self.reload().await
    }

    async fn reload(&self) -> PortResult<LikedBooks> {
        let (epoch, generation) = {
            let state = self.state();
            (state.epoch, state.generation)
        };
        let liked = self.api.liked_books().await?;

        let mut state = self.state();
        if state.epoch != epoch {
            debug!("Discarding liked list fetched before the last clear.");
            return Ok(liked);
        }
        if state.generation != generation {
            debug!("Liked list predates a toggle; keeping the mirror and the stale mark.");
            return Ok(liked);
        }

        state.ids = liked.ids.iter().copied().collect();
        let LikeState { ids, details, .. } = &mut *state;
        details.retain(|id, _| ids.contains(id));
        details.extend(liked.books.into_iter().map(|b| (b.id, b)));
        let view = state.view(liked.ids);
        state.liked_query = LikedQuery {
            value: Some(view.clone()),
            stale: false,
        };
        info!(count = state.ids.len(), "Liked books refreshed.");
        Ok(view)
    }

    /// Flips the like on `book_id` server-side and applies the reported
    /// membership. The mirror is untouched if the call fails.
    pub async fn toggle(&self, book_id: BookId) -> PortResult<bool> {
        let epoch = self.state().epoch;
        let liked = self.api.toggle_like(book_id).await.map_err(|e| {
            error!(book_id, "Failed to toggle like: {}", e);
            e
        })?;

        let mut state = self.state();
        if state.epoch != epoch {
            debug!(book_id, "Discarding like toggle that resolved after the last clear.");
            return Ok(liked);
        }
        state.generation += 1;
        if liked {
            state.ids.insert(book_id);
        } else {
            state.ids.remove(&book_id);
            state.details.remove(&book_id);
        }
        // The caller already knows the outcome; refetch only when next read.
        state.liked_query.stale = true;
        debug!(book_id, liked, "Like toggled.");
        Ok(liked)
    }

    /// Drops everything known about the user's likes. Used on logout.
    pub fn clear(&self) {
        let mut state = self.state();
        state.epoch += 1;
        state.ids.clear();
        state.details.clear();
        state.liked_query = LikedQuery::default();
        info!("Liked books cleared.");
    }

    pub fn is_liked(&self, book_id: BookId) -> bool {
        self.state().ids.contains(&book_id)
    }

    pub fn liked_ids(&self) -> Vec<BookId> {
        self.state().ids.iter().copied().collect()
    }

    pub fn detail(&self, book_id: BookId) -> Option<Book> {
        self.state().details.get(&book_id).cloned()
    }

    pub fn is_liked_query_stale(&self) -> bool {
        self.state().liked_query.stale
    }
}
