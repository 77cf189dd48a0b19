//! services/client/src/app/summary.rs
//!
//! The illustrated-summary protocol: ask the backend to generate a summary,
//! then poll the lookup endpoint until it returns scenes or the attempt
//! budget runs out.
//!
//! Concurrent requests for the same book share one enqueue+poll job. Each
//! caller brings its own `CancellationToken`; the shared job is cancelled
//! only when the last caller waiting on it goes away.

use chaekgoeul_core::{
    domain::{BookId, Scene},
    ports::{PortError, SummaryApi},
};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SummaryError {
    #[error("book id must be a positive integer, got {0}")]
    InvalidBookId(BookId),
    #[error("summary generation request failed: {0}")]
    Enqueue(#[source] PortError),
    #[error("summary was not ready after {attempts} attempts")]
    Timeout { attempts: u32 },
    #[error("summary request cancelled")]
    Cancelled,
}

impl SummaryError {
    /// True for outcomes where asking again later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SummaryError::Timeout { .. })
    }
}

pub type SummaryResult = Result<Vec<Scene>, SummaryError>;

/// Timing of the lookup loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay before every lookup after the first.
    pub interval: Duration,
    /// Total lookups before giving up.
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(5_000),
            max_attempts: 10,
        }
    }
}

/// Runs one enqueue+poll sequence for `book_id`.
///
/// Lookup failures count as "not ready" and do not end the loop; only the
/// enqueue failure, the attempt budget and `cancel` end it early.
pub async fn generate_summary(
    api: &dyn SummaryApi,
    book_id: BookId,
    policy: PollPolicy,
    cancel: &CancellationToken,
) -> SummaryResult {
    if book_id <= 0 {
        return Err(SummaryError::InvalidBookId(book_id));
    }

    info!(book_id, "Requesting summary generation.");
    tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(SummaryError::Cancelled),
        res = api.request_summary(book_id) => res.map_err(|e| {
            warn!(book_id, "Summary generation request failed: {}", e);
            SummaryError::Enqueue(e)
        })?,
    }

    for attempt in 1..=policy.max_attempts {
        if attempt > 1 {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SummaryError::Cancelled),
                _ = tokio::time::sleep(policy.interval) => {}
            }
        }

        let lookup = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SummaryError::Cancelled),
            res = api.lookup_summary(book_id) => res,
        };

        match lookup {
            Ok(scenes) if !scenes.is_empty() => {
                info!(book_id, attempt, scenes = scenes.len(), "Summary ready.");
                return Ok(scenes);
            }
            Ok(_) => debug!(book_id, attempt, "Summary still pending."),
            Err(e) => warn!(book_id, attempt, "Summary lookup failed, will retry: {}", e),
        }
    }

    warn!(book_id, attempts = policy.max_attempts, "Summary polling exhausted.");
    Err(SummaryError::Timeout {
        attempts: policy.max_attempts,
    })
}

//=========================================================================================
// SummaryService (single-flight per book)
//=========================================================================================

type SharedJob = Shared<BoxFuture<'static, SummaryResult>>;

struct InFlight {
    job_id: u64,
    job: SharedJob,
    cancel: CancellationToken,
    waiters: usize,
}

#[derive(Default)]
struct Registry {
    next_job_id: u64,
    jobs: HashMap<BookId, InFlight>,
}

/// Hands out summaries, coalescing concurrent requests for the same book.
pub struct SummaryService {
    api: Arc<dyn SummaryApi>,
    policy: PollPolicy,
    registry: Arc<Mutex<Registry>>,
}

impl SummaryService {
    pub fn new(api: Arc<dyn SummaryApi>, policy: PollPolicy) -> Self {
        Self {
            api,
            policy,
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }

    /// Number of books with a job currently in flight.
    pub fn in_flight(&self) -> usize {
        lock(&self.registry).jobs.len()
    }

    /// Returns the scenes for `book_id`, joining an in-flight job if there is one.
    pub async fn summary(&self, book_id: BookId, cancel: &CancellationToken) -> SummaryResult {
        if book_id <= 0 {
            return Err(SummaryError::InvalidBookId(book_id));
        }

        let (job, waiter) = self.join(book_id);
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SummaryError::Cancelled),
            res = job => res,
        };
        drop(waiter);
        result
    }

    fn join(&self, book_id: BookId) -> (SharedJob, Waiter) {
        let mut registry = lock(&self.registry);

        if let Some(entry) = registry.jobs.get_mut(&book_id) {
            entry.waiters += 1;
            debug!(book_id, waiters = entry.waiters, "Joining in-flight summary job.");
            let waiter = Waiter {
                registry: self.registry.clone(),
                book_id,
                job_id: entry.job_id,
            };
            return (entry.job.clone(), waiter);
        }

        registry.next_job_id += 1;
        let job_id = registry.next_job_id;
        let cancel = CancellationToken::new();
        let api = self.api.clone();
        let policy = self.policy;
        let job_cancel = cancel.clone();
        let job = async move { generate_summary(api.as_ref(), book_id, policy, &job_cancel).await }
            .boxed()
            .shared();

        registry.jobs.insert(
            book_id,
            InFlight {
                job_id,
                job: job.clone(),
                cancel,
                waiters: 1,
            },
        );
        let waiter = Waiter {
            registry: self.registry.clone(),
            book_id,
            job_id,
        };
        (job, waiter)
    }
}

/// Registration of one caller on a shared job. Dropping the last waiter
/// cancels the job and forgets it; finished summaries are not kept.
struct Waiter {
    registry: Arc<Mutex<Registry>>,
    book_id: BookId,
    job_id: u64,
}

impl Drop for Waiter {
    fn drop(&mut self) {
        let mut registry = lock(&self.registry);
        let last = match registry.jobs.get_mut(&self.book_id) {
            Some(entry) if entry.job_id == self.job_id => {
                entry.waiters -= 1;
                entry.waiters == 0
            }
            _ => false,
        };
        if last {
            if let Some(entry) = registry.jobs.remove(&self.book_id) {
                entry.cancel.cancel();
            }
        }
    }
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
