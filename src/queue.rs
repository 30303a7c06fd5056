//! # Request queue
//!
//! Bounded-concurrency, priority-ordered dispatch for every upstream call.
//!
//! - Pending tasks are held in a max-heap keyed by `(priority, insertion)`,
//!   so a higher priority always dispatches first and equal priorities keep
//!   FIFO order.
//! - At most `max_concurrent` tasks run at once. After each completion the
//!   queue waits `dispatch_delay` before dispatching again, which spaces
//!   bursts out.
//! - A task's deadline is checked lazily when it reaches the head of the
//!   queue: a task that waited longer than its timeout is rejected with
//!   [`CatalogError::QueueTimeout`] and never runs.
//! - [`RequestQueue::pause`] stops all dispatch and schedules its own
//!   resume. The transport uses it when the upstream answers 429.
//!
//! The queue is a cheap `Clone` handle around shared state; every clone
//! drives the same queue.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::QueueConfig;
use crate::error::CatalogError;

/// Dispatch priority. Higher values run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Priority(pub u8);

impl Priority {
    pub const CART_MUTATION: Priority = Priority(100);
    pub const INGREDIENT_ENRICHMENT: Priority = Priority(75);
    pub const LOCATION_SEARCH: Priority = Priority(50);
    pub const CACHE_WARMING: Priority = Priority(10);
}

type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A type-erased queued unit of work.
trait Job: Send {
    fn run(self: Box<Self>) -> BoxFuture;
    fn reject(self: Box<Self>, err: CatalogError);
}

struct TaskJob<F, T> {
    task: F,
    reply: oneshot::Sender<Result<T, CatalogError>>,
}

impl<F, Fut, T> Job for TaskJob<F, T>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, CatalogError>> + Send + 'static,
    T: Send + 'static,
{
    fn run(self: Box<Self>) -> BoxFuture {
        let TaskJob { task, reply } = *self;
        Box::pin(async move {
            let result = task().await;
            let _ = reply.send(result);
        })
    }

    fn reject(self: Box<Self>, err: CatalogError) {
        let _ = self.reply.send(Err(err));
    }
}

struct QueuedTask {
    id: Uuid,
    priority: Priority,
    seq: u64,
    created_at: Instant,
    timeout: Duration,
    job: Box<dyn Job>,
}

impl QueuedTask {
    fn key(&self) -> (Priority, Reverse<u64>) {
        (self.priority, Reverse(self.seq))
    }
}

impl PartialEq for QueuedTask {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for QueuedTask {}

impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedTask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QueueSettings {
    pub max_concurrent: usize,
    pub dispatch_delay: Duration,
    pub task_timeout: Duration,
}

impl From<&QueueConfig> for QueueSettings {
    fn from(c: &QueueConfig) -> Self {
        Self {
            max_concurrent: c.max_concurrent.max(1),
            dispatch_delay: c.dispatch_delay(),
            task_timeout: c.task_timeout(),
        }
    }
}

#[derive(Default)]
struct QueueState {
    pending: BinaryHeap<QueuedTask>,
    active: usize,
    paused_until: Option<Instant>,
    next_seq: u64,
    completed: u64,
    expired: u64,
}

/// Snapshot for status output.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    pub pending: usize,
    pub active: usize,
    pub max_concurrent: usize,
    pub paused: bool,
    pub paused_for_ms: u64,
    pub completed: u64,
    pub expired: u64,
}

struct Inner {
    settings: QueueSettings,
    state: Mutex<QueueState>,
}

#[derive(Clone)]
pub struct RequestQueue {
    inner: Arc<Inner>,
}

impl RequestQueue {
    pub fn new(settings: QueueSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                settings,
                state: Mutex::new(QueueState::default()),
            }),
        }
    }

    /// Queue `task` and return a future resolving to its result.
    ///
    /// The task is inserted before this returns, so insertion order is call
    /// order. `timeout` defaults to the configured task timeout. Must be
    /// called from within a tokio runtime.
    pub fn enqueue<F, Fut, T>(
        &self,
        priority: Priority,
        timeout: Option<Duration>,
        task: F,
    ) -> impl Future<Output = Result<T, CatalogError>> + Send + 'static
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, CatalogError>> + Send + 'static,
        T: Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let timeout = timeout.unwrap_or(self.inner.settings.task_timeout);
        {
            let mut s = self.inner.state.lock();
            let seq = s.next_seq;
            s.next_seq += 1;
            let id = Uuid::new_v4();
            s.pending.push(QueuedTask {
                id,
                priority,
                seq,
                created_at: Instant::now(),
                timeout,
                job: Box::new(TaskJob { task, reply }),
            });
            debug!(
                task_id = %id,
                priority = priority.0,
                depth = s.pending.len(),
                active = s.active,
                "task enqueued"
            );
        }
        Inner::pump(&self.inner);

        async move {
            rx.await
                .unwrap_or_else(|_| Err(CatalogError::Internal("queued task dropped".to_string())))
        }
    }

    /// Stop dispatching for `duration`, then resume automatically.
    ///
    /// Overlapping pauses extend to the latest deadline. Running tasks are
    /// not interrupted.
    pub fn pause(&self, duration: Duration) {
        let until = Instant::now() + duration;
        {
            let mut s = self.inner.state.lock();
            let until = s.paused_until.map_or(until, |u| u.max(until));
            s.paused_until = Some(until);
            info!(
                pause_ms = duration.as_millis() as u64,
                depth = s.pending.len(),
                active = s.active,
                "request queue paused"
            );
        }

        let inner = self.inner.clone();
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let resumed = {
                let mut s = inner.state.lock();
                match s.paused_until {
                    Some(u) if u <= Instant::now() => {
                        s.paused_until = None;
                        info!(depth = s.pending.len(), "request queue resumed");
                        true
                    }
                    _ => false,
                }
            };
            if resumed {
                Inner::pump(&inner);
            }
        });
    }

    /// Lift any pause immediately.
    pub fn resume(&self) {
        {
            let mut s = self.inner.state.lock();
            if s.paused_until.take().is_some() {
                info!(depth = s.pending.len(), "request queue resumed early");
            }
        }
        Inner::pump(&self.inner);
    }

    pub fn is_paused(&self) -> bool {
        self.inner.state.lock().paused_until.is_some()
    }

    pub fn pending_len(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    pub fn stats(&self) -> QueueStats {
        let s = self.inner.state.lock();
        QueueStats {
            pending: s.pending.len(),
            active: s.active,
            max_concurrent: self.inner.settings.max_concurrent,
            paused: s.paused_until.is_some(),
            paused_for_ms: s
                .paused_until
                .map(|u| u.saturating_duration_since(Instant::now()).as_millis() as u64)
                .unwrap_or(0),
            completed: s.completed,
            expired: s.expired,
        }
    }
}

impl Inner {
    /// Dispatch as many pending tasks as capacity allows.
    fn pump(inner: &Arc<Inner>) {
        loop {
            let task = {
                let mut s = inner.state.lock();
                if s.paused_until.is_some() || s.active >= inner.settings.max_concurrent {
                    return;
                }
                let Some(task) = s.pending.pop() else {
                    return;
                };
                let waited = task.created_at.elapsed();
                if waited > task.timeout {
                    s.expired += 1;
                    warn!(
                        task_id = %task.id,
                        waited_ms = waited.as_millis() as u64,
                        depth = s.pending.len(),
                        "queued task expired before dispatch"
                    );
                    drop(s);
                    let timeout = task.timeout;
                    task.job.reject(CatalogError::QueueTimeout { waited, timeout });
                    continue;
                }
                s.active += 1;
                debug!(
                    task_id = %task.id,
                    priority = task.priority.0,
                    depth = s.pending.len(),
                    active = s.active,
                    "task dispatched"
                );
                task
            };

            let inner = inner.clone();
            tokio::spawn(async move {
                // A panicking task drops its reply sender; the caller sees
                // an internal error and the slot is still released.
                if let Err(e) = tokio::spawn(task.job.run()).await {
                    warn!(task_id = %task.id, error = %e, "queued task panicked");
                }
                {
                    let mut s = inner.state.lock();
                    s.active -= 1;
                    s.completed += 1;
                }
                tokio::time::sleep(inner.settings.dispatch_delay).await;
                Inner::pump(&inner);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};

    fn queue(max_concurrent: usize) -> RequestQueue {
        RequestQueue::new(QueueSettings {
            max_concurrent,
            dispatch_delay: Duration::from_millis(1),
            task_timeout: Duration::from_secs(5),
        })
    }

    #[tokio::test]
    async fn test_higher_priority_dispatches_first() {
        let q = queue(1);
        q.pause(Duration::from_secs(60));
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut futs = Vec::new();
        for p in [1u8, 5, 3] {
            let order = order.clone();
            futs.push(q.enqueue(Priority(p), None, move || async move {
                order.lock().push(p);
                Ok::<_, CatalogError>(())
            }));
        }
        assert_eq!(q.pending_len(), 3);
        q.resume();
        for f in futs {
            f.await.unwrap();
        }
        assert_eq!(*order.lock(), vec![5, 3, 1]);
    }

    #[tokio::test]
    async fn test_equal_priority_is_fifo() {
        let q = queue(1);
        q.pause(Duration::from_secs(60));
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut futs = Vec::new();
        for i in 0..4u8 {
            let order = order.clone();
            futs.push(q.enqueue(Priority::INGREDIENT_ENRICHMENT, None, move || async move {
                order.lock().push(i);
                Ok::<_, CatalogError>(())
            }));
        }
        q.resume();
        for f in futs {
            f.await.unwrap();
        }
        assert_eq!(*order.lock(), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_limit() {
        let q = queue(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut futs = Vec::new();
        for _ in 0..6 {
            let running = running.clone();
            let peak = peak.clone();
            futs.push(q.enqueue(Priority(1), None, move || async move {
                let now = running.fetch_add(1, AtomicOrdering::SeqCst) + 1;
                peak.fetch_max(now, AtomicOrdering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                running.fetch_sub(1, AtomicOrdering::SeqCst);
                Ok::<_, CatalogError>(())
            }));
        }
        for f in futs {
            f.await.unwrap();
        }
        assert!(peak.load(AtomicOrdering::SeqCst) <= 2);
        assert_eq!(q.stats().completed, 6);
    }

    #[tokio::test]
    async fn test_stale_task_is_rejected_and_never_runs() {
        let q = queue(1);
        q.pause(Duration::from_secs(60));
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let fut = q.enqueue(Priority(1), Some(Duration::from_millis(10)), move || async move {
            flag.store(true, AtomicOrdering::SeqCst);
            Ok::<_, CatalogError>(())
        });
        tokio::time::sleep(Duration::from_millis(30)).await;
        q.resume();
        let err = fut.await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(matches!(err, CatalogError::QueueTimeout { .. }));
        assert!(!ran.load(AtomicOrdering::SeqCst));
        assert_eq!(q.stats().expired, 1);
    }

    #[tokio::test]
    async fn test_pause_resumes_automatically() {
        let q = queue(1);
        q.pause(Duration::from_millis(40));
        assert!(q.is_paused());
        let started = Instant::now();
        q.enqueue(Priority(1), None, || async { Ok::<_, CatalogError>(()) })
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(35));
        assert!(!q.is_paused());
    }

    #[tokio::test]
    async fn test_task_error_is_returned() {
        let q = queue(1);
        let err = q
            .enqueue(Priority(1), None, || async {
                Err::<(), _>(CatalogError::NotFound("x".to_string()))
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
