//! Bounded worker pool for logo loading and card rendering.
//!
//! Work is submitted while pages stream through the build and collected at a
//! single barrier after the last page, so rendering overlaps with the rest of
//! the page pass:
//!
//! ```text
//! configure          on_page × N                      post_build
//!    │                  │                                 │
//!    ├─ submit_shared(logo) ──► SharedJob<Logo>           │
//!    │                  ├─ submit(render) ──► JobHandle ─►│
//!    │                  ├─ submit(render) ──► JobHandle ─►│ JobSet::join_all
//!    │                  └─ ...                            │   (first error wins)
//! ```
//!
//! Render jobs block on the logo through [`SharedJob::wait`]. The logo job is
//! always submitted first and jobs submitted from outside the pool are picked
//! up in FIFO order, so the logo is running (or done) before any render job
//! can occupy a worker waiting for it.
//!
//! A panicking job is caught at the job boundary and reported as
//! [`JobPanicked`] through the job's own error type instead of tearing down
//! the pool.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use thiserror::Error;

/// A job panicked, or was dropped before it could report a result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("job panicked: {0}")]
pub struct JobPanicked(pub String);

impl JobPanicked {
    fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self(message)
    }
}

#[derive(Error, Debug)]
#[error("failed to start worker pool: {0}")]
pub struct PoolError(#[from] rayon::ThreadPoolBuildError);

/// Fixed-size pool owned by one build.
pub struct JobPool {
    pool: rayon::ThreadPool,
}

impl JobPool {
    pub fn new(workers: usize) -> Result<Self, PoolError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("social-render-{i}"))
            .build()?;
        Ok(Self { pool })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `job` on the pool. The result is collected later via the handle.
    pub fn submit<T, E, F>(&self, job: F) -> JobHandle<T, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<JobPanicked> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        self.pool.spawn(move || {
            // The receiver may be gone if the build was abandoned.
            let _ = tx.send(run_caught(job));
        });
        JobHandle { rx }
    }

    /// Run `job` on the pool, with a result any number of waiters can read.
    pub fn submit_shared<T, E, F>(&self, job: F) -> SharedJob<T, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Clone + Send + 'static,
        E: From<JobPanicked> + Send + Sync + 'static,
    {
        let shared = SharedJob {
            state: Arc::new((Mutex::new(None), Condvar::new())),
        };
        let state = Arc::clone(&shared.state);
        self.pool.spawn(move || {
            let result = run_caught(job).map_err(Arc::new);
            let (slot, ready) = &*state;
            *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
            ready.notify_all();
        });
        shared
    }
}

fn run_caught<T, E, F>(job: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: From<JobPanicked>,
{
    catch_unwind(AssertUnwindSafe(job))
        .unwrap_or_else(|payload| Err(JobPanicked::from_payload(payload).into()))
}

/// Pending result of one submitted job.
pub struct JobHandle<T, E> {
    rx: Receiver<Result<T, E>>,
}

impl<T, E: From<JobPanicked>> JobHandle<T, E> {
    /// Block until the job finishes.
    pub fn wait(self) -> Result<T, E> {
        self.rx
            .recv()
            .unwrap_or_else(|_| Err(JobPanicked("job dropped without a result".into()).into()))
    }
}

type Slot<T, E> = (Mutex<Option<Result<T, Arc<E>>>>, Condvar);

/// A job result shared by every job that depends on it.
pub struct SharedJob<T, E> {
    state: Arc<Slot<T, E>>,
}

impl<T, E> Clone for SharedJob<T, E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Clone, E: From<JobPanicked>> SharedJob<T, E> {
    /// Block until the job finishes; every caller sees the same result.
    pub fn wait(&self) -> Result<T, Arc<E>> {
        let (slot, ready) = &*self.state;
        let guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        let guard = ready
            .wait_while(guard, |result| result.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(error)) => Err(Arc::clone(error)),
            None => Err(Arc::new(JobPanicked("shared job left no result".into()).into())),
        }
    }

    /// `true` once the job has produced a result.
    pub fn is_finished(&self) -> bool {
        self.state
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Handles collected during the page pass, joined at the barrier.
pub struct JobSet<T, E> {
    handles: Vec<JobHandle<T, E>>,
}

impl<T, E> Default for JobSet<T, E> {
    fn default() -> Self {
        Self {
            handles: Vec::new(),
        }
    }
}

impl<T, E: From<JobPanicked>> JobSet<T, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handle: JobHandle<T, E>) {
        self.handles.push(handle);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every job, then return all results or the first failure in
    /// submission order. Failing jobs never cancel their siblings.
    pub fn join_all(self) -> Result<Vec<T>, E> {
        let results: Vec<Result<T, E>> = self.handles.into_iter().map(JobHandle::wait).collect();
        results.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_WORKERS;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Failed(usize),
        Panicked(String),
    }

    impl From<JobPanicked> for TestError {
        fn from(e: JobPanicked) -> Self {
            TestError::Panicked(e.0)
        }
    }

    // =========================================================================
    // JobPool / JobHandle
    // =========================================================================

    #[test]
    fn pool_has_requested_workers() {
        let pool = JobPool::new(3).unwrap();
        assert_eq!(pool.workers(), 3);
    }

    #[test]
    fn zero_workers_clamped_to_one() {
        let pool = JobPool::new(0).unwrap();
        assert_eq!(pool.workers(), 1);
    }

    #[test]
    fn submit_returns_result() {
        let pool = JobPool::new(2).unwrap();
        let handle = pool.submit(|| Ok::<_, TestError>(21 * 2));
        assert_eq!(handle.wait(), Ok(42));
    }

    #[test]
    fn submit_propagates_error() {
        let pool = JobPool::new(2).unwrap();
        let handle = pool.submit(|| Err::<(), _>(TestError::Failed(7)));
        assert_eq!(handle.wait(), Err(TestError::Failed(7)));
    }

    #[test]
    fn panic_becomes_error() {
        let pool = JobPool::new(1).unwrap();
        let handle = pool.submit(|| -> Result<(), TestError> { panic!("boom") });
        assert_eq!(handle.wait(), Err(TestError::Panicked("boom".into())));

        // The worker survives the panic.
        let handle = pool.submit(|| Ok::<_, TestError>("still alive"));
        assert_eq!(handle.wait(), Ok("still alive"));
    }

    #[test]
    fn formatted_panic_message_kept() {
        let pool = JobPool::new(1).unwrap();
        let n = 3;
        let handle = pool.submit(move || -> Result<(), TestError> { panic!("job {n} failed") });
        assert_eq!(handle.wait(), Err(TestError::Panicked("job 3 failed".into())));
    }

    // =========================================================================
    // SharedJob
    // =========================================================================

    #[test]
    fn shared_result_seen_by_all_waiters() {
        let pool = JobPool::new(4).unwrap();
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let logo = pool.submit_shared(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            Ok::<_, TestError>(Arc::new(vec![1u8, 2, 3]))
        });

        let mut set = JobSet::new();
        for _ in 0..10 {
            let logo = logo.clone();
            set.push(pool.submit(move || {
                let bytes = logo.wait().map_err(|_| TestError::Failed(0))?;
                Ok::<_, TestError>(bytes.len())
            }));
        }
        assert_eq!(set.join_all(), Ok(vec![3; 10]));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(logo.is_finished());
    }

    #[test]
    fn shared_error_seen_by_all_waiters() {
        let pool = JobPool::new(2).unwrap();
        let logo = pool.submit_shared(|| Err::<u8, _>(TestError::Failed(1)));
        let a = logo.wait().unwrap_err();
        let b = logo.wait().unwrap_err();
        assert_eq!(*a, TestError::Failed(1));
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn shared_panic_becomes_error() {
        let pool = JobPool::new(1).unwrap();
        let logo = pool.submit_shared(|| -> Result<u8, TestError> { panic!("no logo") });
        assert_eq!(*logo.wait().unwrap_err(), TestError::Panicked("no logo".into()));
    }

    // =========================================================================
    // JobSet barrier
    // =========================================================================

    #[test]
    fn join_all_runs_every_job_exactly_once() {
        let pool = JobPool::new(DEFAULT_WORKERS).unwrap();
        let runs: Arc<Vec<AtomicUsize>> = Arc::new((0..50).map(|_| AtomicUsize::new(0)).collect());

        let mut set = JobSet::new();
        for i in 0..50 {
            let runs = Arc::clone(&runs);
            set.push(pool.submit(move || {
                runs[i].fetch_add(1, Ordering::SeqCst);
                Ok::<_, TestError>(i)
            }));
        }
        assert_eq!(set.len(), 50);
        assert_eq!(set.join_all(), Ok((0..50).collect::<Vec<_>>()));
        assert!(runs.iter().all(|r| r.load(Ordering::SeqCst) == 1));
    }

    #[test]
    fn join_all_reports_first_failure_in_submission_order() {
        let pool = JobPool::new(4).unwrap();
        let mut set = JobSet::new();
        for i in 0..12 {
            set.push(pool.submit(move || {
                // Later failures finish first.
                std::thread::sleep(Duration::from_millis(if i == 3 { 40 } else { 1 }));
                if i == 3 || i == 9 {
                    Err(TestError::Failed(i))
                } else {
                    Ok(i)
                }
            }));
        }
        assert_eq!(set.join_all(), Err(TestError::Failed(3)));
    }

    #[test]
    fn join_all_waits_for_siblings_of_a_failure() {
        let pool = JobPool::new(2).unwrap();
        let finished = Arc::new(AtomicUsize::new(0));
        let mut set = JobSet::new();
        set.push(pool.submit(|| Err::<(), _>(TestError::Failed(0))));
        for _ in 0..6 {
            let finished = Arc::clone(&finished);
            set.push(pool.submit(move || {
                std::thread::sleep(Duration::from_millis(5));
                finished.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }));
        }
        assert_eq!(set.join_all(), Err(TestError::Failed(0)));
        assert_eq!(finished.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn empty_set_joins_ok() {
        let set: JobSet<(), TestError> = JobSet::new();
        assert!(set.is_empty());
        assert_eq!(set.join_all(), Ok(vec![]));
    }
}
