use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

pub const MIN_CONCURRENCY: usize = 1;
pub const MAX_CONCURRENCY: usize = 10;
pub const DEFAULT_CONCURRENCY: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure<T> {
    pub item: T,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult<T> {
    pub succeeded: usize,
    pub failed: usize,
    /// Ordered by the failing item's position in the input.
    pub errors: Vec<ItemFailure<T>>,
}

impl<T> ExecutionResult<T> {
    fn empty() -> Self {
        Self {
            succeeded: 0,
            failed: 0,
            errors: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

#[derive(Debug)]
pub enum ItemOutcome<'a, T, O> {
    Succeeded { item: &'a T, output: &'a O },
    Failed { item: &'a T, error: &'a str },
}

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("failed to start {workers} executor worker(s): {source}")]
    Pool {
        workers: usize,
        #[source]
        source: rayon::ThreadPoolBuildError,
    },
}

pub fn clamp_concurrency(requested: usize) -> usize {
    requested.clamp(MIN_CONCURRENCY, MAX_CONCURRENCY)
}

/// Worker threads carry this name prefix followed by their index.
pub const WORKER_THREAD_PREFIX: &str = "blobdeck-exec-";

/// A bounded worker pool that can be reused across several runs.
#[derive(Debug)]
pub struct ExecutorPool {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl ExecutorPool {
    pub fn new(concurrency: usize) -> Result<Self, ExecutorError> {
        let workers = concurrency.max(MIN_CONCURRENCY);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("{WORKER_THREAD_PREFIX}{index}"))
            .build()
            .map_err(|source| ExecutorError::Pool { workers, source })?;

        Ok(Self { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Applies `action` to every item with at most `workers()` calls in flight.
    ///
    /// Workers claim items through one shared index. A failed or panicking
    /// action is recorded and never stops its siblings. `progress` is invoked
    /// from worker threads as each item completes.
    pub fn run<T, O, E, A, P>(&self, items: &[T], action: A, progress: P) -> ExecutionResult<T>
    where
        T: Clone + Send + Sync,
        E: Display,
        A: Fn(&T) -> Result<O, E> + Sync,
        P: Fn(ItemOutcome<'_, T, O>) + Sync,
    {
        if items.is_empty() {
            return ExecutionResult::empty();
        }

        let workers = self.workers.min(items.len());
        let next = AtomicUsize::new(0);
        let succeeded = AtomicUsize::new(0);
        let failures = Mutex::new(Vec::<(usize, ItemFailure<T>)>::new());

        let work = || {
            loop {
                let index = next.fetch_add(1, Ordering::SeqCst);
                let Some(item) = items.get(index) else {
                    return;
                };

                let error = match panic::catch_unwind(AssertUnwindSafe(|| action(item))) {
                    Ok(Ok(output)) => {
                        succeeded.fetch_add(1, Ordering::SeqCst);
                        progress(ItemOutcome::Succeeded {
                            item,
                            output: &output,
                        });
                        continue;
                    }
                    Ok(Err(error)) => error.to_string(),
                    Err(payload) => {
                        format!("action panicked: {}", panic_message(payload.as_ref()))
                    }
                };

                progress(ItemOutcome::Failed {
                    item,
                    error: &error,
                });
                failures
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push((
                        index,
                        ItemFailure {
                            item: item.clone(),
                            error,
                        },
                    ));
            }
        };

        self.pool.scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|_| work());
            }
        });

        let mut failures = failures
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        failures.sort_by_key(|(index, _)| *index);
        let errors: Vec<ItemFailure<T>> =
            failures.into_iter().map(|(_, failure)| failure).collect();
        let result = ExecutionResult {
            succeeded: succeeded.into_inner(),
            failed: errors.len(),
            errors,
        };

        tracing::info!(
            items = items.len(),
            workers,
            succeeded = result.succeeded,
            failed = result.failed,
            "executor run finished"
        );

        result
    }
}

/// Runs `items` on a pool built for this call alone.
pub fn run_with_concurrency<T, O, E, A, P>(
    items: &[T],
    concurrency: usize,
    action: A,
    progress: P,
) -> Result<ExecutionResult<T>, ExecutorError>
where
    T: Clone + Send + Sync,
    E: Display,
    A: Fn(&T) -> Result<O, E> + Sync,
    P: Fn(ItemOutcome<'_, T, O>) + Sync,
{
    if items.is_empty() {
        return Ok(ExecutionResult::empty());
    }

    let pool = ExecutorPool::new(concurrency.min(items.len()))?;
    Ok(pool.run(items, action, progress))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "unknown panic payload".to_string()
}
