use std::fmt::Display;

use crate::executor::{ExecutorPool, ItemFailure, ItemOutcome, clamp_concurrency};
use crate::page::{Cursor, PageSource, clamp_page_size};
use crate::store::Removed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkOptions {
    pub page_size: usize,
    pub concurrency: usize,
}

impl BulkOptions {
    pub fn new(page_size: usize, concurrency: usize) -> Self {
        Self {
            page_size: clamp_page_size(page_size),
            concurrency: clamp_concurrency(concurrency),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkStop {
    /// A page came back without a forward cursor.
    Exhausted,
    EmptyPage,
    PageFailed(String),
}

/// Accumulated state of one orchestrated run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkRun {
    pub page_size: usize,
    pub concurrency: usize,
    pub pages: usize,
    pub scanned: usize,
    pub removed: usize,
    pub skipped: usize,
    pub failures: Vec<ItemFailure<String>>,
    pub stop: Option<BulkStop>,
}

impl BulkRun {
    fn new(options: BulkOptions) -> Self {
        Self {
            page_size: options.page_size,
            concurrency: options.concurrency,
            pages: 0,
            scanned: 0,
            removed: 0,
            skipped: 0,
            failures: Vec::new(),
            stop: None,
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn summary_line(&self) -> String {
        format!(
            "Purge complete: removed={} scanned={}",
            self.removed, self.scanned
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkEvent {
    PageFetched {
        page: usize,
        items: usize,
        scanned: usize,
    },
    TargetsSkipped {
        page: usize,
        count: usize,
    },
    Removed {
        page: usize,
        target: String,
        freed_bytes: Option<u64>,
    },
    ItemFailed {
        page: usize,
        target: String,
        error: String,
    },
    EmptyPage {
        page: usize,
    },
    PageFailed {
        page: usize,
        error: String,
    },
    Finished(BulkRun),
}

/// Walks every page of a source and applies a mutation to each item.
///
/// Pages are processed strictly one after another; item mutations within a
/// page run on one concurrency-limited worker pool shared by the whole run.
pub struct BulkOrchestrator<'a, T> {
    source: &'a dyn PageSource<T>,
    options: BulkOptions,
}

impl<'a, T> BulkOrchestrator<'a, T> {
    pub fn new(source: &'a dyn PageSource<T>, options: BulkOptions) -> Self {
        Self { source, options }
    }

    pub fn options(&self) -> BulkOptions {
        self.options
    }

    pub fn run<K, E, F, A, S>(&self, target: F, action: A, sink: S) -> BulkRun
    where
        K: Clone + Display + Send + Sync,
        E: Display,
        F: Fn(&T) -> Option<K>,
        A: Fn(&K) -> Result<Removed, E> + Sync,
        S: Fn(BulkEvent) + Sync,
    {
        let mut run = BulkRun::new(self.options);
        let pool = match ExecutorPool::new(self.options.concurrency) {
            Ok(pool) => pool,
            Err(error) => {
                let message = error.to_string();
                tracing::warn!(error = %message, "bulk worker pool failed to start");
                sink(BulkEvent::PageFailed {
                    page: 1,
                    error: message.clone(),
                });
                run.stop = Some(BulkStop::PageFailed(message));
                return finish(run, &sink);
            }
        };
        let mut cursor: Option<Cursor> = None;

        loop {
            let page_number = run.pages + 1;
            tracing::debug!(page = page_number, "fetching bulk page");
            let page = match self.source.fetch(cursor.as_ref(), self.options.page_size) {
                Ok(page) => page,
                Err(error) => {
                    let message = error.to_string();
                    tracing::warn!(page = page_number, error = %message, "bulk page fetch failed");
                    sink(BulkEvent::PageFailed {
                        page: page_number,
                        error: message.clone(),
                    });
                    run.stop = Some(BulkStop::PageFailed(message));
                    break;
                }
            };
            run.pages = page_number;

            if page.is_empty() {
                sink(BulkEvent::EmptyPage { page: page_number });
                run.stop = Some(BulkStop::EmptyPage);
                break;
            }

            run.scanned += page.len();
            sink(BulkEvent::PageFetched {
                page: page_number,
                items: page.len(),
                scanned: run.scanned,
            });

            let targets: Vec<K> = page.items.iter().filter_map(&target).collect();
            let skipped = page.len() - targets.len();
            if skipped > 0 {
                run.skipped += skipped;
                sink(BulkEvent::TargetsSkipped {
                    page: page_number,
                    count: skipped,
                });
            }

            let executed = pool.run(&targets, &action, |outcome| match outcome {
                ItemOutcome::Succeeded { item, output } => sink(BulkEvent::Removed {
                    page: page_number,
                    target: item.to_string(),
                    freed_bytes: output.freed_bytes,
                }),
                ItemOutcome::Failed { item, error } => {
                    tracing::warn!(page = page_number, item = %item, error, "bulk item failed");
                    sink(BulkEvent::ItemFailed {
                        page: page_number,
                        target: item.to_string(),
                        error: error.to_string(),
                    });
                }
            });
            run.removed += executed.succeeded;
            run.failures
                .extend(executed.errors.into_iter().map(|failure| ItemFailure {
                    item: failure.item.to_string(),
                    error: failure.error,
                }));

            cursor = page.cursor;
            if cursor.is_none() {
                run.stop = Some(BulkStop::Exhausted);
                break;
            }
        }

        finish(run, &sink)
    }
}

fn finish<S: Fn(BulkEvent)>(run: BulkRun, sink: &S) -> BulkRun {
    tracing::info!(
        pages = run.pages,
        scanned = run.scanned,
        removed = run.removed,
        failed = run.failed(),
        "bulk run finished"
    );
    sink(BulkEvent::Finished(run.clone()));
    run
}
