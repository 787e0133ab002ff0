// src/batch/pool.rs

use std::sync::mpsc;
use std::sync::{Mutex, PoisonError};
use std::thread;

/// Bounded executor: a fixed number of worker threads drain a shared queue
/// while the calling thread folds results as they arrive.
///
/// Workers never touch shared accumulators, they only send their result back
/// over a channel. Completion order is unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    pub const DEFAULT_WORKERS: usize = 4;

    /// A pool with `workers` threads, at least one.
    pub fn new(workers: usize) -> Self {
        Self { workers: workers.max(1) }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs `work` on every item and hands each result to `on_complete` on the
    /// calling thread. Returns once every item has been processed and folded.
    ///
    /// Items are pulled lazily, so `items` may describe far more work than fits
    /// in memory at once. `work` must not panic; callers wanting isolation catch
    /// panics inside it.
    pub fn run<It, I, T, W, C>(&self, items: It, work: W, mut on_complete: C)
    where
        It: IntoIterator<Item = I>,
        It::IntoIter: Send,
        I: Send,
        T: Send,
        W: Fn(I) -> T + Sync,
        C: FnMut(T),
    {
        let mut items = items.into_iter().peekable();
        if items.peek().is_none() {
            return;
        }
        let threads = match items.size_hint() {
            (_, Some(upper)) => self.workers.min(upper),
            (_, None) => self.workers,
        };
        let queue = Mutex::new(items);
        let (tx, rx) = mpsc::channel::<T>();

        thread::scope(|s| {
            for _ in 0..threads {
                let tx = tx.clone();
                let queue = &queue;
                let work = &work;
                s.spawn(move || {
                    loop {
                        let next = queue.lock().unwrap_or_else(PoisonError::into_inner).next();
                        let Some(item) = next else { break };
                        if tx.send(work(item)).is_err() {
                            break;
                        }
                    }
                });
            }
            // Only worker-held senders remain, so the loop ends when they finish
            drop(tx);
            for result in rx {
                on_complete(result);
            }
        });
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WORKERS)
    }
}
