use anyhow::Result;
use crossbeam::channel::{Receiver, Sender, bounded};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Fixed-size worker pool for processing work items
///
/// Items are fed to the workers over a bounded channel and results come back
/// over a second channel in completion order, not submission order. A panic
/// while processing one item is caught in the worker and converted into a
/// result through the caller's fallback, so siblings keep running and every
/// submitted item yields exactly one result.
#[derive(Debug, Clone)]
pub struct ParallelExecutor {
    max_workers: usize,
}

/// Context for worker threads to avoid too many function parameters
struct WorkerContext<'a, T, R, F, P> {
    worker_id: usize,
    work_rx: Receiver<T>,
    result_tx: Sender<R>,
    processor: &'a F,
    on_panic: &'a P,
}

impl ParallelExecutor {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Process every item, streaming results to `on_result` as they complete
    ///
    /// `processor` receives the item and the worker id. `on_panic` builds the
    /// result for an item whose processing panicked, from the item and the panic
    /// message. Returns all results in completion order.
    pub fn execute<T, R, F, P, C>(
        &self,
        work_items: Vec<T>,
        processor: F,
        on_panic: P,
        mut on_result: C,
    ) -> Result<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn(&T, usize) -> R + Sync,
        P: Fn(&T, String) -> R + Sync,
        C: FnMut(&R),
    {
        if work_items.is_empty() {
            return Ok(Vec::new());
        }

        let total_items = work_items.len();
        let actual_workers = std::cmp::min(self.max_workers, total_items);
        // Channels are sized by the workers actually started, not the configured maximum
        let buffer_size = actual_workers.saturating_mul(2);
        let (work_tx, work_rx): (Sender<T>, Receiver<T>) = bounded(buffer_size);
        let (result_tx, result_rx): (Sender<R>, Receiver<R>) = bounded(buffer_size);

        tracing::debug!(
            "Processing {} items with {} workers",
            total_items,
            actual_workers
        );

        let results = crossbeam::thread::scope(|s| {
            for worker_id in 0..actual_workers {
                let ctx = WorkerContext {
                    worker_id,
                    work_rx: work_rx.clone(),
                    result_tx: result_tx.clone(),
                    processor: &processor,
                    on_panic: &on_panic,
                };
                s.spawn(move |_| Self::worker_thread(ctx));
            }

            // Producer thread: send work to workers
            s.spawn(move |_| {
                for work_item in work_items {
                    if work_tx.send(work_item).is_err() {
                        break; // Workers dropped
                    }
                }
            });

            // Drop our copies so the result channel closes once the workers finish
            drop(work_rx);
            drop(result_tx);

            // Collector: results arrive in completion order
            let mut results = Vec::with_capacity(total_items);
            for result in result_rx.iter() {
                on_result(&result);
                results.push(result);
            }
            results
        })
        .map_err(|_| anyhow::anyhow!("Thread panic occurred during parallel execution"))?;

        if results.len() != total_items {
            anyhow::bail!(
                "Parallel execution lost work: {} of {} items produced results",
                results.len(),
                total_items
            );
        }

        Ok(results)
    }

    fn worker_thread<T, R, F, P>(ctx: WorkerContext<'_, T, R, F, P>)
    where
        F: Fn(&T, usize) -> R,
        P: Fn(&T, String) -> R,
    {
        while let Ok(work_item) = ctx.work_rx.recv() {
            let result = match panic::catch_unwind(AssertUnwindSafe(|| {
                (ctx.processor)(&work_item, ctx.worker_id)
            })) {
                Ok(result) => result,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::error!("worker-{} recovered from panic: {}", ctx.worker_id, message);
                    (ctx.on_panic)(&work_item, message)
                }
            };

            if ctx.result_tx.send(result).is_err() {
                break; // Receiver dropped
            }
        }
    }
}

/// Best-effort text of a panic payload
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
