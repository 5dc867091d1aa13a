//! Feeder / worker pool / collector plumbing shared by both stages.
//!
//! A single feeder pushes every item into a bounded input queue and closes
//! it. `workers` tasks pull from that queue and push their outputs into a
//! bounded output queue. A single collector owns the receiving end and runs
//! until every worker has finished and the queue is closed.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::error;

/// Queue and pool dimensions of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSizing {
    pub workers: usize,
    pub input_capacity: usize,
    pub output_capacity: usize,
}

impl StageSizing {
    /// `min(ceiling, items)` workers, never fewer than one.
    pub fn new(items: usize, ceiling: usize) -> Self {
        Self {
            workers: items.min(ceiling).max(1),
            input_capacity: items.max(1),
            output_capacity: available_parallelism(),
        }
    }

    pub fn with_input_capacity(mut self, capacity: usize) -> Self {
        self.input_capacity = capacity.max(1);
        self
    }

    pub fn with_output_capacity(mut self, capacity: usize) -> Self {
        self.output_capacity = capacity.max(1);
        self
    }
}

pub fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Run one stage to completion and return what the collector produced.
///
/// `work` returning `None` means the item yields no output (the failure has
/// already been logged by the worker).
pub async fn run_stage<I, O, W, WFut, C, CFut, A>(
    items: Vec<I>,
    sizing: StageSizing,
    work: W,
    collect: C,
) -> A
where
    I: Send + 'static,
    O: Send + 'static,
    W: Fn(I) -> WFut + Send + Sync + 'static,
    WFut: Future<Output = Option<O>> + Send + 'static,
    C: FnOnce(mpsc::Receiver<O>) -> CFut,
    CFut: Future<Output = A> + Send + 'static,
    A: Send + 'static,
{
    let (item_tx, item_rx) = mpsc::channel::<I>(sizing.input_capacity.max(1));
    let (out_tx, out_rx) = mpsc::channel::<O>(sizing.output_capacity.max(1));

    let feeder = tokio::spawn(async move {
        for item in items {
            if item_tx.send(item).await.is_err() {
                break;
            }
        }
    });

    let item_rx = Arc::new(Mutex::new(item_rx));
    let work = Arc::new(work);
    let mut workers = JoinSet::new();
    for _ in 0..sizing.workers.max(1) {
        let item_rx = Arc::clone(&item_rx);
        let out_tx = out_tx.clone();
        let work = Arc::clone(&work);
        workers.spawn(async move {
            loop {
                let next = item_rx.lock().await.recv().await;
                let Some(item) = next else { break };
                if let Some(output) = work(item).await
                    && out_tx.send(output).await.is_err()
                {
                    break;
                }
            }
        });
    }
    drop(out_tx);

    let collector = tokio::spawn(collect(out_rx));

    if let Err(e) = feeder.await {
        error!(error = %e, "feeder task failed");
    }
    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "worker task failed");
        }
    }

    match collector.await {
        Ok(collected) => collected,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => panic!("collector task cancelled: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn collect_all(mut rx: mpsc::Receiver<u32>) -> Vec<u32> {
        let mut out = Vec::new();
        while let Some(v) = rx.recv().await {
            out.push(v);
        }
        out
    }

    #[test]
    fn test_sizing_caps_workers() {
        assert_eq!(StageSizing::new(500, 200).workers, 200);
        assert_eq!(StageSizing::new(3, 200).workers, 3);
        assert_eq!(StageSizing::new(0, 200).workers, 1);
        assert_eq!(StageSizing::new(0, 200).input_capacity, 1);
    }

    #[tokio::test]
    async fn test_every_item_processed_once() {
        let items: Vec<u32> = (0..100).collect();
        let sizing = StageSizing::new(items.len(), 7).with_output_capacity(2);
        let mut out = run_stage(items, sizing, |n| async move { Some(n * 2) }, collect_all).await;
        out.sort_unstable();
        assert_eq!(out, (0..100).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_none_outputs_are_dropped() {
        let items: Vec<u32> = (0..10).collect();
        let sizing = StageSizing::new(items.len(), 3);
        let out = run_stage(
            items,
            sizing,
            |n| async move { (n % 2 == 0).then_some(n) },
            collect_all,
        )
        .await;
        assert_eq!(out.len(), 5);
        assert!(out.iter().all(|n| n % 2 == 0));
    }

    #[tokio::test]
    async fn test_concurrency_bounded_by_workers() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let items: Vec<u32> = (0..40).collect();
        let sizing = StageSizing::new(items.len(), 4);

        let work = {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            move |n: u32| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Some(n)
                }
            }
        };

        let out = run_stage(items, sizing, work, collect_all).await;
        assert_eq!(out.len(), 40);
        assert!(peak.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let out = run_stage(
            Vec::<u32>::new(),
            StageSizing::new(0, 10),
            |n| async move { Some(n) },
            collect_all,
        )
        .await;
        assert!(out.is_empty());
    }
}
