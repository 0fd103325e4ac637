//! Single-writer statistics aggregation.
//!
//! One task owns the [`GlobalStats`] of a run. Workers hold cheap
//! [`AggregatorHandle`] clones and submit outcomes over a channel, so every
//! `record` is applied as one uninterrupted step and no lock is shared
//! between workers.

use chrono::{DateTime, Utc};
use log::{error, trace};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::types::{AppResult, ExecutionOutcome, GlobalStats};

/// Submission side of the aggregator, cloned into every worker
#[derive(Clone, Debug)]
pub struct AggregatorHandle {
    tx: mpsc::UnboundedSender<ExecutionOutcome>,
}

impl AggregatorHandle {
    /// Record one execution. Never blocks.
    pub fn record(&self, outcome: ExecutionOutcome) {
        if let Err(e) = self.tx.send(outcome) {
            error!(
                "Aggregator is gone, dropping outcome from worker {}",
                e.0.worker_id
            );
        }
    }
}

/// The task owning the statistics; yields them once every handle is dropped
pub struct Aggregator {
    task: JoinHandle<GlobalStats>,
}

impl Aggregator {
    pub fn spawn(start_time: DateTime<Utc>) -> (AggregatorHandle, Self) {
        let (tx, mut rx) = mpsc::unbounded_channel::<ExecutionOutcome>();
        let task = tokio::spawn(async move {
            let mut stats = GlobalStats::new(start_time);
            while let Some(outcome) = rx.recv().await {
                trace!(
                    "worker {} finished in {:?} (ok: {})",
                    outcome.worker_id, outcome.duration, outcome.succeeded
                );
                stats.record(&outcome);
            }
            stats
        });
        (AggregatorHandle { tx }, Self { task })
    }

    /// Wait for the final statistics. Resolves only after every
    /// [`AggregatorHandle`] has been dropped and all queued outcomes are
    /// applied.
    pub async fn finish(self) -> AppResult<GlobalStats> {
        Ok(self.task.await?)
    }
}
