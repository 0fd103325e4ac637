use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, warn};
use tokio::time::{Instant, sleep};

use crate::core::aggregator::AggregatorHandle;
use crate::core::db::QueryExecutor;
use crate::types::{ExecutionOutcome, WorkloadPlan};

/// Client-side think time after every execution
pub const PROCESSING_DELAY: Duration = Duration::from_millis(10);

/// Longest stretch a sleeping worker goes without checking for Ctrl-C
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// How a worker's run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    Completed,
    Interrupted,
}

/// Run one simulated client: `iterations` timed executions, each followed by
/// the processing delay, then a final pause of `interval`.
///
/// Query errors are logged and recorded as failures; they never stop the
/// worker. Clearing `running` stops it between iterations or mid-sleep.
pub async fn execute_worker<E: QueryExecutor>(
    id: u32,
    plan: &WorkloadPlan,
    executor: &E,
    aggregator: &AggregatorHandle,
    running: &AtomicBool,
) -> WorkerExit {
    let query = plan.query();

    for iteration in 0..plan.iterations() {
        if !running.load(Ordering::SeqCst) {
            debug!("Worker {id} interrupted before iteration {iteration}");
            return WorkerExit::Interrupted;
        }

        let start = Instant::now();
        let result = executor.execute(query).await;
        let duration = start.elapsed();

        let outcome = match result {
            Ok(()) => ExecutionOutcome::success(id, duration, Arc::clone(query)),
            Err(e) => {
                warn!("Worker {id}: error executing query: {e}");
                ExecutionOutcome::failure(id, duration, Arc::clone(query))
            }
        };
        aggregator.record(outcome);

        if !pace(PROCESSING_DELAY, running).await {
            return WorkerExit::Interrupted;
        }
    }

    if !pace(plan.interval(), running).await {
        return WorkerExit::Interrupted;
    }
    debug!("Worker {id} done");
    WorkerExit::Completed
}

/// Sleep for `duration`, waking early if `running` is cleared.
/// Returns false when interrupted.
async fn pace(duration: Duration, running: &AtomicBool) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if !running.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        sleep((deadline - now).min(SHUTDOWN_POLL)).await;
    }
}
