use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use log::{error, info, warn};

use crate::core::aggregator::Aggregator;
use crate::core::db::{DbSettings, QueryExecutor, SqlHandle};
use crate::core::report::RunReport;
use crate::core::worker::{WorkerExit, execute_worker};
use crate::types::{AppResult, GlobalStats, WorkloadPlan};

/// Open the database, run the whole workload against it and close it again.
///
/// A connection failure aborts before any worker is launched.
pub async fn run(
    plan: &WorkloadPlan,
    settings: &DbSettings,
    running: Arc<AtomicBool>,
) -> AppResult<RunReport> {
    let handle = Arc::new(SqlHandle::connect(settings).await?);

    let stats = drive(plan, Arc::clone(&handle), Arc::clone(&running)).await?;
    handle.close().await;

    Ok(RunReport::new(
        stats,
        Utc::now(),
        !running.load(Ordering::SeqCst),
    ))
}

/// Launch `plan.concurrency()` workers against `executor` and wait for all
/// of them. The returned statistics are complete: every worker has finished
/// and every submitted outcome has been applied.
pub async fn drive<E: QueryExecutor>(
    plan: &WorkloadPlan,
    executor: Arc<E>,
    running: Arc<AtomicBool>,
) -> AppResult<GlobalStats> {
    let (aggregator_handle, aggregator) = Aggregator::spawn(Utc::now());

    info!(
        "Starting {} workers x {} iterations (interval {:?})",
        plan.concurrency(),
        plan.iterations(),
        plan.interval()
    );

    let mut workers = Vec::with_capacity(plan.concurrency() as usize);
    for id in 1..=plan.concurrency() {
        let plan = plan.clone();
        let executor = Arc::clone(&executor);
        let aggregator_handle = aggregator_handle.clone();
        let running = Arc::clone(&running);
        workers.push((
            id,
            tokio::spawn(async move {
                execute_worker(id, &plan, executor.as_ref(), &aggregator_handle, &running).await
            }),
        ));
    }
    // Workers own the remaining handles; the aggregator drains once they finish
    drop(aggregator_handle);

    let mut interrupted = 0;
    for (id, worker) in workers {
        match worker.await {
            Ok(WorkerExit::Completed) => {}
            Ok(WorkerExit::Interrupted) => interrupted += 1,
            Err(e) => error!("Worker {id} aborted: {e}"),
        }
    }
    if interrupted > 0 {
        warn!("{interrupted} worker(s) stopped early");
    }

    aggregator.finish().await
}
