use std::sync::Arc;
use std::time::Duration;

use crate::types::PlanError;

/// Validated parameters of one load run
#[derive(Debug, Clone)]
pub struct WorkloadPlan {
    query: Arc<str>,
    interval: Duration,
    concurrency: u32,
    iterations: u32,
}

impl WorkloadPlan {
    pub fn new(
        query: &str,
        interval: Duration,
        concurrency: u32,
        iterations: u32,
    ) -> Result<Self, PlanError> {
        if query.trim().is_empty() {
            return Err(PlanError::EmptyQuery);
        }
        if concurrency == 0 {
            return Err(PlanError::ZeroConcurrency);
        }
        if iterations == 0 {
            return Err(PlanError::ZeroIterations);
        }
        Ok(Self {
            query: Arc::from(query),
            interval,
            concurrency,
            iterations,
        })
    }

    pub fn query(&self) -> &Arc<str> {
        &self.query
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn concurrency(&self) -> u32 {
        self.concurrency
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Number of executions a complete run produces
    pub fn expected_executions(&self) -> u64 {
        self.concurrency as u64 * self.iterations as u64
    }
}
