use std::sync::Arc;
use std::time::Duration;

/// One completed query attempt by a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub worker_id: u32,
    pub duration: Duration,
    pub succeeded: bool,
    pub query: Arc<str>,
}

impl ExecutionOutcome {
    pub fn success(worker_id: u32, duration: Duration, query: Arc<str>) -> Self {
        Self {
            worker_id,
            duration,
            succeeded: true,
            query,
        }
    }

    pub fn failure(worker_id: u32, duration: Duration, query: Arc<str>) -> Self {
        Self {
            worker_id,
            duration,
            succeeded: false,
            query,
        }
    }
}
