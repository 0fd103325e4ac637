pub mod core;

// Re-export key items for easy importing in this crate
pub use core::types;

// Re-export key items for easy importing in other crates
pub use core::aggregator::{Aggregator, AggregatorHandle};
pub use core::db::{DbSettings, QueryExecutor, SqlHandle};
pub use core::driver::{drive, run};
pub use core::main_shared::run_main;
pub use core::report::{ReportFormat, RunReport};
pub use core::worker::{PROCESSING_DELAY, WorkerExit, execute_worker};
