pub mod aggregator;
pub mod cli;
pub mod db;
pub mod driver;
pub mod logging;
pub mod main_shared;
pub mod report;
pub mod types;
pub mod worker;
