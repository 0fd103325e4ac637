pub mod config;
mod duration;
mod error;
mod outcome;
mod plan;
mod stats;

pub use duration::*;
pub use error::*;
pub use outcome::*;
pub use plan::*;
pub use stats::*;
