//! Utility modules for the sweeper.

pub mod errors;
pub mod logger;

pub use errors::{Result, SweeperError};
