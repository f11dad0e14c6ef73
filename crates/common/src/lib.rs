//! Reelsmith Common Utilities
//!
//! Shared infrastructure for all Reelsmith crates:
//! - Error taxonomy and result aliases
//! - Configuration loading
//! - Tracing/logging initialization
//! - Injectable usage metrics

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::*;
pub use error::*;
pub use metrics::*;
