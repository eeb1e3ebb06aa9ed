//! Shared utilities for chatline.
//!
//! - Error type used by every library crate in the workspace
//! - Logging setup with tracing
//! - RAII timing guards for slow-frame diagnostics

pub mod error;
pub mod log;
pub mod timing;

pub use error::{Error, ErrorKind, Result};
pub use log::{LogConfig, LogLevel};
pub use timing::TimingGuard;
