//! RAII timing for render-path operations.
//!
//! ```rust,ignore
//! use chatline_util::timing::TimingGuard;
//!
//! fn draw(&mut self) {
//!     let _timing = TimingGuard::frame("messages");
//!     // ... render ...
//! }
//! ```

use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Measures an operation and logs its duration when dropped.
///
/// Frames that miss the budget are logged at warn level, everything else at
/// trace so that per-frame logging stays quiet by default.
pub struct TimingGuard {
    operation_type: &'static str,
    operation_name: String,
    start: Instant,
    debug_threshold: Duration,
    warn_threshold: Duration,
}

impl TimingGuard {
    pub fn new(operation_type: &'static str, operation_name: impl Into<String>) -> Self {
        Self {
            operation_type,
            operation_name: operation_name.into(),
            start: Instant::now(),
            debug_threshold: Duration::from_millis(8),
            warn_threshold: Duration::from_millis(50),
        }
    }

    /// Guard for one draw of a widget.
    pub fn frame(widget: impl Into<String>) -> Self {
        Self::new("frame", widget)
    }

    pub fn with_warn_threshold(mut self, threshold: Duration) -> Self {
        self.warn_threshold = threshold;
        self
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let duration_us = elapsed.as_micros() as u64;
        if elapsed >= self.warn_threshold {
            warn!(
                operation_type = self.operation_type,
                operation_name = %self.operation_name,
                duration_us,
                "Slow operation"
            );
        } else if elapsed >= self.debug_threshold {
            debug!(
                operation_type = self.operation_type,
                operation_name = %self.operation_name,
                duration_us,
                "Operation completed"
            );
        } else {
            trace!(
                operation_type = self.operation_type,
                operation_name = %self.operation_name,
                duration_us,
                "Operation completed"
            );
        }
    }
}
