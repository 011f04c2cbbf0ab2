//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use camera_drain::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{DrainError, Result};

// Scanner
pub use crate::scanner::drain::DrainExecutor;
pub use crate::scanner::filter::{ELIGIBLE_EXTENSIONS, is_eligible};
pub use crate::scanner::walker::{PassSummary, TreeScanner};

// Daemon
pub use crate::daemon::loop_main::{DrainDaemon, MIN_POLL_SLEEP, effective_poll_interval};
pub use crate::daemon::signals::SignalHandler;

// Logger
pub use crate::logger::activity::{ActivityEvent, ActivityLogger, ActivityLoggerHandle, EchoMode};
pub use crate::logger::jsonl::{JsonlConfig, JsonlWriter};
