//! Signal handling: SIGTERM/SIGINT graceful shutdown and SIGUSR1 drain-now.
//!
//! Uses the `signal-hook` crate for safe signal registration. The scheduler
//! polls the flags between sleeps and passes rather than blocking on
//! signals; the shutdown flag doubles as the injectable stop predicate that
//! makes the otherwise-infinite loop testable.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::{SIGINT, SIGTERM};

/// Thread-safe signal state shared between the OS signal handler and the
/// scheduler loop.
///
/// All flags use `Ordering::Relaxed`; the loop polls them every iteration
/// and no ordering with other atomics is required.
#[derive(Clone)]
pub struct SignalHandler {
    shutdown_flag: Arc<AtomicBool>,
    drain_now_flag: Arc<AtomicBool>,
}

impl SignalHandler {
    /// Create a handler and register OS signal hooks.
    ///
    /// SIGTERM/SIGINT -> shutdown; SIGUSR1 -> drain now (Unix only).
    /// Registration is best-effort; failures go to stderr but are not fatal.
    pub fn new() -> Self {
        let handler = Self::detached();
        handler.register_signals();
        handler
    }

    /// A handler with no OS hooks, driven only programmatically (tests,
    /// embedded library use).
    #[must_use]
    pub fn detached() -> Self {
        Self {
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            drain_now_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check whether a shutdown has been requested.
    pub fn should_shutdown(&self) -> bool {
        self.shutdown_flag.load(Ordering::Relaxed)
    }

    /// Check (and clear) whether an immediate pass has been requested.
    pub fn take_drain_now(&self) -> bool {
        self.drain_now_flag.swap(false, Ordering::Relaxed)
    }

    /// Programmatically request shutdown.
    pub fn request_shutdown(&self) {
        self.shutdown_flag.store(true, Ordering::Relaxed);
    }

    /// Programmatically request an immediate pass.
    pub fn request_drain_now(&self) {
        self.drain_now_flag.store(true, Ordering::Relaxed);
    }

    fn register_signals(&self) {
        if let Err(e) = signal_hook::flag::register(SIGTERM, Arc::clone(&self.shutdown_flag)) {
            eprintln!("[camdrain] failed to register SIGTERM: {e}");
        }
        if let Err(e) = signal_hook::flag::register(SIGINT, Arc::clone(&self.shutdown_flag)) {
            eprintln!("[camdrain] failed to register SIGINT: {e}");
        }

        #[cfg(unix)]
        {
            use signal_hook::consts::SIGUSR1;
            if let Err(e) = signal_hook::flag::register(SIGUSR1, Arc::clone(&self.drain_now_flag)) {
                eprintln!("[camdrain] failed to register SIGUSR1: {e}");
            }
        }
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}
