//! Poll scheduler: the outer forever-loop.
//!
//! Sleep, run one scan pass, log the outcome, repeat. A pass failure is
//! logged at error severity and the loop continues — that containment is the
//! system's entire recovery mechanism. There is no retry count, no backoff
//! growth, and no exit path on repeated failure; the loop ends only when the
//! shutdown flag is raised (OS signal or programmatic request).

use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

use crate::core::config::Config;
use crate::core::errors::Result;
use crate::daemon::signals::SignalHandler;
use crate::logger::activity::{ActivityEvent, ActivityLoggerHandle};
use crate::scanner::drain::DrainExecutor;
use crate::scanner::walker::TreeScanner;

/// Substituted for a zero poll interval so the loop never busy-spins.
pub const MIN_POLL_SLEEP: Duration = Duration::from_millis(50);

/// Sleep granularity; bounds how long a shutdown request can go unnoticed.
const SIGNAL_POLL_CHUNK: Duration = Duration::from_millis(25);

/// Effective inter-pass sleep for a configured interval.
///
/// Zero is substituted with [`MIN_POLL_SLEEP`]. The per-file throttle has no
/// such substitution — zero there genuinely means no delay.
#[must_use]
pub fn effective_poll_interval(interval_ms: u64) -> Duration {
    if interval_ms == 0 {
        MIN_POLL_SLEEP
    } else {
        Duration::from_millis(interval_ms)
    }
}

/// The drain daemon: owns the scanner, the sink, and the schedule.
///
/// Single state "waiting-then-scanning"; passes run strictly sequentially
/// from this one thread, so files are emitted in a well-defined order and
/// the filesystem has exactly one mutator.
pub struct DrainDaemon<W: Write> {
    scanner: TreeScanner,
    exec: DrainExecutor<W>,
    poll_interval: Duration,
    signals: SignalHandler,
    logger: ActivityLoggerHandle,
    config_hash: String,
    passes_completed: u64,
    passes_failed: u64,
    files_drained: u64,
    bytes_emitted: u64,
}

impl<W: Write> DrainDaemon<W> {
    /// Assemble a daemon from an immutable config, the process-wide sink,
    /// a logger handle, and the signal state to poll.
    pub fn new(
        config: &Config,
        sink: W,
        logger: ActivityLoggerHandle,
        signals: SignalHandler,
    ) -> Self {
        let scanner = TreeScanner::new(
            config.watch.root_path.clone(),
            Duration::from_millis(config.watch.item_delay_ms),
        )
        .with_logger(logger.clone());

        Self {
            scanner,
            exec: DrainExecutor::new(sink),
            poll_interval: effective_poll_interval(config.poll.interval_ms),
            signals,
            logger,
            config_hash: config.stable_hash().unwrap_or_default(),
            passes_completed: 0,
            passes_failed: 0,
            files_drained: 0,
            bytes_emitted: 0,
        }
    }

    /// Run until shutdown is requested. Waiting-then-scanning: each
    /// iteration sleeps the poll interval first, then runs one pass.
    pub fn run(&mut self) -> Result<()> {
        self.drive(None)
    }

    /// Run a bounded number of scheduler iterations with identical
    /// semantics. Each iteration is one sleep plus one attempted pass.
    pub fn run_passes(&mut self, max_passes: u64) -> Result<()> {
        self.drive(Some(max_passes))
    }

    /// Successfully completed passes.
    pub fn passes_completed(&self) -> u64 {
        self.passes_completed
    }

    /// Passes aborted by a traversal or drain error.
    pub fn passes_failed(&self) -> u64 {
        self.passes_failed
    }

    /// Total files drained over the daemon's lifetime.
    pub fn files_drained(&self) -> u64 {
        self.files_drained
    }

    /// Total bytes emitted over the daemon's lifetime.
    pub fn bytes_emitted(&self) -> u64 {
        self.bytes_emitted
    }

    fn drive(&mut self, max_passes: Option<u64>) -> Result<()> {
        self.logger.send(ActivityEvent::DaemonStarted {
            version: env!("CARGO_PKG_VERSION").to_string(),
            config_hash: self.config_hash.clone(),
        });

        let mut attempted: u64 = 0;
        loop {
            if max_passes.is_some_and(|max| attempted >= max) {
                break;
            }
            if self.signals.should_shutdown() {
                break;
            }
            self.sleep_between_passes();
            if self.signals.should_shutdown() {
                break;
            }
            self.execute_pass();
            attempted += 1;
        }

        self.logger.send(ActivityEvent::DaemonStopped {
            passes_completed: self.passes_completed,
            files_drained: self.files_drained,
        });
        self.logger.flush();
        let _ = self.exec.flush();
        Ok(())
    }

    /// Run one pass and contain whatever it raises.
    fn execute_pass(&mut self) {
        match self.scanner.run_pass(&mut self.exec) {
            Ok(summary) => {
                self.passes_completed += 1;
                self.files_drained += summary.files_drained;
                self.bytes_emitted += summary.bytes_emitted;
                // Empty passes are the steady state; only drains are worth a
                // log line.
                if summary.files_drained > 0 {
                    self.logger.send(ActivityEvent::PassCompleted {
                        files_drained: summary.files_drained,
                        bytes_emitted: summary.bytes_emitted,
                        duration_ms: u64::try_from(summary.duration.as_millis())
                            .unwrap_or(u64::MAX),
                    });
                }
            }
            Err(err) => {
                self.passes_failed += 1;
                self.logger.send(ActivityEvent::PassFailed {
                    code: err.code().to_string(),
                    message: err.to_string(),
                });
            }
        }
    }

    /// Sleep the poll interval in small chunks, returning early on shutdown
    /// or a drain-now request.
    fn sleep_between_passes(&self) {
        let deadline = Instant::now() + self.poll_interval;
        loop {
            if self.signals.should_shutdown() || self.signals.take_drain_now() {
                return;
            }
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return;
            };
            if remaining.is_zero() {
                return;
            }
            thread::sleep(remaining.min(SIGNAL_POLL_CHUNK));
        }
    }
}
