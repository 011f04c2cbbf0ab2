//! Activity logging: one event model, two outputs.
//!
//! Every event becomes a JSONL entry; depending on the echo mode it is also
//! mirrored to stderr as a short human-readable line. The handle is a cheap
//! clone over a single shared writer so the scanner and the scheduler can
//! both log without threading a mutable reference through the engine.

#![allow(missing_docs)]

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};

/// How much of the activity stream is echoed to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoMode {
    /// Errors only.
    Quiet,
    /// Per-file lines, pass failures, daemon lifecycle.
    Normal,
    /// Everything, including per-pass summaries.
    Verbose,
}

/// Events emitted by the engine and the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityEvent {
    DaemonStarted {
        version: String,
        config_hash: String,
    },
    DaemonStopped {
        passes_completed: u64,
        files_drained: u64,
    },
    /// Logged just before a file's bytes are streamed to the sink.
    FileDraining {
        path: String,
    },
    PassCompleted {
        files_drained: u64,
        bytes_emitted: u64,
        duration_ms: u64,
    },
    PassFailed {
        code: String,
        message: String,
    },
    Error {
        code: String,
        message: String,
    },
}

impl ActivityEvent {
    fn to_entry(&self) -> LogEntry {
        match self {
            Self::DaemonStarted {
                version,
                config_hash,
            } => {
                let mut entry = LogEntry::new(EventType::DaemonStart, Severity::Info);
                entry.details = Some(format!("version={version} config_hash={config_hash}"));
                entry
            }
            Self::DaemonStopped {
                passes_completed,
                files_drained,
            } => {
                let mut entry = LogEntry::new(EventType::DaemonStop, Severity::Info);
                entry.files = Some(*files_drained);
                entry.details = Some(format!("passes_completed={passes_completed}"));
                entry
            }
            Self::FileDraining { path } => {
                let mut entry = LogEntry::new(EventType::FileDrain, Severity::Info);
                entry.path = Some(path.clone());
                entry
            }
            Self::PassCompleted {
                files_drained,
                bytes_emitted,
                duration_ms,
            } => {
                let mut entry = LogEntry::new(EventType::PassComplete, Severity::Info);
                entry.files = Some(*files_drained);
                entry.bytes = Some(*bytes_emitted);
                entry.duration_ms = Some(*duration_ms);
                entry
            }
            Self::PassFailed { code, message } => {
                let mut entry = LogEntry::new(EventType::PassFail, Severity::Error);
                entry.error_code = Some(code.clone());
                entry.error_message = Some(message.clone());
                entry
            }
            Self::Error { code, message } => {
                let mut entry = LogEntry::new(EventType::Error, Severity::Error);
                entry.error_code = Some(code.clone());
                entry.error_message = Some(message.clone());
                entry
            }
        }
    }

    const fn severity(&self) -> Severity {
        match self {
            Self::PassFailed { .. } | Self::Error { .. } => Severity::Error,
            _ => Severity::Info,
        }
    }
}

/// Synchronous activity logger: JSONL file plus stderr echo.
pub struct ActivityLogger {
    jsonl: JsonlWriter,
    echo: EchoMode,
}

impl ActivityLogger {
    /// Build a logger over an already-opened JSONL writer.
    pub fn new(jsonl: JsonlWriter, echo: EchoMode) -> Self {
        Self { jsonl, echo }
    }

    /// Open the JSONL file and wrap it.
    pub fn open(config: JsonlConfig, echo: EchoMode) -> Self {
        Self::new(JsonlWriter::open(config), echo)
    }

    fn log(&mut self, event: &ActivityEvent) {
        self.jsonl.write_entry(&event.to_entry());
        self.echo(event);
    }

    fn echo(&self, event: &ActivityEvent) {
        let wanted = match self.echo {
            EchoMode::Quiet => event.severity() == Severity::Error,
            EchoMode::Normal => !matches!(event, ActivityEvent::PassCompleted { .. }),
            EchoMode::Verbose => true,
        };
        if !wanted {
            return;
        }

        let mut err = io::stderr().lock();
        let _ = match event {
            ActivityEvent::DaemonStarted { version, .. } => {
                writeln!(err, "[camdrain] v{version} started")
            }
            ActivityEvent::DaemonStopped {
                passes_completed,
                files_drained,
            } => writeln!(
                err,
                "[camdrain] stopped after {passes_completed} passes, {files_drained} files drained"
            ),
            ActivityEvent::FileDraining { path } => writeln!(err, "[camdrain] {path}"),
            ActivityEvent::PassCompleted {
                files_drained,
                bytes_emitted,
                duration_ms,
            } => writeln!(
                err,
                "[camdrain] pass drained {files_drained} files ({bytes_emitted} bytes) in {duration_ms} ms"
            ),
            ActivityEvent::PassFailed { code, message } => {
                writeln!(err, "[camdrain] [{code}] pass failed: {message}")
            }
            ActivityEvent::Error { code, message } => {
                writeln!(err, "[camdrain] [{code}] {message}")
            }
        };
    }

    fn flush(&mut self) {
        self.jsonl.flush();
    }
}

/// Cheap-to-clone handle over the single shared [`ActivityLogger`].
#[derive(Clone)]
pub struct ActivityLoggerHandle {
    inner: Arc<Mutex<ActivityLogger>>,
}

impl ActivityLoggerHandle {
    /// Wrap a logger in a shared handle.
    pub fn new(logger: ActivityLogger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(logger)),
        }
    }

    /// A handle that discards everything (tests, bare library use).
    pub fn disabled() -> Self {
        Self::new(ActivityLogger::new(JsonlWriter::discard(), EchoMode::Quiet))
    }

    /// Record one event.
    pub fn send(&self, event: ActivityEvent) {
        self.inner.lock().log(&event);
    }

    /// Flush the underlying writer.
    pub fn flush(&self) {
        self.inner.lock().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_map_to_expected_entry_shapes() {
        let entry = ActivityEvent::FileDraining {
            path: "/capture/frame.jpg".to_string(),
        }
        .to_entry();
        assert_eq!(entry.event, EventType::FileDrain);
        assert_eq!(entry.severity, Severity::Info);
        assert_eq!(entry.path.as_deref(), Some("/capture/frame.jpg"));

        let entry = ActivityEvent::PassFailed {
            code: "CDR-2001".to_string(),
            message: "boom".to_string(),
        }
        .to_entry();
        assert_eq!(entry.event, EventType::PassFail);
        assert_eq!(entry.severity, Severity::Error);
        assert_eq!(entry.error_code.as_deref(), Some("CDR-2001"));

        let entry = ActivityEvent::PassCompleted {
            files_drained: 3,
            bytes_emitted: 999,
            duration_ms: 12,
        }
        .to_entry();
        assert_eq!(entry.files, Some(3));
        assert_eq!(entry.bytes, Some(999));
        assert_eq!(entry.duration_ms, Some(12));
    }

    #[test]
    fn handle_clones_share_the_writer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");
        let config = JsonlConfig {
            path: path.clone(),
            fallback_path: None,
            ..JsonlConfig::default()
        };
        let handle = ActivityLoggerHandle::new(ActivityLogger::open(config, EchoMode::Quiet));
        let clone = handle.clone();

        handle.send(ActivityEvent::FileDraining {
            path: "/a.jpg".to_string(),
        });
        clone.send(ActivityEvent::FileDraining {
            path: "/b.jpg".to_string(),
        });
        handle.flush();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.lines().count(), 2);
    }

    #[test]
    fn disabled_handle_swallows_events() {
        let handle = ActivityLoggerHandle::disabled();
        handle.send(ActivityEvent::Error {
            code: "CDR-3900".to_string(),
            message: "ignored".to_string(),
        });
        handle.flush();
    }
}
