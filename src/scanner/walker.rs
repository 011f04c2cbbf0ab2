//! Tree scanner: one deterministic pass over the watch root.
//!
//! The traversal is single-threaded and strictly sequential — the downstream
//! consumer reads one concatenated byte stream and relies on files being
//! emitted in a well-defined, non-interleaved order. Any traversal or drain
//! error aborts the current pass immediately (fail-fast per pass); the next
//! scheduled pass starts fresh over whatever is still on disk.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use walkdir::WalkDir;

use crate::core::errors::Result;
use crate::logger::activity::{ActivityEvent, ActivityLoggerHandle};
use crate::scanner::drain::DrainExecutor;
use crate::scanner::filter;

/// Outcome of one completed scan pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Files streamed to the sink and deleted this pass.
    pub files_drained: u64,
    /// Total bytes handed to the sink this pass.
    pub bytes_emitted: u64,
    /// Wall-clock duration of the pass, throttle included.
    pub duration: Duration,
}

/// Walks the watch root and drains every eligible file it encounters.
///
/// Traversal order is whatever the filesystem enumeration yields; no sort is
/// imposed, but within one run the order is stable relative to the directory
/// contents at scan time.
pub struct TreeScanner {
    root: PathBuf,
    item_delay: Duration,
    logger: Option<ActivityLoggerHandle>,
}

impl TreeScanner {
    /// Create a scanner over `root` with the given inter-file throttle.
    ///
    /// A zero `item_delay` genuinely means no delay — unlike the poll
    /// interval, it gets no minimum-sleep substitution.
    pub fn new(root: impl Into<PathBuf>, item_delay: Duration) -> Self {
        Self {
            root: root.into(),
            item_delay,
            logger: None,
        }
    }

    /// Attach an activity logger for per-file events.
    #[must_use]
    pub fn with_logger(mut self, logger: ActivityLoggerHandle) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The watch root this scanner traverses.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run one full pass: traverse, filter, throttle, drain.
    ///
    /// The first traversal or drain error aborts the remainder of the pass
    /// and propagates; files already drained this pass stay drained, files
    /// not yet visited stay untouched on disk.
    pub fn run_pass<W: Write>(&self, exec: &mut DrainExecutor<W>) -> Result<PassSummary> {
        let started = Instant::now();
        let mut summary = PassSummary::default();

        for entry in WalkDir::new(&self.root) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                // Directories descend without action; symlinks and other
                // non-regular entries are skipped.
                continue;
            }
            if !filter::is_eligible(entry.path()) {
                continue;
            }

            if !self.item_delay.is_zero() {
                thread::sleep(self.item_delay);
            }

            if let Some(logger) = &self.logger {
                logger.send(ActivityEvent::FileDraining {
                    path: entry.path().display().to_string(),
                });
            }

            let bytes = exec.drain(entry.path())?;
            summary.files_drained += 1;
            summary.bytes_emitted += bytes;
        }

        summary.duration = started.elapsed();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn scanner(root: &Path) -> TreeScanner {
        TreeScanner::new(root, Duration::ZERO)
    }

    #[test]
    fn pass_drains_eligible_and_skips_ineligible() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"AAA").unwrap();
        fs::write(dir.path().join("b.JPEG"), b"BBB").unwrap();
        fs::write(dir.path().join("c.png"), b"CCC").unwrap();
        fs::write(dir.path().join("notes.txt"), b"text").unwrap();

        let mut exec = DrainExecutor::new(Vec::new());
        let summary = scanner(dir.path()).run_pass(&mut exec).unwrap();

        assert_eq!(summary.files_drained, 2);
        assert_eq!(summary.bytes_emitted, 6);
        let sink = exec.into_sink();
        assert!(
            sink == b"AAABBB" || sink == b"BBBAAA",
            "sink must hold both files contiguously in traversal order: {sink:?}"
        );
        assert!(!dir.path().join("a.jpg").exists());
        assert!(!dir.path().join("b.JPEG").exists());
        assert_eq!(fs::read(dir.path().join("c.png")).unwrap(), b"CCC");
        assert_eq!(fs::read(dir.path().join("notes.txt")).unwrap(), b"text");
    }

    #[test]
    fn pass_descends_into_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("cam1").join("2026-08-07");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("frame.jpg"), b"DEEP").unwrap();

        let mut exec = DrainExecutor::new(Vec::new());
        let summary = scanner(dir.path()).run_pass(&mut exec).unwrap();

        assert_eq!(summary.files_drained, 1);
        assert_eq!(exec.into_sink(), b"DEEP");
        assert!(!nested.join("frame.jpg").exists());
        assert!(nested.exists(), "directories themselves are never removed");
    }

    #[test]
    fn directory_with_image_name_is_not_drained() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("gallery.jpg")).unwrap();

        let mut exec = DrainExecutor::new(Vec::new());
        let summary = scanner(dir.path()).run_pass(&mut exec).unwrap();

        assert_eq!(summary.files_drained, 0);
        assert!(dir.path().join("gallery.jpg").is_dir());
    }

    #[test]
    fn empty_tree_completes_with_zero_drains() {
        let dir = tempfile::tempdir().unwrap();
        let mut exec = DrainExecutor::new(Vec::new());
        let summary = scanner(dir.path()).run_pass(&mut exec).unwrap();
        assert_eq!(summary.files_drained, 0);
        assert_eq!(summary.bytes_emitted, 0);
        assert!(exec.into_sink().is_empty());
    }

    #[test]
    fn missing_root_aborts_pass_with_traversal_error() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("never-created");

        let mut exec = DrainExecutor::new(Vec::new());
        let err = scanner(&gone).run_pass(&mut exec).expect_err("must fail");
        assert_eq!(err.code(), "CDR-2001");
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdirectory_aborts_pass() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden.jpg"), b"XXX").unwrap();
        fs::write(dir.path().join("open.jpg"), b"OOO").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        if fs::read_dir(&locked).is_ok() {
            // Running privileged (e.g. root in CI): mode bits are not
            // enforced, so the scenario cannot be produced.
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let mut exec = DrainExecutor::new(Vec::new());
        let result = scanner(dir.path()).run_pass(&mut exec);

        // Restore permissions so tempdir cleanup can proceed.
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let err = result.expect_err("unreadable branch must abort the pass");
        assert_eq!(err.code(), "CDR-2001");
        // Depending on enumeration order, open.jpg may or may not have been
        // drained before the error; the locked file must be untouched.
        assert!(locked.join("hidden.jpg").exists());
        let sink = exec.into_sink();
        assert!(sink.is_empty() || sink == b"OOO");
    }

    #[test]
    fn drain_failure_aborts_remainder_of_pass() {
        use std::io::{self, Write};

        struct ClosedSink;
        impl Write for ClosedSink {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "consumer gone"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"AAA").unwrap();
        fs::write(dir.path().join("b.jpg"), b"BBB").unwrap();

        let mut exec = DrainExecutor::new(ClosedSink);
        let err = scanner(dir.path())
            .run_pass(&mut exec)
            .expect_err("closed sink must abort the pass");

        assert_eq!(err.code(), "CDR-2003");
        // Nothing reached the sink, so nothing may have been deleted.
        assert!(dir.path().join("a.jpg").exists());
        assert!(dir.path().join("b.jpg").exists());
    }

    #[test]
    fn item_delay_throttles_between_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"A").unwrap();
        fs::write(dir.path().join("b.jpg"), b"B").unwrap();

        let delay = Duration::from_millis(20);
        let started = Instant::now();
        let mut exec = DrainExecutor::new(Vec::new());
        TreeScanner::new(dir.path(), delay)
            .run_pass(&mut exec)
            .unwrap();

        // The throttle applies before each of the two files.
        assert!(started.elapsed() >= delay * 2);
    }
}
