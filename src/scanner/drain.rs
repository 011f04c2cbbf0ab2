//! Drain operation: stream a file's bytes to the sink, then delete it.
//!
//! The contract is all-or-nothing: the source file is removed only after
//! every byte has been handed to the sink (including a flush). A failure at
//! any point before that leaves the file on disk for the next pass.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use crate::core::errors::{DrainError, Result};

/// Streams whole files into a single process-wide byte sink.
///
/// The sink receives the raw, unframed, concatenated bytes of each drained
/// file in the order `drain` is called; consumers must infer boundaries
/// out-of-band. There is exactly one executor per process and it is only
/// driven from the single scanning thread, so writes never interleave.
pub struct DrainExecutor<W: Write> {
    sink: W,
}

impl<W: Write> DrainExecutor<W> {
    /// Wrap the process-wide output sink.
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    /// Stream the full contents of `path` to the sink, then delete the file.
    ///
    /// Returns the number of bytes emitted. Side-effect ordering is strict:
    /// the copy (and flush) completes fully before the delete is attempted,
    /// so a file is never deleted unless its bytes already reached the sink.
    pub fn drain(&mut self, path: &Path) -> Result<u64> {
        let mut file = File::open(path).map_err(|source| DrainError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let bytes = io::copy(&mut file, &mut self.sink).map_err(|source| DrainError::Copy {
            path: path.to_path_buf(),
            source,
        })?;
        self.sink.flush().map_err(|source| DrainError::Copy {
            path: path.to_path_buf(),
            source,
        })?;

        // Close the handle before unlinking; required on Windows, harmless
        // elsewhere.
        drop(file);

        fs::remove_file(path).map_err(|source| DrainError::Delete {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(bytes)
    }

    /// Flush the sink without draining anything.
    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush().map_err(|e| DrainError::Runtime {
            details: format!("sink flush failed: {e}"),
        })
    }

    /// Consume the executor and return the sink.
    pub fn into_sink(self) -> W {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sink that accepts `capacity` bytes, then fails every write.
    struct FailingSink {
        received: Vec<u8>,
        capacity: usize,
    }

    impl FailingSink {
        fn new(capacity: usize) -> Self {
            Self {
                received: Vec::new(),
                capacity,
            }
        }
    }

    impl Write for FailingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let room = self.capacity.saturating_sub(self.received.len());
            if room == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"));
            }
            let take = room.min(buf.len());
            self.received.extend_from_slice(&buf[..take]);
            Ok(take)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn successful_drain_emits_bytes_and_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.jpg");
        fs::write(&path, b"jpeg-bytes-here").unwrap();

        let mut exec = DrainExecutor::new(Vec::new());
        let bytes = exec.drain(&path).expect("drain should succeed");

        assert_eq!(bytes, 15);
        assert_eq!(exec.into_sink(), b"jpeg-bytes-here");
        assert!(!path.exists(), "file must be deleted after a full copy");
    }

    #[test]
    fn sink_failure_keeps_file_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.jpg");
        fs::write(&path, b"0123456789").unwrap();

        let mut exec = DrainExecutor::new(FailingSink::new(4));
        let err = exec.drain(&path).expect_err("short sink must fail the copy");

        assert_eq!(err.code(), "CDR-2003");
        assert!(path.exists(), "file must survive a failed copy");
        assert_eq!(fs::read(&path).unwrap(), b"0123456789");
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vanished.jpg");

        let mut exec = DrainExecutor::new(Vec::new());
        let err = exec.drain(&path).expect_err("missing file must fail");
        assert_eq!(err.code(), "CDR-2002");
    }

    #[test]
    fn consecutive_drains_concatenate_in_call_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.jpg");
        let second = dir.path().join("b.jpg");
        fs::write(&first, b"AAA").unwrap();
        fs::write(&second, b"BBB").unwrap();

        let mut exec = DrainExecutor::new(Vec::new());
        exec.drain(&first).unwrap();
        exec.drain(&second).unwrap();

        assert_eq!(exec.into_sink(), b"AAABBB");
    }

    #[test]
    fn empty_file_drains_to_zero_bytes_and_is_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.jpg");
        fs::write(&path, b"").unwrap();

        let mut exec = DrainExecutor::new(Vec::new());
        let bytes = exec.drain(&path).expect("empty drain should succeed");

        assert_eq!(bytes, 0);
        assert!(!path.exists());
    }
}
