//! Daemon subsystem: the poll-scan-drain scheduler loop and signal handling.

pub mod loop_main;
pub mod signals;
