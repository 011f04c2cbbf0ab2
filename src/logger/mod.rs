//! Activity logging: JSONL append-only file with graceful degradation,
//! plus a human-readable stderr echo.

pub mod activity;
pub mod jsonl;
