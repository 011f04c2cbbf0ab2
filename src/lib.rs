#![forbid(unsafe_code)]

//! camera_drain (camdrain) — polling drain daemon for camera image files.
//!
//! Bridges a producer that drops image files into a directory (e.g. a
//! capture device) and a consumer that expects a live ordered byte stream of
//! those images (e.g. a piped process). The loop is: discover → throttle →
//! stream → delete, forever, with every filesystem error contained to the
//! scan pass that raised it.
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use camera_drain::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use camera_drain::core::config::Config;
//! use camera_drain::scanner::walker::TreeScanner;
//! ```

pub mod prelude;

pub mod core;
pub mod daemon;
pub mod logger;
pub mod scanner;
