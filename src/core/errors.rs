//! CDR-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, DrainError>;

/// Top-level error type for the camera drain daemon.
///
/// Every pass-level failure (traversal, open, copy, delete) is contained to
/// the scan pass that raised it; the scheduler logs it and starts the next
/// pass fresh. Config errors surface at startup and are fatal.
#[derive(Debug, Error)]
pub enum DrainError {
    #[error("[CDR-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[CDR-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[CDR-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[CDR-2001] traversal failure at {path}: {details}")]
    Traversal { path: PathBuf, details: String },

    #[error("[CDR-2002] cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[CDR-2003] copy aborted for {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[CDR-2004] delete failed for {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[CDR-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[CDR-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[CDR-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl DrainError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "CDR-1001",
            Self::MissingConfig { .. } => "CDR-1002",
            Self::ConfigParse { .. } => "CDR-1003",
            Self::Traversal { .. } => "CDR-2001",
            Self::Open { .. } => "CDR-2002",
            Self::Copy { .. } => "CDR-2003",
            Self::Delete { .. } => "CDR-2004",
            Self::Serialization { .. } => "CDR-2101",
            Self::Io { .. } => "CDR-3002",
            Self::Runtime { .. } => "CDR-3900",
        }
    }

    /// Whether the next scheduled pass might resolve the failure.
    ///
    /// Pass-level filesystem errors are always retryable: the file (or the
    /// broken branch) gets a fresh chance on the next pass. Config errors
    /// require operator intervention.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Traversal { .. }
                | Self::Open { .. }
                | Self::Copy { .. }
                | Self::Delete { .. }
                | Self::Io { .. }
                | Self::Runtime { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<walkdir::Error> for DrainError {
    fn from(value: walkdir::Error) -> Self {
        let path = value.path().map_or_else(PathBuf::new, Path::to_path_buf);
        let details = value
            .io_error()
            .map_or_else(|| value.to_string(), ToString::to_string);
        Self::Traversal { path, details }
    }
}

impl From<serde_json::Error> for DrainError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for DrainError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
