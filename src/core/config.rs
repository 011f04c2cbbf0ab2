//! Configuration system: TOML file + env var overrides + defaults.
//!
//! The configuration is loaded once at startup and is immutable for the
//! process lifetime. The engine never reads ambient process state; everything
//! it needs arrives through [`Config`].

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{DrainError, Result};
use crate::core::paths::resolve_absolute_path;

/// Full camdrain configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
#[derive(Default)]
pub struct Config {
    pub watch: WatchConfig,
    pub poll: PollConfig,
    pub log: LogConfig,
    pub paths: PathsConfig,
}

/// What to watch and how fast to emit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WatchConfig {
    /// Root of the directory tree to drain. Empty means "not configured";
    /// the CLI requires it from the config file, env, or a positional arg.
    pub root_path: PathBuf,
    /// Throttle between consecutive eligible files within a pass, in
    /// milliseconds. Zero means genuinely no delay.
    pub item_delay_ms: u64,
}

/// Pass scheduling knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollConfig {
    /// Sleep between scan passes, in milliseconds. Zero is substituted with a
    /// small fixed minimum so the loop never busy-spins.
    pub interval_ms: u64,
}

/// Activity log tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
    pub fsync_interval_secs: u64,
}

/// Filesystem paths used by camdrain itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub jsonl_log: PathBuf,
    pub jsonl_fallback: Option<PathBuf>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            root_path: PathBuf::new(),
            item_delay_ms: 100,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_ms: 100 }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 50 * 1024 * 1024,
            max_rotated_files: 3,
            fsync_interval_secs: 10,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!(
                    "[CDR-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths"
                );
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        let cfg = home_dir.join(".config").join("camdrain").join("config.toml");
        let data = home_dir.join(".local").join("share").join("camdrain");
        Self {
            config_file: cfg,
            jsonl_log: data.join("activity.jsonl"),
            jsonl_fallback: Some(env::temp_dir().join("camdrain-activity.jsonl")),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from the default
    /// path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| DrainError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(DrainError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides()?;
        cfg.normalize_paths();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for startup logging.
    ///
    /// FNV-1a over the canonical JSON form; stable across processes and Rust
    /// releases, unlike `DefaultHasher`.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_env_overrides_from(env_var)
    }

    /// Apply overrides from a lookup function (the real environment in
    /// production, a map in tests).
    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("CAMDRAIN_WATCH_ROOT_PATH") {
            self.watch.root_path = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("CAMDRAIN_WATCH_ITEM_DELAY_MS") {
            self.watch.item_delay_ms = parse_env_u64("CAMDRAIN_WATCH_ITEM_DELAY_MS", &raw)?;
        }
        if let Some(raw) = lookup("CAMDRAIN_POLL_INTERVAL_MS") {
            self.poll.interval_ms = parse_env_u64("CAMDRAIN_POLL_INTERVAL_MS", &raw)?;
        }
        if let Some(raw) = lookup("CAMDRAIN_LOG_MAX_SIZE_BYTES") {
            self.log.max_size_bytes = parse_env_u64("CAMDRAIN_LOG_MAX_SIZE_BYTES", &raw)?;
        }
        if let Some(raw) = lookup("CAMDRAIN_LOG_MAX_ROTATED_FILES") {
            let parsed = parse_env_u64("CAMDRAIN_LOG_MAX_ROTATED_FILES", &raw)?;
            self.log.max_rotated_files =
                u32::try_from(parsed).map_err(|_| DrainError::ConfigParse {
                    context: "env",
                    details: format!("CAMDRAIN_LOG_MAX_ROTATED_FILES={raw:?}: out of range"),
                })?;
        }
        if let Some(raw) = lookup("CAMDRAIN_JSONL_LOG") {
            self.paths.jsonl_log = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("CAMDRAIN_JSONL_FALLBACK") {
            self.paths.jsonl_fallback = Some(PathBuf::from(raw));
        }
        Ok(())
    }

    fn normalize_paths(&mut self) {
        if !self.watch.root_path.as_os_str().is_empty() {
            self.watch.root_path = resolve_absolute_path(&self.watch.root_path);
        }
    }

    /// Check structural constraints. The watch root may still be empty here;
    /// the CLI enforces its presence after merging command-line overrides.
    pub fn validate(&self) -> Result<()> {
        if self.log.max_rotated_files == 0 {
            return Err(DrainError::InvalidConfig {
                details: "log.max_rotated_files must be >= 1".to_string(),
            });
        }
        if self.log.max_size_bytes == 0 {
            return Err(DrainError::InvalidConfig {
                details: "log.max_size_bytes must be > 0".to_string(),
            });
        }
        if self.paths.jsonl_log.as_os_str().is_empty() {
            return Err(DrainError::InvalidConfig {
                details: "paths.jsonl_log must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Ensure a usable watch root after all override layers have been merged.
    pub fn require_root(&self) -> Result<&Path> {
        if self.watch.root_path.as_os_str().is_empty() {
            return Err(DrainError::InvalidConfig {
                details: "watch.root_path must be set (config file, \
                          CAMDRAIN_WATCH_ROOT_PATH, or a positional ROOT argument)"
                    .to_string(),
            });
        }
        Ok(&self.watch.root_path)
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_u64(name: &str, raw: &str) -> Result<u64> {
    raw.parse::<u64>().map_err(|error| DrainError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}
