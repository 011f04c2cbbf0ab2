//! Top-level CLI definition and dispatch.
//!
//! For `run` and `scan`, stdout is the data sink — it carries the raw bytes
//! of drained images. All human-facing output for those commands therefore
//! goes to stderr; only `config` and `completions` print to stdout.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use thiserror::Error;

use camera_drain::core::config::Config;
use camera_drain::daemon::loop_main::DrainDaemon;
use camera_drain::daemon::signals::SignalHandler;
use camera_drain::logger::activity::{ActivityLogger, ActivityLoggerHandle, EchoMode};
use camera_drain::logger::jsonl::JsonlConfig;
use camera_drain::scanner::drain::DrainExecutor;
use camera_drain::scanner::walker::TreeScanner;

/// camdrain — streams image files from a watched directory and deletes them
/// after emission.
#[derive(Debug, Parser)]
#[command(
    name = "camdrain",
    author,
    version,
    about = "Camera image drain - streams and removes captured image files",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Quiet mode (errors only on stderr).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Verbose mode (include per-pass summaries on stderr).
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Run the drain daemon until terminated.
    Run(RunArgs),
    /// Run a single scan pass, then exit.
    Scan(ScanArgs),
    /// View configuration state.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// Directory tree to drain (overrides the configured root).
    #[arg(value_name = "ROOT")]
    root: Option<PathBuf>,
    /// Override the inter-pass poll interval in milliseconds.
    #[arg(long, value_name = "MS")]
    poll_ms: Option<u64>,
    /// Override the inter-file delay in milliseconds.
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Args)]
struct ScanArgs {
    /// Directory tree to drain (overrides the configured root).
    #[arg(value_name = "ROOT")]
    root: Option<PathBuf>,
    /// Override the inter-file delay in milliseconds.
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print the config file path in effect.
    Path,
    /// Print the effective configuration as TOML.
    Show,
    /// Load and validate the configuration.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    shell: CompletionShell,
}

/// CLI failure modes with a stable exit-code contract.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) => 2,
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        Command::Run(args) => run_daemon(cli, args),
        Command::Scan(args) => run_scan(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

fn echo_mode(cli: &Cli) -> EchoMode {
    if cli.quiet {
        EchoMode::Quiet
    } else if cli.verbose {
        EchoMode::Verbose
    } else {
        EchoMode::Normal
    }
}

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    Config::load(cli.config.as_deref()).map_err(|e| CliError::Runtime(e.to_string()))
}

fn jsonl_config(config: &Config) -> JsonlConfig {
    JsonlConfig {
        path: config.paths.jsonl_log.clone(),
        fallback_path: config.paths.jsonl_fallback.clone(),
        max_size_bytes: config.log.max_size_bytes,
        max_rotated_files: config.log.max_rotated_files,
        fsync_interval_secs: config.log.fsync_interval_secs,
    }
}

fn run_daemon(cli: &Cli, args: &RunArgs) -> Result<(), CliError> {
    let mut config = load_config(cli)?;
    if let Some(root) = &args.root {
        config.watch.root_path = camera_drain::core::paths::resolve_absolute_path(root);
    }
    if let Some(poll_ms) = args.poll_ms {
        config.poll.interval_ms = poll_ms;
    }
    if let Some(delay_ms) = args.delay_ms {
        config.watch.item_delay_ms = delay_ms;
    }
    config
        .require_root()
        .map_err(|e| CliError::User(e.to_string()))?;

    let logger = ActivityLoggerHandle::new(ActivityLogger::open(
        jsonl_config(&config),
        echo_mode(cli),
    ));
    let signals = SignalHandler::new();

    let mut daemon = DrainDaemon::new(&config, io::stdout(), logger, signals);
    daemon.run().map_err(|e| CliError::Runtime(e.to_string()))
}

fn run_scan(cli: &Cli, args: &ScanArgs) -> Result<(), CliError> {
    let mut config = load_config(cli)?;
    if let Some(root) = &args.root {
        config.watch.root_path = camera_drain::core::paths::resolve_absolute_path(root);
    }
    if let Some(delay_ms) = args.delay_ms {
        config.watch.item_delay_ms = delay_ms;
    }
    let root = config
        .require_root()
        .map_err(|e| CliError::User(e.to_string()))?;

    let logger = ActivityLoggerHandle::new(ActivityLogger::open(
        jsonl_config(&config),
        echo_mode(cli),
    ));

    let scanner = TreeScanner::new(
        root,
        Duration::from_millis(config.watch.item_delay_ms),
    )
    .with_logger(logger.clone());
    let stdout = io::stdout();
    let mut exec = DrainExecutor::new(stdout.lock());

    let result = scanner.run_pass(&mut exec);
    logger.flush();
    match result {
        Ok(summary) => {
            if !cli.quiet {
                eprintln!(
                    "[camdrain] scan complete: {} files, {} bytes",
                    summary.files_drained, summary.bytes_emitted
                );
            }
            Ok(())
        }
        // A one-shot scan has no next pass to retry on; surface the failure.
        Err(e) => Err(CliError::Runtime(e.to_string())),
    }
}

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            println!("{}", path.display());
            if !path.exists() {
                println!("  (file does not exist; defaults will be used)");
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = load_config(cli)?;
            let toml_str = toml::to_string_pretty(&config)
                .map_err(|e| CliError::Runtime(format!("serialize config: {e}")))?;
            println!("{toml_str}");
            Ok(())
        }
        Some(ConfigCommand::Validate) => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                let hash = config
                    .stable_hash()
                    .map_err(|e| CliError::Runtime(e.to_string()))?;
                println!("Configuration is valid.");
                println!("  Source: {}", config.paths.config_file.display());
                println!("  Hash: {hash}");
                Ok(())
            }
            Err(e) => {
                eprintln!("Configuration is INVALID: {e}");
                Err(CliError::User(format!("invalid config: {e}")))
            }
        },
    }
}
