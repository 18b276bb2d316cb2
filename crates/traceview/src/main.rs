mod config;
mod sessions;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use traceview_logging::{init_file_tracing, init_tracing, LogFormat};
use traceview_sessions::SessionStore;

use crate::config::ViewerConfig;
use crate::sessions::{handle_sessions_command, SessionsAction};

#[derive(Parser, Debug)]
#[command(
    name = "traceview",
    about = "Reconstruct and inspect agent session traces",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    action: SessionsAction,

    /// Projects directory (default: ~/.claude/projects)
    #[arg(long, global = true)]
    projects_dir: Option<PathBuf>,

    /// Config file (default: <config dir>/traceview/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level filter, overridden by RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormatChoice>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(ViewerConfig::default_path);
    let config = match config_path {
        Some(path) => ViewerConfig::load(&path)?.unwrap_or_default(),
        None => ViewerConfig::default(),
    };

    let log_format = match cli.log_format {
        Some(choice) => choice.into(),
        None => config
            .log_format(None)
            .map(str::parse::<LogFormat>)
            .transpose()
            .map_err(anyhow::Error::msg)?
            .unwrap_or_default(),
    };
    let log_level = config.log_level(cli.log_level.as_deref());

    // Held until exit so buffered file logs are flushed
    let _guard = match &config.log_dir {
        Some(dir) => Some(
            init_file_tracing(log_level, log_format, dir)
                .with_context(|| format!("Failed to open log directory {}", dir.display()))?,
        ),
        None => {
            init_tracing(log_level, log_format);
            None
        }
    };

    let store = match config.projects_dir(cli.projects_dir.as_deref()) {
        Some(dir) => SessionStore::with_dir(dir),
        None => SessionStore::new()?,
    };
    tracing::debug!(projects_dir = %store.projects_dir().display(), "Using projects directory");

    handle_sessions_command(&store, cli.action)
}
