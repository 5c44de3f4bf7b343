//! `quicknote` command-line front end.
//!
//! # Responsibility
//! - Parse arguments and resolve the data directory.
//! - Bootstrap logging and storage, then hand off to `commands`.

mod commands;

use anyhow::Context;
use clap::Parser;
use commands::{Command, NoteCommand};
use quicknote_core::{init_logging, CoreConfig, KvStore, SqliteKvBackend, SystemClock};
use std::path::PathBuf;

const APP_DIR_NAME: &str = "quicknote";

#[derive(Parser, Debug)]
#[command(version, about = "Quick markdown notes kept in a local store")]
struct Cli {
    /// Directory holding the note database and logs. Overrides
    /// `QUICKNOTE_DATA_DIR`.
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error. Overrides
    /// `QUICKNOTE_LOG_LEVEL`.
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    if let Err(err) = init_logging(&config.log_level, config.log_dir()) {
        eprintln!("warning: logging disabled: {err}");
    }

    let backend = SqliteKvBackend::open(config.db_path()).with_context(|| {
        format!(
            "failed to open note store at `{}`",
            config.db_path().display()
        )
    })?;

    let mut stdout = std::io::stdout().lock();
    commands::execute(
        cli.command
            .unwrap_or(Command::Note(NoteCommand::Show { id: None })),
        KvStore::new(backend),
        SystemClock,
        &config,
        &mut stdout,
    )
}

fn resolve_config(cli: &Cli) -> anyhow::Result<CoreConfig> {
    let default_dir = dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_default();
    let mut config = CoreConfig::new(default_dir).with_env_overrides();
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }
    if let Some(level) = cli.log_level.as_deref() {
        config.log_level = level.to_string();
    }

    if config.data_dir.as_os_str().is_empty() {
        anyhow::bail!("no platform data directory; pass --data-dir");
    }
    config.data_dir = std::path::absolute(&config.data_dir).with_context(|| {
        format!("invalid data directory `{}`", config.data_dir.display())
    })?;
    Ok(config)
}
