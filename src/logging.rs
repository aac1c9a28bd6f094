use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "GRADEBOOK_LOG";
pub const DEFAULT_LOG_FILE: &str = "gradebook.log";

/// `--log` wins over `GRADEBOOK_LOG`, which wins over the default file.
pub fn resolve_log_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os(LOG_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
}

fn subscriber(file: File, filter: EnvFilter) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .finish()
}

/// Installs the process-wide subscriber appending to `path`. Level comes
/// from `RUST_LOG`, `info` when unset.
pub fn init(path: &Path) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing::subscriber::set_global_default(subscriber(file, filter))
        .context("failed to install the log subscriber")?;
    Ok(())
}
