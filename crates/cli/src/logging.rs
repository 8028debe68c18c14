//! Tracing subscriber setup.
//!
//! `RUST_LOG` selects the filter (default `info`). The TUI owns the terminal,
//! so its logs go to a file; every other command logs to stderr.

use color_eyre::Result;
use pl_core::config::PROJECT_DIR;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE: &str = "promptline.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Log to stderr.
pub fn init_stderr() {
    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

/// Log to `.promptline/promptline.log` under `root`, or to the temp dir
/// when the project has not been initialized. Returns the log path.
pub fn init_file(root: &Path) -> Result<PathBuf> {
    let path = log_path(root);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .try_init();
    Ok(path)
}

fn log_path(root: &Path) -> PathBuf {
    let project_dir = root.join(PROJECT_DIR);
    if project_dir.is_dir() {
        project_dir.join(LOG_FILE)
    } else {
        std::env::temp_dir().join(LOG_FILE)
    }
}
