use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Where log lines go.
#[derive(Debug, Clone)]
pub enum LogTarget {
    Stderr,
    /// Append to a file. Used while the terminal is in raw mode.
    File(PathBuf),
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `default_level`. Calling this twice keeps the first
/// subscriber.
pub fn init_tracing(default_level: &str, target: LogTarget) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_timer(UtcTime::rfc_3339());

    match target {
        LogTarget::Stderr => {
            let _ = builder.with_writer(io::stderr).try_init();
        }
        LogTarget::File(path) => {
            if let Some(dir) = path.parent() {
                if !dir.as_os_str().is_empty() {
                    fs::create_dir_all(dir)?;
                }
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            let _ = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
    }
    Ok(())
}
