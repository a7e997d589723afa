//! File logging for quickrec.
//!
//! Logs go to a daily-rotated file under the XDG state directory and never to the
//! terminal, which belongs to the waveform TUI while recording.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_appender::rolling;
use tracing_subscriber::prelude::*;

/// Prefix of every log file; the appender adds `.YYYY-MM-DD`.
pub const LOG_FILE_PREFIX: &str = "quickrec.log";

/// Days of logs kept on disk.
const KEEP_LOG_FILES: usize = 7;

/// Keeps the background writer alive until exit.
static WRITER_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` selects the level; the default is `info`.
///
/// # Errors
/// - If the log directory cannot be determined or created
/// - If logging was already initialized
pub fn init_logging() -> Result<(), anyhow::Error> {
    let dir = log_dir()?;

    if let Err(e) = prune_old_logs(&dir, KEEP_LOG_FILES) {
        eprintln!("Warning: could not prune old logs: {e}");
    }

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(&dir, LOG_FILE_PREFIX));
    WRITER_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("Logging already initialized"))?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false),
        )
        .init();

    tracing::debug!("Logging to {}", dir.display());
    Ok(())
}

/// `$XDG_STATE_HOME/quickrec`, or `~/.local/state/quickrec`. Created if missing.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the directory cannot be created
pub fn log_dir() -> Result<PathBuf, anyhow::Error> {
    let dir = match std::env::var_os("XDG_STATE_HOME") {
        Some(state) if !state.is_empty() => PathBuf::from(state).join("quickrec"),
        _ => dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
            .join(".local/state/quickrec"),
    };
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Rotated log files in `dir`, newest first.
pub fn rotated_logs(dir: &Path) -> Result<Vec<PathBuf>, anyhow::Error> {
    let dated_prefix = format!("{LOG_FILE_PREFIX}.");
    let mut logs: Vec<(PathBuf, std::time::SystemTime)> = fs::read_dir(dir)?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let name = path.file_name()?.to_str()?;
            if !name.starts_with(&dated_prefix) {
                return None;
            }
            let modified = fs::metadata(&path).ok()?.modified().ok()?;
            Some((path, modified))
        })
        .collect();

    logs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
    Ok(logs.into_iter().map(|(path, _)| path).collect())
}

/// Deletes all but the `keep` newest log files.
fn prune_old_logs(dir: &Path, keep: usize) -> Result<(), anyhow::Error> {
    for stale in rotated_logs(dir)?.into_iter().skip(keep) {
        if let Err(e) = fs::remove_file(&stale) {
            tracing::warn!("Failed to delete old log file {}: {}", stale.display(), e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_keeps_newest_logs() {
        let dir = tempfile::tempdir().unwrap();
        for day in 1..=9 {
            fs::write(dir.path().join(format!("quickrec.log.2026-01-0{day}")), "x").unwrap();
        }
        fs::write(dir.path().join("unrelated.txt"), "x").unwrap();

        prune_old_logs(dir.path(), 7).unwrap();

        let remaining = rotated_logs(dir.path()).unwrap();
        assert_eq!(remaining.len(), 7);
        assert!(dir.path().join("unrelated.txt").exists());
    }

    #[test]
    fn test_rotated_logs_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("quickrec.log.2026-03-01"), "a").unwrap();
        fs::write(dir.path().join("notes.log"), "b").unwrap();

        let logs = rotated_logs(dir.path()).unwrap();
        assert_eq!(logs, vec![dir.path().join("quickrec.log.2026-03-01")]);
    }
}
