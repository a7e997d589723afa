//! Prints the tail of the newest log file.

use crate::logging::{log_dir, rotated_logs};
use std::fs;

/// Lines shown when no count is given.
pub const DEFAULT_LINES: usize = 50;

/// Shows the last `lines` lines of the most recent log file.
///
/// # Errors
/// - If the log directory cannot be determined or read
pub fn handle_logs(lines: Option<usize>) -> Result<(), anyhow::Error> {
    let dir = log_dir()?;
    let Some(log_file) = rotated_logs(&dir)?.into_iter().next() else {
        println!("No log files found in: {}", dir.display());
        println!("Run 'quickrec' or other commands to generate logs.");
        return Ok(());
    };

    let content = fs::read_to_string(&log_file)
        .map_err(|e| anyhow::anyhow!("Failed to read log file: {e}"))?;
    if content.is_empty() {
        println!("Log file is empty: {}", log_file.display());
        return Ok(());
    }

    let all: Vec<&str> = content.lines().collect();
    let shown = tail(&all, lines.unwrap_or(DEFAULT_LINES));
    if shown.len() < all.len() {
        println!("Showing last {} of {} lines:", shown.len(), all.len());
    } else {
        println!("Showing all {} lines:", all.len());
    }
    println!("Full log file at: {}", log_file.display());
    println!();
    for line in shown {
        println!("{line}");
    }
    Ok(())
}

fn tail<'a>(lines: &'a [&'a str], count: usize) -> &'a [&'a str] {
    &lines[lines.len().saturating_sub(count)..]
}
