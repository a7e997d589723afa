//! Deleting a saved recording from the command line.

use crate::config::data_dir;
use crate::history::{format_duration, RecordingStore};
use anyhow::anyhow;

/// Deletes recording `index` (1 = most recent) and its audio file.
pub async fn handle_delete(index: usize) -> Result<(), anyhow::Error> {
    tracing::info!("=== quickrec Delete ===");
    let mut store = RecordingStore::new(&data_dir()?);

    let recording = store
        .nth_newest(index)?
        .ok_or_else(|| anyhow!("No recording #{index}. Run 'quickrec list' to see recordings."))?;
    store.delete(recording.id)?;

    println!(
        "Deleted {} ({}, recorded {})",
        recording.file_name,
        format_duration(recording.duration),
        recording.created_at.format("%Y-%m-%d %H:%M")
    );
    Ok(())
}
