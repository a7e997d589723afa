//! Interactive recordings browser.

use super::play::play_recording;
use crate::config::{data_dir, RecorderConfig};
use crate::history::{RecordingBrowser, RecordingStore};

/// Browses saved recordings. Playing one returns to the browser when it ends.
pub async fn handle_list() -> Result<(), anyhow::Error> {
    tracing::info!("=== quickrec List ===");
    let config = RecorderConfig::load()?;
    let mut store = RecordingStore::new(&data_dir()?);

    loop {
        let entries = store.list()?;
        if entries.is_empty() {
            println!("No recordings yet. Run 'quickrec' to record one.");
            return Ok(());
        }

        let chosen = {
            let mut browser = RecordingBrowser::new(entries)?;
            browser.run(&mut store)?
        };
        match chosen {
            Some(recording) => play_recording(&config, &recording)?,
            None => return Ok(()),
        }
    }
}
