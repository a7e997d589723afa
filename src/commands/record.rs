//! Recording with the live waveform.
//!
//! Enter saves, Escape/q discards, r starts the take over. A SIGUSR1 from outside (a hotkey daemon, say) saves
//! as if Enter had been pressed.

use crate::config::{data_dir, RecorderConfig};
use crate::history::{NewRecording, RecordingStore};
use crate::recording::{AudioRecorder, RecorderTui, RecordingCommand};
use crate::ui::show_error;
use crate::waveform::AmplitudeSource;
use chrono::Local;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Records from the configured device until the user saves or discards.
///
/// A saved recording is written to the recordings directory and indexed.
pub async fn handle_record() -> Result<(), anyhow::Error> {
    tracing::info!("=== quickrec Recorder Started ===");

    let config = match RecorderConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err:#}");
            show_error(&format!(
                "Configuration Error:\n\n{err:#}\n\nPlease check your ~/.config/quickrec/quickrec.toml file and try again."
            ))?;
            return Err(err.context("Configuration error"));
        }
    };
    tracing::info!(
        "Configuration loaded: device={}, sample_rate={}Hz, poll_interval={}ms",
        config.audio.device,
        config.audio.sample_rate,
        config.audio.poll_interval_ms
    );

    let mut store = RecordingStore::new(&data_dir()?);
    let started_at = Local::now();
    let output_path = store.new_recording_path(started_at)?;

    let mut recorder = AudioRecorder::new(config.audio.sample_rate, config.audio.device.clone());
    if let Err(e) = recorder.start() {
        tracing::error!("Failed to start recording: {e:#}");
        show_error(&format!(
            "Recording Error:\n\n{e:#}\n\nPlease check your audio configuration and try again."
        ))?;
        return Err(e);
    }
    let mut meter = recorder.meter();

    let save_signal = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, Arc::clone(&save_signal))
        .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;

    let mut tui = RecorderTui::new(config.waveform.clone())?;
    let poll_interval = config.poll_interval();
    let mut last_poll = Instant::now();

    tracing::debug!("Entering recording loop");
    let keep = loop {
        if save_signal.load(Ordering::Relaxed) {
            tracing::info!("Received SIGUSR1: saving recording");
            break true;
        }

        let wait = poll_interval.saturating_sub(last_poll.elapsed());
        match tui.handle_input(wait)? {
            RecordingCommand::Continue => {}
            RecordingCommand::Save => break true,
            RecordingCommand::Discard => break false,
            RecordingCommand::TogglePause => recorder.toggle_pause(),
            RecordingCommand::Restart => {
                recorder.restart();
                meter.poll();
                tui.restart();
            }
        }

        if last_poll.elapsed() >= poll_interval {
            tui.sample(&mut meter);
            last_poll = Instant::now();
        }
        tui.render(recorder.elapsed())?;
    };
    tui.cleanup()?;

    if !keep {
        recorder.discard();
        tracing::info!("=== quickrec Recorder Exited (discarded) ===");
        return Ok(());
    }

    match recorder.stop_and_save(&output_path)? {
        Some(saved) => {
            let id = store.insert(&NewRecording {
                file_path: saved.path.clone(),
                duration: saved.duration,
                created_at: started_at,
                file_size: saved.file_size,
            })?;
            println!("Saved recording #{id}: {}", saved.path.display());
        }
        None => println!("Nothing was recorded."),
    }

    tracing::info!("=== quickrec Recorder Exited Successfully ===");
    Ok(())
}
