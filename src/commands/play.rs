//! Playback with a waveform preview. Space pauses, the arrow keys skip five seconds.

use crate::config::{data_dir, RecorderConfig};
use crate::history::{Recording, RecordingStore};
use crate::playback::{Playback, PlaybackTui};
use crate::waveform::{read_duration, FileWaveform};
use anyhow::{anyhow, Context};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// What `quickrec play` was pointed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayTarget {
    /// 1-based, newest first
    Index(usize),
    File(PathBuf),
}

impl PlayTarget {
    /// A bare number is an index into the recordings list; anything else is a path.
    pub fn parse(arg: Option<&str>) -> Self {
        match arg {
            None => PlayTarget::Index(1),
            Some(arg) => match arg.parse::<usize>() {
                Ok(index) => PlayTarget::Index(index),
                Err(_) => PlayTarget::File(PathBuf::from(arg)),
            },
        }
    }
}

/// Plays a saved recording, or any supported audio file, with a progress waveform.
pub async fn handle_play(target: Option<String>) -> Result<(), anyhow::Error> {
    tracing::info!("=== quickrec Play ===");
    let config = RecorderConfig::load()?;

    let recording = match PlayTarget::parse(target.as_deref()) {
        PlayTarget::Index(index) => {
            let mut store = RecordingStore::new(&data_dir()?);
            let count = store.list()?.len();
            if count == 0 {
                return Err(anyhow!("No recordings found"));
            }
            store.nth_newest(index)?.ok_or_else(|| {
                anyhow!("Recording index out of range. Available recordings: 1-{count}")
            })?
        }
        PlayTarget::File(path) => {
            tokio::task::spawn_blocking(move || external_recording(&path)).await??
        }
    };

    play_recording(&config, &recording)
}

/// Describes a file outside the store so it can be played like a saved recording.
fn external_recording(path: &Path) -> anyhow::Result<Recording> {
    let duration =
        read_duration(path).with_context(|| format!("Cannot play {}", path.display()))?;
    let metadata = std::fs::metadata(path)?;
    let created_at: DateTime<Local> = metadata
        .modified()
        .map(DateTime::from)
        .unwrap_or_else(|_| Local::now());

    Ok(Recording {
        id: 0,
        file_name: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        file_path: path.to_path_buf(),
        duration,
        created_at,
        file_size: metadata.len(),
    })
}

/// Plays `recording` while showing its waveform with the played part highlighted.
pub(crate) fn play_recording(config: &RecorderConfig, recording: &Recording) -> anyhow::Result<()> {
    tracing::info!(
        "Playing {} ({:.1}s)",
        recording.file_name,
        recording.duration.as_secs_f32()
    );
    let mut playback = Playback::start(&recording.file_path, recording.duration)?;

    let waveform = FileWaveform::new(config.waveform.clone(), config.preview.target_sample_count)
        .with_progress_color(config.preview.progress_color);
    let mut tui = PlaybackTui::new(waveform, recording)?;
    let stopped_early = tui.run(recording, &mut playback)?;
    tui.cleanup()?;

    if stopped_early {
        tracing::info!("Playback of {} stopped by user", recording.file_name);
    } else {
        tracing::info!("Playback of {} finished", recording.file_name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_target_parsing() {
        assert_eq!(PlayTarget::parse(None), PlayTarget::Index(1));
        assert_eq!(PlayTarget::parse(Some("3")), PlayTarget::Index(3));
        assert_eq!(
            PlayTarget::parse(Some("take.wav")),
            PlayTarget::File(PathBuf::from("take.wav"))
        );
    }

    #[test]
    fn test_external_wav_is_described() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.wav");
        crate::recording::audio::save_wav(&[0i16; 8_000], 8_000, &path).unwrap();

        let recording = external_recording(&path).unwrap();
        assert_eq!(recording.file_name, "memo.wav");
        assert_eq!(recording.duration.as_millis(), 1_000);
        assert!(recording.file_size > 16_000);
    }

    #[test]
    fn test_missing_file_cannot_be_described() {
        let dir = tempfile::tempdir().unwrap();
        assert!(external_recording(&dir.path().join("nope.wav")).is_err());
    }
}
