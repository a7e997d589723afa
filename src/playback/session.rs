//! One playback, on whichever backend could be started.

use super::output::DeviceOutput;
use super::player::{playback_progress, ExternalPlayer};
use anyhow::{anyhow, Result};
use std::path::Path;
use std::time::Duration;

/// Distance a single skip moves the playback position.
pub const SKIP_STEP: Duration = Duration::from_secs(5);

enum Backend {
    Device(DeviceOutput),
    External(ExternalPlayer),
}

/// A running playback.
///
/// Plays on the default output device when it can, which allows pause and seek.
/// Otherwise an external player takes over and only stopping is possible.
pub struct Playback {
    backend: Backend,
}

impl Playback {
    /// Starts playing `path`. `duration` is only used by the external fallback.
    ///
    /// # Errors
    /// - If the file does not exist
    /// - If neither the output device nor any external player can play it
    pub fn start(path: &Path, duration: Duration) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow!("Audio file not found: {}", path.display()));
        }

        let backend = match DeviceOutput::open(path) {
            Ok(output) => {
                tracing::info!("Playing {} on {}", path.display(), output.device_name());
                Backend::Device(output)
            }
            Err(e) => {
                tracing::warn!("In-process playback unavailable ({e:#}); trying system players");
                Backend::External(ExternalPlayer::start(path, duration)?)
            }
        };
        Ok(Self { backend })
    }

    /// Where the audio is going: an output device or a player program.
    pub fn backend_name(&self) -> &str {
        match &self.backend {
            Backend::Device(output) => output.device_name(),
            Backend::External(player) => player.player().program,
        }
    }

    /// Whether pause and seek are available.
    pub fn can_control(&self) -> bool {
        matches!(self.backend, Backend::Device(_))
    }

    pub fn elapsed(&self) -> Duration {
        match &self.backend {
            Backend::Device(output) => output.cursor().elapsed(),
            Backend::External(player) => player.elapsed(),
        }
    }

    pub fn duration(&self) -> Duration {
        match &self.backend {
            Backend::Device(output) => output.cursor().duration(),
            Backend::External(player) => player.duration(),
        }
    }

    pub fn progress(&self) -> f32 {
        playback_progress(self.elapsed(), self.duration())
    }

    pub fn is_paused(&self) -> bool {
        match &self.backend {
            Backend::Device(output) => output.cursor().is_paused(),
            Backend::External(_) => false,
        }
    }

    pub fn is_finished(&mut self) -> bool {
        match &mut self.backend {
            Backend::Device(output) => output.cursor().is_finished(),
            Backend::External(player) => player.is_finished(),
        }
    }

    pub fn toggle_pause(&mut self) {
        match &self.backend {
            Backend::Device(output) => {
                let paused = output.toggle_pause();
                tracing::debug!("Playback {}", if paused { "paused" } else { "resumed" });
            }
            Backend::External(player) => {
                tracing::debug!("{} cannot be paused", player.player().program);
            }
        }
    }

    /// Moves the position [`SKIP_STEP`] forward or, with `forward == false`, backward.
    pub fn skip(&mut self, forward: bool) {
        let seconds = SKIP_STEP.as_secs_f64();
        match &self.backend {
            Backend::Device(output) => {
                output.seek_by(if forward { seconds } else { -seconds });
                tracing::debug!("Seeked to {:.1}s", output.cursor().elapsed().as_secs_f32());
            }
            Backend::External(player) => {
                tracing::debug!("{} cannot seek", player.player().program);
            }
        }
    }

    /// Silences playback. A device stream closes when the playback is dropped.
    pub fn stop(&mut self) {
        match &mut self.backend {
            Backend::Device(output) => {
                if !output.cursor().is_paused() {
                    output.toggle_pause();
                }
            }
            Backend::External(player) => player.stop(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = Playback::start(&dir.path().join("gone.wav"), Duration::from_secs(1));
        assert!(result.is_err());
    }
}
