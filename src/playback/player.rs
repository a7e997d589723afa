//! System audio players, used when no output device can be opened in-process.
//!
//! The file is handed to the first player found on the system and progress is
//! tracked by wall clock. These players cannot be paused or seeked.

use anyhow::{anyhow, Result};
use std::io;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// A player binary and the arguments that make it play once without a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerProgram {
    pub program: &'static str,
    pub args: &'static [&'static str],
    /// Whether the process lives exactly as long as playback does
    pub blocks_until_done: bool,
}

impl PlayerProgram {
    const fn new(program: &'static str, args: &'static [&'static str]) -> Self {
        Self {
            program,
            args,
            blocks_until_done: true,
        }
    }

    const fn detached(program: &'static str) -> Self {
        Self {
            program,
            args: &[],
            blocks_until_done: false,
        }
    }
}

/// Players to try, in order.
#[cfg(target_os = "macos")]
pub const PLAYERS: &[PlayerProgram] = &[
    PlayerProgram::new("afplay", &[]),
    PlayerProgram::new("ffplay", &["-nodisp", "-autoexit", "-loglevel", "quiet"]),
    PlayerProgram::detached("open"),
];

/// Players to try, in order.
#[cfg(not(target_os = "macos"))]
pub const PLAYERS: &[PlayerProgram] = &[
    PlayerProgram::new("mpv", &["--no-video", "--really-quiet"]),
    PlayerProgram::new("ffplay", &["-nodisp", "-autoexit", "-loglevel", "quiet"]),
    PlayerProgram::new("paplay", &[]),
    PlayerProgram::new("aplay", &["-q"]),
    PlayerProgram::new("vlc", &["--intf", "dummy", "--play-and-exit"]),
    PlayerProgram::detached("xdg-open"),
];

/// Fraction of `duration` covered after `elapsed`, in `[0, 1]`.
pub fn playback_progress(elapsed: Duration, duration: Duration) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0)
}

/// A file playing in an external player process.
pub struct ExternalPlayer {
    child: Child,
    player: PlayerProgram,
    started: Instant,
    duration: Duration,
}

impl ExternalPlayer {
    /// Starts playing `path` with the first available player from [`PLAYERS`].
    ///
    /// # Errors
    /// - If the file does not exist
    /// - If none of the players can be started
    pub fn start(path: &Path, duration: Duration) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow!("Audio file not found: {}", path.display()));
        }

        for player in PLAYERS {
            match Command::new(player.program)
                .args(player.args)
                .arg(path)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
            {
                Ok(child) => {
                    tracing::info!("Playing {} with {}", path.display(), player.program);
                    return Ok(Self {
                        child,
                        player: *player,
                        started: Instant::now(),
                        duration,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    tracing::debug!("Player {} not installed", player.program);
                }
                Err(e) => {
                    tracing::warn!("Failed to start {}: {}", player.program, e);
                }
            }
        }

        let names: Vec<&str> = PLAYERS.iter().map(|p| p.program).collect();
        Err(anyhow!("No audio player found. Install one of: {}", names.join(", ")))
    }

    pub fn player(&self) -> &PlayerProgram {
        &self.player
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed().min(self.duration)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Whether playback has ended.
    ///
    /// Detached players hand the file to another process, so only the clock counts
    /// for them.
    pub fn is_finished(&mut self) -> bool {
        if self.player.blocks_until_done {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    tracing::debug!("{} exited with {}", self.player.program, status);
                    true
                }
                Ok(None) => false,
                Err(e) => {
                    tracing::warn!("Lost track of {}: {}", self.player.program, e);
                    true
                }
            }
        } else {
            self.started.elapsed() >= self.duration
        }
    }

    /// Stops the player if it is still running.
    pub fn stop(&mut self) {
        if !self.player.blocks_until_done {
            return;
        }
        if let Ok(None) = self.child.try_wait() {
            if let Err(e) = self.child.kill() {
                tracing::warn!("Failed to stop {}: {}", self.player.program, e);
            }
            let _ = self.child.wait();
            tracing::debug!("Playback stopped");
        }
    }
}

impl Drop for ExternalPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_clamped() {
        let duration = Duration::from_secs(4);
        assert_eq!(playback_progress(Duration::ZERO, duration), 0.0);
        assert_eq!(playback_progress(Duration::from_secs(1), duration), 0.25);
        assert_eq!(playback_progress(Duration::from_secs(9), duration), 1.0);
        assert_eq!(playback_progress(Duration::from_secs(1), Duration::ZERO), 1.0);
    }

    #[test]
    fn test_missing_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = ExternalPlayer::start(&dir.path().join("gone.wav"), Duration::from_secs(1));
        assert!(result.is_err());
    }

    #[test]
    fn test_detached_player_is_last_resort() {
        let last = PLAYERS.last().unwrap();
        assert!(!last.blocks_until_done);
        assert!(PLAYERS[..PLAYERS.len() - 1]
            .iter()
            .all(|player| player.blocks_until_done));
    }
}
