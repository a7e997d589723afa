//! In-process playback through the default output device.
//!
//! The file is decoded to mono PCM up front. The output callback reads it through a
//! shared [`PlaybackCursor`], so pausing and seeking only move the cursor and the
//! reported position always matches what the device was last handed.

use crate::recording::audio::suppress_alsa_warnings;
use crate::waveform::{FileDecoder, PcmDecoder};
use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Read position into decoded PCM, in source frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackCursor {
    position: f64,
    total_frames: usize,
    sample_rate: u32,
    paused: bool,
}

impl PlaybackCursor {
    pub fn new(total_frames: usize, sample_rate: u32) -> Self {
        Self {
            position: 0.0,
            total_frames,
            sample_rate,
            paused: false,
        }
    }

    /// Source frame to play next, advancing by `step` source frames.
    ///
    /// Returns `None` while paused or once the end is reached.
    pub fn next_frame(&mut self, step: f64) -> Option<usize> {
        if self.paused || self.is_finished() {
            return None;
        }
        let index = self.position as usize;
        self.position += step;
        Some(index)
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.total_frames as f64
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Flips the pause state and returns the new one.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Moves the position by `seconds`, clamped to the start and end of the file.
    pub fn seek_by(&mut self, seconds: f64) {
        let target = self.position + seconds * self.sample_rate as f64;
        self.position = target.clamp(0.0, self.total_frames as f64);
    }

    pub fn elapsed(&self) -> Duration {
        self.frames_to_duration(self.position.min(self.total_frames as f64))
    }

    pub fn duration(&self) -> Duration {
        self.frames_to_duration(self.total_frames as f64)
    }

    fn frames_to_duration(&self, frames: f64) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(frames / self.sample_rate as f64)
    }
}

/// Fills interleaved output frames from `samples`, duplicating mono to every channel.
///
/// Frames past the end, or while paused, are silent.
pub(crate) fn fill_frames<T>(
    data: &mut [T],
    channels: usize,
    samples: &[i16],
    cursor: &mut PlaybackCursor,
    step: f64,
) where
    T: Sample + FromSample<i16>,
{
    for frame in data.chunks_mut(channels.max(1)) {
        let value = cursor
            .next_frame(step)
            .and_then(|index| samples.get(index))
            .map(|&sample| sample.to_sample::<T>())
            .unwrap_or(T::EQUILIBRIUM);
        frame.fill(value);
    }
}

/// A file playing on the default output device.
pub struct DeviceOutput {
    /// Kept alive while playing
    _stream: cpal::Stream,
    cursor: Arc<Mutex<PlaybackCursor>>,
    device_name: String,
}

impl DeviceOutput {
    /// Decodes `path` and starts playing it.
    ///
    /// # Errors
    /// - If the file cannot be decoded or holds no audio
    /// - If there is no output device or its stream cannot be started
    pub fn open(path: &Path) -> Result<Self> {
        let pcm = FileDecoder.decode(path, &CancellationToken::new())?;
        if pcm.samples.is_empty() || pcm.sample_rate == 0 {
            return Err(anyhow!("No audio in {}", path.display()));
        }

        let device = suppress_alsa_warnings(|| {
            cpal::default_host()
                .default_output_device()
                .ok_or_else(|| anyhow!("No audio output device available"))
        })?;
        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());

        let device_config = device.default_output_config()?;
        let device_rate = device_config.sample_rate().0;
        let channels = device_config.channels() as usize;
        let sample_format = device_config.sample_format();
        tracing::debug!(
            "Output device {}: {}Hz, {} channels, {:?} (file at {}Hz)",
            device_name,
            device_rate,
            channels,
            sample_format,
            pcm.sample_rate
        );

        let step = pcm.sample_rate as f64 / device_rate.max(1) as f64;
        let cursor = Arc::new(Mutex::new(PlaybackCursor::new(
            pcm.samples.len(),
            pcm.sample_rate,
        )));
        let samples: Arc<[i16]> = pcm.samples.into();

        let config: cpal::StreamConfig = device_config.into();
        let stream = match sample_format {
            SampleFormat::I16 => {
                build_stream::<i16>(&device, &config, channels, samples, &cursor, step)?
            }
            SampleFormat::U16 => {
                build_stream::<u16>(&device, &config, channels, samples, &cursor, step)?
            }
            SampleFormat::F32 => {
                build_stream::<f32>(&device, &config, channels, samples, &cursor, step)?
            }
            other => return Err(anyhow!("Unsupported output sample format: {other:?}")),
        };
        stream.play()?;

        Ok(Self {
            _stream: stream,
            cursor,
            device_name,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Snapshot of the shared cursor.
    pub fn cursor(&self) -> PlaybackCursor {
        *self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn toggle_pause(&self) -> bool {
        self.cursor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .toggle_pause()
    }

    pub fn seek_by(&self, seconds: f64) {
        self.cursor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .seek_by(seconds);
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    samples: Arc<[i16]>,
    cursor: &Arc<Mutex<PlaybackCursor>>,
    step: f64,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<i16> + Send + 'static,
{
    let cursor = Arc::clone(cursor);
    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let mut cursor = cursor.lock().unwrap_or_else(PoisonError::into_inner);
            fill_frames(data, channels, &samples, &mut cursor, step);
        },
        |err| {
            tracing::error!("Audio output error: {}", err);
        },
        None,
    )?;
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_tracks_played_frames() {
        let mut cursor = PlaybackCursor::new(8_000, 8_000);
        for _ in 0..2_000 {
            cursor.next_frame(1.0);
        }
        assert_eq!(cursor.elapsed(), Duration::from_millis(250));
        assert_eq!(cursor.duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_paused_cursor_holds_position() {
        let mut cursor = PlaybackCursor::new(100, 4);
        cursor.next_frame(1.0);
        assert!(cursor.toggle_pause());

        assert_eq!(cursor.next_frame(1.0), None);
        assert_eq!(cursor.elapsed(), Duration::from_millis(250));

        assert!(!cursor.toggle_pause());
        assert_eq!(cursor.next_frame(1.0), Some(1));
    }

    #[test]
    fn test_seek_is_clamped_to_file() {
        let mut cursor = PlaybackCursor::new(16_000 * 12, 16_000);
        cursor.seek_by(5.0);
        assert_eq!(cursor.elapsed(), Duration::from_secs(5));

        cursor.seek_by(-5.0);
        cursor.seek_by(-5.0);
        assert_eq!(cursor.elapsed(), Duration::ZERO);

        cursor.seek_by(10.0);
        cursor.seek_by(5.0);
        assert_eq!(cursor.elapsed(), Duration::from_secs(12));
        assert!(cursor.is_finished());
    }

    #[test]
    fn test_fill_duplicates_mono_and_pads_with_silence() {
        let samples = [i16::MAX, i16::MIN];
        let mut cursor = PlaybackCursor::new(samples.len(), 8_000);
        let mut out = [9.0f32; 6];

        fill_frames(&mut out, 2, &samples, &mut cursor, 1.0);

        assert!(out[0] > 0.99 && out[0] == out[1]);
        assert!(out[2] <= -0.99 && out[2] == out[3]);
        assert_eq!(&out[4..], &[0.0, 0.0]);
        assert!(cursor.is_finished());
    }

    #[test]
    fn test_fill_resamples_by_step() {
        let samples = [0i16, 100, 200, 300];
        let mut cursor = PlaybackCursor::new(samples.len(), 8);
        let mut out = [0i16; 4];

        // device at twice the file rate
        fill_frames(&mut out, 1, &samples, &mut cursor, 0.5);
        assert_eq!(out, [0, 0, 100, 100]);
        assert_eq!(cursor.elapsed(), Duration::from_millis(250));
    }
}
