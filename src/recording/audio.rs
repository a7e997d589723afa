//! Microphone capture.
//!
//! Audio is captured from the configured input device at its native rate, mixed down
//! to mono 16-bit PCM in memory and written to a WAV file when the user saves. Every
//! captured buffer also feeds a [`PeakMeter`] that drives the live waveform.

use super::meter::PeakMeter;
use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample};
use hound::WavWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// A recording written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedAudio {
    pub path: PathBuf,
    pub duration: Duration,
    pub file_size: u64,
}

/// Records mono PCM from an input device.
///
/// Pausing keeps the stream open but drops incoming buffers, so the saved file and
/// [`AudioRecorder::elapsed`] only cover the unpaused time.
pub struct AudioRecorder {
    /// Requested rate until the device is opened, then the device rate
    sample_rate: u32,
    samples: Arc<Mutex<Vec<i16>>>,
    /// Kept alive while recording
    stream: Option<cpal::Stream>,
    is_paused: Arc<AtomicBool>,
    /// `"default"`, an index or a device name
    device_name: String,
    meter: PeakMeter,
}

impl AudioRecorder {
    /// Creates a recorder. Nothing is opened until [`AudioRecorder::start`].
    ///
    /// The device may not support `requested_sample_rate`; the device rate wins and
    /// [`AudioRecorder::sample_rate`] reports it once recording has started.
    pub fn new(requested_sample_rate: u32, device_name: String) -> Self {
        Self {
            sample_rate: requested_sample_rate,
            samples: Arc::new(Mutex::new(Vec::new())),
            stream: None,
            is_paused: Arc::new(AtomicBool::new(false)),
            device_name,
            meter: PeakMeter::new(),
        }
    }

    /// Opens the input device and starts capturing.
    ///
    /// # Errors
    /// - If the configured device is not available
    /// - If the device reports an unsupported sample format
    /// - If the input stream cannot be built or started
    pub fn start(&mut self) -> Result<()> {
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();
            if self.device_name == "default" {
                host.default_input_device()
                    .ok_or_else(|| anyhow!("No audio input device available"))
            } else {
                find_device_by_name(&host, &self.device_name)
            }
        })?;

        let name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Recording device: {}", name);

        let device_config = device.default_input_config()?;
        let device_sample_rate = device_config.sample_rate().0;
        let channels = device_config.channels() as usize;
        let sample_format = device_config.sample_format();

        if device_sample_rate != self.sample_rate {
            tracing::warn!(
                "Requested sample rate {}Hz but device uses {}Hz. Recording at device rate.",
                self.sample_rate,
                device_sample_rate
            );
        }
        tracing::debug!(
            "Device configuration: {}Hz, {} channels, {:?}",
            device_sample_rate,
            channels,
            sample_format
        );
        self.sample_rate = device_sample_rate;

        let config: cpal::StreamConfig = device_config.into();
        let stream = match sample_format {
            SampleFormat::I16 => self.build_stream::<i16>(&device, &config, channels)?,
            SampleFormat::U16 => self.build_stream::<u16>(&device, &config, channels)?,
            SampleFormat::F32 => self.build_stream::<f32>(&device, &config, channels)?,
            other => return Err(anyhow!("Unsupported input sample format: {other:?}")),
        };

        stream.play()?;
        self.stream = Some(stream);
        tracing::debug!("Audio stream started");
        Ok(())
    }

    fn build_stream<T>(
        &self,
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        channels: usize,
    ) -> Result<cpal::Stream>
    where
        T: SizedSample + Send + 'static,
        i16: FromSample<T>,
    {
        let samples = Arc::clone(&self.samples);
        let is_paused = Arc::clone(&self.is_paused);
        let meter = self.meter.clone();

        let stream = device.build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                if is_paused.load(Ordering::Relaxed) {
                    return;
                }
                let pcm: Vec<i16> = data.iter().map(|&s| s.to_sample::<i16>()).collect();
                let mono = mix_to_mono(&pcm, channels);
                meter.record(&mono);
                if let Ok(mut samples) = samples.lock() {
                    samples.extend_from_slice(&mono);
                }
            },
            |err| {
                tracing::error!("Audio stream error: {}", err);
            },
            None,
        )?;
        Ok(stream)
    }

    /// Handle the live waveform polls for peaks.
    pub fn meter(&self) -> PeakMeter {
        self.meter.clone()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn sample_count(&self) -> usize {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Recorded length, excluding paused time.
    pub fn elapsed(&self) -> Duration {
        samples_duration(self.sample_count(), self.sample_rate)
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused.load(Ordering::Relaxed)
    }

    pub fn pause(&self) {
        self.is_paused.store(true, Ordering::Relaxed);
        tracing::debug!("Recording paused");
    }

    pub fn resume(&self) {
        self.is_paused.store(false, Ordering::Relaxed);
        tracing::debug!("Recording resumed");
    }

    pub fn toggle_pause(&self) {
        if self.is_paused() {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Stops capturing and writes everything recorded so far to `path`.
    ///
    /// Returns `None` when nothing was captured; no file is written then.
    ///
    /// # Errors
    /// - If the WAV file cannot be written
    pub fn stop_and_save(&mut self, path: &Path) -> Result<Option<SavedAudio>> {
        self.stream = None;
        let samples = std::mem::take(&mut *self.samples.lock().unwrap_or_else(PoisonError::into_inner));

        if samples.is_empty() {
            tracing::warn!("Recording stopped with no samples captured");
            return Ok(None);
        }

        let duration = samples_duration(samples.len(), self.sample_rate);
        tracing::info!(
            "Recording stopped: {:.2}s ({} samples at {}Hz)",
            duration.as_secs_f32(),
            samples.len(),
            self.sample_rate
        );

        save_wav(&samples, self.sample_rate, path)?;
        let file_size = std::fs::metadata(path)?.len();
        tracing::info!("Audio saved: {} ({} bytes)", path.display(), file_size);

        Ok(Some(SavedAudio {
            path: path.to_path_buf(),
            duration,
            file_size,
        }))
    }

    /// Drops everything captured so far and keeps recording.
    pub fn restart(&self) {
        let dropped = std::mem::take(&mut *self.samples.lock().unwrap_or_else(PoisonError::into_inner));
        tracing::info!("Recording restarted ({} samples dropped)", dropped.len());
    }

    /// Stops capturing and throws the recording away.
    pub fn discard(&mut self) {
        self.stream = None;
        let dropped = std::mem::take(&mut *self.samples.lock().unwrap_or_else(PoisonError::into_inner));
        tracing::info!("Recording discarded ({} samples)", dropped.len());
    }
}

fn samples_duration(count: usize, sample_rate: u32) -> Duration {
    if sample_rate == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(count as f64 / sample_rate as f64)
}

/// Averages interleaved frames of `channels` samples into one mono sample each.
///
/// A trailing partial frame is dropped.
pub fn mix_to_mono(data: &[i16], channels: usize) -> Vec<i16> {
    match channels {
        0 | 1 => data.to_vec(),
        _ => data
            .chunks_exact(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect(),
    }
}

/// Writes mono 16-bit PCM to a WAV file.
///
/// # Errors
/// - If the file cannot be created or written
pub fn save_wav(samples: &[i16], sample_rate: u32, path: &Path) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Finds an input device by numeric index or exact name.
///
/// # Errors
/// - If no device matches
fn find_device_by_name(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    let devices: Vec<_> = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?
        .collect();

    if let Ok(index) = device_spec.parse::<usize>() {
        let count = devices.len();
        return devices.into_iter().nth(index).ok_or_else(|| {
            anyhow!(
                "Device index {} is out of range (0-{})",
                index,
                count.saturating_sub(1)
            )
        });
    }

    devices
        .into_iter()
        .find(|device| device.name().map(|name| name == device_spec).unwrap_or(false))
        .ok_or_else(|| {
            anyhow!(
                "Audio input device '{device_spec}' not found. Use 'quickrec list-devices' to see available devices."
            )
        })
}

/// Runs `f` with stderr pointed at /dev/null so ALSA's probing noise stays off the TUI.
#[cfg(target_os = "linux")]
pub(crate) fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let saved_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if saved_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }
    if unsafe { libc::dup2(dev_null.as_raw_fd(), libc::STDERR_FILENO) } == -1 {
        unsafe { libc::close(saved_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    unsafe {
        libc::dup2(saved_stderr, libc::STDERR_FILENO);
        libc::close(saved_stderr);
    }
    result
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}
