//! Decoding stored recordings to mono 16-bit PCM.
//!
//! WAV goes through hound; compressed formats (MP3, AAC/M4A, OGG Vorbis, FLAC) go
//! through symphonia. Both paths poll a [`CancellationToken`] between chunks and own
//! their reader/decoder handles, so every exit (success, error, cancellation) closes
//! the file.

use super::downsample::downsample;
use std::path::{Path, PathBuf};
use std::time::Duration;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Track};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// WAV frames read between cancellation checks.
const WAV_CANCEL_CHECK_FRAMES: usize = 4096;

/// Compressed packets decoded between cancellation checks.
const PACKET_CANCEL_CHECK_INTERVAL: u32 = 50;

/// Extensions handed to symphonia.
const COMPRESSED_EXTENSIONS: &[&str] = &["mp3", "aac", "m4a", "mp4", "ogg", "oga", "flac"];

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("audio file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to decode audio: {0}")]
    Decode(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("decode cancelled")]
    Cancelled,
}

/// Coarse classification used when reporting a failed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The file is missing or not something we can read.
    Input,
    /// The decoder failed part-way through.
    Resource,
    Cancelled,
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::NotFound(_) | DecodeError::UnsupportedFormat(_) => ErrorKind::Input,
            DecodeError::Decode(_) => ErrorKind::Resource,
            DecodeError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

impl From<hound::Error> for DecodeError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::Unsupported => DecodeError::UnsupportedFormat("WAV encoding".to_string()),
            other => DecodeError::Decode(Box::new(other)),
        }
    }
}

impl From<SymphoniaError> for DecodeError {
    fn from(err: SymphoniaError) -> Self {
        match err {
            SymphoniaError::Unsupported(what) => DecodeError::UnsupportedFormat(what.to_string()),
            other => DecodeError::Decode(Box::new(other)),
        }
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(err: std::io::Error) -> Self {
        DecodeError::Decode(Box::new(err))
    }
}

/// Mono PCM decoded from a file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedPcm {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl DecodedPcm {
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }
}

/// Turns an audio file into mono PCM, honoring `cancel` between steps.
pub trait PcmDecoder: Send + Sync {
    fn decode(&self, path: &Path, cancel: &CancellationToken) -> Result<DecodedPcm, DecodeError>;
}

/// Decoder for the formats the app records and imports.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDecoder;

impl PcmDecoder for FileDecoder {
    fn decode(&self, path: &Path, cancel: &CancellationToken) -> Result<DecodedPcm, DecodeError> {
        if !path.exists() {
            return Err(DecodeError::NotFound(path.to_path_buf()));
        }

        match extension_of(path)? {
            Container::Wav => decode_wav(path, cancel),
            Container::Compressed(extension) => decode_compressed(path, &extension, cancel),
        }
    }
}

enum Container {
    Wav,
    Compressed(String),
}

fn extension_of(path: &Path) -> Result<Container, DecodeError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "wav" => Ok(Container::Wav),
        ext if COMPRESSED_EXTENSIONS.contains(&ext) => Ok(Container::Compressed(extension)),
        "" => Err(DecodeError::UnsupportedFormat("no file extension".to_string())),
        other => Err(DecodeError::UnsupportedFormat(format!(".{}", other))),
    }
}

/// Length of an audio file, read from its header where the container records it.
///
/// Compressed streams without a frame count are decoded in full.
pub fn read_duration(path: &Path) -> Result<Duration, DecodeError> {
    if !path.exists() {
        return Err(DecodeError::NotFound(path.to_path_buf()));
    }

    let (frames, sample_rate) = match extension_of(path)? {
        Container::Wav => {
            let reader = hound::WavReader::open(path)?;
            (Some(u64::from(reader.duration())), reader.spec().sample_rate)
        }
        Container::Compressed(extension) => {
            let format = open_compressed(path, &extension)?;
            let track = default_track(format.as_ref())?;
            (
                track.codec_params.n_frames,
                track.codec_params.sample_rate.unwrap_or(0),
            )
        }
    };

    match frames {
        Some(frames) if sample_rate > 0 => {
            Ok(Duration::from_secs_f64(frames as f64 / sample_rate as f64))
        }
        _ => {
            tracing::debug!("No frame count in {}; decoding for duration", path.display());
            Ok(FileDecoder.decode(path, &CancellationToken::new())?.duration())
        }
    }
}

/// Decodes `path` and reduces it to `target_count` normalized amplitudes.
pub fn extract_waveform(
    path: &Path,
    target_count: usize,
    cancel: &CancellationToken,
) -> Result<Vec<f32>, DecodeError> {
    extract_waveform_with(&FileDecoder, path, target_count, cancel)
}

/// Same as [`extract_waveform`] with a caller-supplied decoder.
pub fn extract_waveform_with<D: PcmDecoder + ?Sized>(
    decoder: &D,
    path: &Path,
    target_count: usize,
    cancel: &CancellationToken,
) -> Result<Vec<f32>, DecodeError> {
    let pcm = decoder.decode(path, cancel)?;
    if cancel.is_cancelled() {
        return Err(DecodeError::Cancelled);
    }
    tracing::debug!(
        "Decoded {} samples ({:.2}s) from {}",
        pcm.samples.len(),
        pcm.duration().as_secs_f64(),
        path.display()
    );
    Ok(downsample(&pcm.samples, target_count))
}

fn decode_wav(path: &Path, cancel: &CancellationToken) -> Result<DecodedPcm, DecodeError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Box<dyn Iterator<Item = Result<i16, hound::Error>> + '_> =
        match spec.sample_format {
            hound::SampleFormat::Int => {
                let shift = spec.bits_per_sample.saturating_sub(16) as u32;
                let widen = 16u16.saturating_sub(spec.bits_per_sample) as u32;
                Box::new(
                    reader
                        .samples::<i32>()
                        .map(move |s| s.map(|v| ((v >> shift) << widen) as i16)),
                )
            }
            hound::SampleFormat::Float => Box::new(
                reader
                    .samples::<f32>()
                    .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)),
            ),
        };

    let mut samples = Vec::new();
    let mut frame = Vec::with_capacity(channels);
    for (i, sample) in interleaved.enumerate() {
        if i % (WAV_CANCEL_CHECK_FRAMES * channels) == 0 && cancel.is_cancelled() {
            return Err(DecodeError::Cancelled);
        }
        frame.push(sample?);
        if frame.len() == channels {
            samples.push(mix_down(&frame));
            frame.clear();
        }
    }
    if cancel.is_cancelled() {
        return Err(DecodeError::Cancelled);
    }

    Ok(DecodedPcm {
        samples,
        sample_rate: spec.sample_rate,
    })
}

fn decode_compressed(
    path: &Path,
    extension: &str,
    cancel: &CancellationToken,
) -> Result<DecodedPcm, DecodeError> {
    let mut format = open_compressed(path, extension)?;
    let track = default_track(format.as_ref())?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let sample_rate = codec_params.sample_rate.unwrap_or(0);

    let mut decoder =
        symphonia::default::get_codecs().make(&codec_params, &DecoderOptions::default())?;

    let mut sample_buf: Option<SampleBuffer<i16>> = None;
    let mut samples = Vec::new();
    let mut packet_count: u32 = 0;

    loop {
        if packet_count % PACKET_CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
            return Err(DecodeError::Cancelled);
        }
        packet_count = packet_count.wrapping_add(1);

        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // A corrupt packet costs one packet, not the whole waveform.
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::debug!("Skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        let frames = decoded.capacity();
        let channels = spec.channels.count().max(1);

        let buf = sample_buf.get_or_insert_with(|| SampleBuffer::<i16>::new(frames as u64, spec));
        if buf.capacity() < frames {
            *buf = SampleBuffer::<i16>::new(frames as u64, spec);
        }
        buf.copy_interleaved_ref(decoded);
        samples.extend(buf.samples().chunks(channels).map(mix_down));
    }

    Ok(DecodedPcm {
        samples,
        sample_rate,
    })
}

fn open_compressed(path: &Path, extension: &str) -> Result<Box<dyn FormatReader>, DecodeError> {
    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(extension);

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    Ok(probed.format)
}

fn default_track(format: &dyn FormatReader) -> Result<&Track, DecodeError> {
    format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| DecodeError::UnsupportedFormat("no audio track".to_string()))
}

/// Averages one interleaved frame to a single sample.
fn mix_down(frame: &[i16]) -> i16 {
    if frame.is_empty() {
        return 0;
    }
    let sum: i32 = frame.iter().map(|&s| s as i32).sum();
    (sum / frame.len() as i32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn write_wav(channels: u16, frames: &[i16]) -> NamedTempFile {
        let file = NamedTempFile::with_suffix(".wav").unwrap();
        let spec = hound::WavSpec {
            channels,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(file.path(), spec).unwrap();
        for &sample in frames {
            for _ in 0..channels {
                writer.write_sample(sample).unwrap();
            }
        }
        writer.finalize().unwrap();
        file
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = FileDecoder
            .decode(Path::new("/nonexistent/take.wav"), &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, DecodeError::NotFound(_)));
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[test]
    fn test_unknown_extension_is_unsupported() {
        let file = NamedTempFile::with_suffix(".txt").unwrap();
        let err = FileDecoder
            .decode(file.path(), &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_wav_decodes_mono_samples() {
        let file = write_wav(1, &[0, 1000, -2000, 32767]);
        let pcm = FileDecoder
            .decode(file.path(), &CancellationToken::new())
            .unwrap();
        assert_eq!(pcm.samples, vec![0, 1000, -2000, 32767]);
        assert_eq!(pcm.sample_rate, 16_000);
    }

    #[test]
    fn test_stereo_is_mixed_down() {
        let file = write_wav(2, &[100, -300]);
        let pcm = FileDecoder
            .decode(file.path(), &CancellationToken::new())
            .unwrap();
        assert_eq!(pcm.samples, vec![100, -300]);
    }

    #[test]
    fn test_cancelled_token_stops_decode() {
        let file = write_wav(1, &vec![500; 10_000]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = FileDecoder.decode(file.path(), &cancel).unwrap_err();
        assert!(matches!(err, DecodeError::Cancelled));
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_garbage_compressed_file_fails_without_panic() {
        let file = NamedTempFile::with_suffix(".mp3").unwrap();
        std::fs::write(file.path(), b"definitely not audio").unwrap();

        let err = FileDecoder
            .decode(file.path(), &CancellationToken::new())
            .unwrap_err();
        assert_ne!(err.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_extract_waveform_reduces_to_target() {
        let frames: Vec<i16> = (0..16_000).map(|i| if i < 8_000 { 1_000 } else { 8_000 }).collect();
        let file = write_wav(1, &frames);

        let values = extract_waveform(file.path(), 500, &CancellationToken::new()).unwrap();

        assert_eq!(values.len(), 500);
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(values.iter().cloned().fold(0.0_f32, f32::max), 1.0);
        assert!(values[0] < values[499]);
    }

    #[test]
    fn test_wav_duration_comes_from_header() {
        let file = write_wav(2, &[0; 24_000]);
        assert_eq!(read_duration(file.path()).unwrap(), Duration::from_millis(1_500));
    }

    #[test]
    fn test_duration_of_missing_or_unknown_file_fails() {
        assert!(matches!(
            read_duration(Path::new("/nonexistent/take.wav")),
            Err(DecodeError::NotFound(_))
        ));
        let file = NamedTempFile::with_suffix(".txt").unwrap();
        assert!(matches!(
            read_duration(file.path()),
            Err(DecodeError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_duration_from_sample_rate() {
        let pcm = DecodedPcm {
            samples: vec![0; 8_000],
            sample_rate: 16_000,
        };
        assert_eq!(pcm.duration(), Duration::from_millis(500));
    }
}
