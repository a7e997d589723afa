//! Off-thread waveform extraction for file mode.
//!
//! Each load runs on tokio's blocking pool with its own [`CancellationToken`]. The
//! finished amplitudes come back over a channel tagged with the load's generation;
//! anything from an older generation is dropped unread, so only the most recent
//! request can ever reach the view.

use super::decode::{extract_waveform_with, DecodeError, FileDecoder, PcmDecoder};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// How a file load ended, as reported to its completion callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// Decoding succeeded with this many amplitude values.
    Loaded(usize),
    /// The file could not be decoded; the waveform is empty.
    Failed,
    /// Superseded by a newer load or a clear before it finished.
    Cancelled,
}

impl LoadStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, LoadStatus::Loaded(_))
    }
}

struct Completed {
    generation: u64,
    outcome: Result<Vec<f32>, DecodeError>,
}

/// Runs at most one extraction at a time and hands back its result.
pub struct WaveformLoader {
    decoder: Arc<dyn PcmDecoder>,
    target_count: usize,
    generation: u64,
    in_flight: Option<CancellationToken>,
    tx: mpsc::UnboundedSender<Completed>,
    rx: mpsc::UnboundedReceiver<Completed>,
}

impl std::fmt::Debug for WaveformLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaveformLoader")
            .field("target_count", &self.target_count)
            .field("generation", &self.generation)
            .field("loading", &self.is_loading())
            .finish()
    }
}

impl WaveformLoader {
    pub fn new(target_count: usize) -> Self {
        Self::with_decoder(Arc::new(FileDecoder), target_count)
    }

    /// # Panics
    /// If `target_count` is zero.
    pub fn with_decoder(decoder: Arc<dyn PcmDecoder>, target_count: usize) -> Self {
        assert!(target_count > 0, "waveform target_count must be positive");
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            decoder,
            target_count,
            generation: 0,
            in_flight: None,
            tx,
            rx,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Starts decoding `path`, cancelling whatever was in flight.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, path: PathBuf) -> u64 {
        self.cancel();

        let generation = self.generation;
        let token = CancellationToken::new();
        self.in_flight = Some(token.clone());

        let decoder = Arc::clone(&self.decoder);
        let target_count = self.target_count;
        let tx = self.tx.clone();

        tracing::debug!("Starting waveform load #{} for {}", generation, path.display());
        tokio::task::spawn_blocking(move || {
            let outcome = extract_waveform_with(decoder.as_ref(), &path, target_count, &token);
            // The receiver only goes away with the loader itself.
            let _ = tx.send(Completed {
                generation,
                outcome,
            });
        });

        generation
    }

    /// Cancels the in-flight load, if any. Its result will never be returned.
    pub fn cancel(&mut self) {
        if let Some(token) = self.in_flight.take() {
            tracing::debug!("Cancelling waveform load #{}", self.generation);
            token.cancel();
        }
        self.generation = self.generation.wrapping_add(1);
    }

    /// Returns the current load's outcome once it has arrived.
    pub fn poll(&mut self) -> Option<Result<Vec<f32>, DecodeError>> {
        while let Ok(completed) = self.rx.try_recv() {
            if let Some(outcome) = self.accept(completed) {
                return Some(outcome);
            }
        }
        None
    }

    /// Waits for the current load's outcome.
    ///
    /// Returns `None` immediately when nothing is loading.
    pub async fn finished(&mut self) -> Option<Result<Vec<f32>, DecodeError>> {
        while self.is_loading() {
            let completed = self.rx.recv().await?;
            if let Some(outcome) = self.accept(completed) {
                return Some(outcome);
            }
        }
        None
    }

    fn accept(&mut self, completed: Completed) -> Option<Result<Vec<f32>, DecodeError>> {
        if completed.generation != self.generation || self.in_flight.is_none() {
            tracing::debug!("Discarding stale waveform load #{}", completed.generation);
            return None;
        }
        self.in_flight = None;
        Some(completed.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::decode::DecodedPcm;
    use std::path::Path;
    use std::time::{Duration, Instant};
    use tempfile::NamedTempFile;

    fn write_wav(samples: usize) -> NamedTempFile {
        let file = NamedTempFile::with_suffix(".wav").unwrap();
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(file.path(), spec).unwrap();
        for i in 0..samples {
            writer.write_sample((i as i16).wrapping_mul(37)).unwrap();
        }
        writer.finalize().unwrap();
        file
    }

    /// Blocks until cancelled (or a generous deadline passes).
    struct StallingDecoder;

    impl PcmDecoder for StallingDecoder {
        fn decode(&self, _path: &Path, cancel: &CancellationToken) -> Result<DecodedPcm, DecodeError> {
            let deadline = Instant::now() + Duration::from_secs(5);
            while Instant::now() < deadline {
                if cancel.is_cancelled() {
                    return Err(DecodeError::Cancelled);
                }
                std::thread::sleep(Duration::from_millis(1));
            }
            Ok(DecodedPcm {
                samples: vec![1; 4],
                sample_rate: 8_000,
            })
        }
    }

    #[tokio::test]
    async fn test_load_returns_amplitudes() {
        let file = write_wav(40);
        let mut loader = WaveformLoader::new(500);

        loader.start(file.path().to_path_buf());
        let values = loader.finished().await.unwrap().unwrap();

        assert_eq!(values.len(), 40);
        assert!(!loader.is_loading());
    }

    #[tokio::test]
    async fn test_newer_load_wins() {
        let first = write_wav(10);
        let second = write_wav(20);
        let mut loader = WaveformLoader::new(500);

        loader.start(first.path().to_path_buf());
        loader.start(second.path().to_path_buf());

        let values = loader.finished().await.unwrap().unwrap();
        assert_eq!(values.len(), 20);
        assert!(loader.poll().is_none());
    }

    #[tokio::test]
    async fn test_cancelled_load_never_delivers() {
        let mut loader = WaveformLoader::with_decoder(Arc::new(StallingDecoder), 500);

        loader.start(PathBuf::from("stalled.wav"));
        loader.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!loader.is_loading());
        assert!(loader.poll().is_none());
        assert!(loader.finished().await.is_none());
    }

    #[tokio::test]
    async fn test_missing_file_reports_error() {
        let mut loader = WaveformLoader::new(500);
        loader.start(PathBuf::from("/nonexistent/recording.wav"));

        let outcome = loader.finished().await.unwrap();
        assert!(matches!(outcome, Err(DecodeError::NotFound(_))));
    }
}
