//! Peak meter shared between the capture callback and the UI thread.

use crate::waveform::AmplitudeSource;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Largest magnitude a 16-bit PCM sample can have.
pub const PCM16_PEAK: u32 = i16::MAX as u32;

/// Tracks the loudest sample since the last poll.
///
/// The audio callback calls [`PeakMeter::record`] for every buffer; the live view
/// polls it through [`AmplitudeSource`], which reads and resets the peak in one step.
#[derive(Debug, Clone, Default)]
pub struct PeakMeter {
    peak: Arc<AtomicU32>,
}

impl PeakMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, samples: &[i16]) {
        let loudest = samples
            .iter()
            .map(|sample| (sample.unsigned_abs() as u32).min(PCM16_PEAK))
            .max()
            .unwrap_or(0);
        self.peak.fetch_max(loudest, Ordering::Relaxed);
    }
}

impl AmplitudeSource for PeakMeter {
    fn poll(&mut self) -> u32 {
        self.peak.swap(0, Ordering::Relaxed)
    }

    fn max_reportable(&self) -> u32 {
        PCM16_PEAK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_returns_peak_and_resets() {
        let mut meter = PeakMeter::new();
        meter.record(&[10, -300, 42]);
        meter.record(&[200]);

        assert_eq!(meter.poll(), 300);
        assert_eq!(meter.poll(), 0);
    }

    #[test]
    fn test_clones_share_the_peak() {
        let writer = PeakMeter::new();
        let mut reader = writer.clone();
        writer.record(&[i16::MIN]);

        assert_eq!(reader.poll(), PCM16_PEAK);
        assert_eq!(reader.max_reportable(), PCM16_PEAK);
    }

    #[test]
    fn test_empty_buffer_keeps_previous_peak() {
        let mut meter = PeakMeter::new();
        meter.record(&[7]);
        meter.record(&[]);
        assert_eq!(meter.poll(), 7);
    }
}
