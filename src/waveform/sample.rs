//! Amplitude readings and the sources that produce them.

/// Default ceiling for polled peak amplitudes.
///
/// Hardware encoders rarely report the full 16-bit range; 22760 matches what the
/// platform recorders we target actually emit at full scale.
pub const DEFAULT_MAX_REPORTABLE_AMPLITUDE: u32 = 22_760;

/// A single amplitude reading, immutable once created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmplitudeSample {
    /// Raw reading as reported by the source.
    pub raw: u32,
    /// `raw / max_reportable`, clamped to `[0, 1]`.
    pub normalized: f32,
}

impl AmplitudeSample {
    /// Creates a sample relative to the given amplitude ceiling.
    pub fn new(raw: u32, max_reportable: u32) -> Self {
        let normalized = if max_reportable == 0 {
            0.0
        } else {
            (raw as f32 / max_reportable as f32).clamp(0.0, 1.0)
        };
        Self { raw, normalized }
    }
}

/// Something that can be polled for the peak amplitude seen since the last poll.
///
/// The live recorder implements this over its capture stream; tests use scripted
/// sequences.
pub trait AmplitudeSource {
    /// Returns the peak amplitude since the previous call and resets the peak.
    fn poll(&mut self) -> u32;

    /// Upper bound of values returned by [`AmplitudeSource::poll`].
    fn max_reportable(&self) -> u32 {
        DEFAULT_MAX_REPORTABLE_AMPLITUDE
    }
}

impl<I> AmplitudeSource for I
where
    I: Iterator<Item = u32>,
{
    fn poll(&mut self) -> u32 {
        self.next().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sample_normalization_is_clamped() {
        let sample = AmplitudeSample::new(11_380, 22_760);
        assert_relative_eq!(sample.normalized, 0.5);

        let loud = AmplitudeSample::new(40_000, 22_760);
        assert_relative_eq!(loud.normalized, 1.0);
    }

    #[test]
    fn test_zero_ceiling_yields_silence() {
        assert_eq!(AmplitudeSample::new(100, 0).normalized, 0.0);
    }

    #[test]
    fn test_iterator_source_drains_then_reports_silence() {
        let mut source = vec![5u32, 7].into_iter();
        assert_eq!(source.poll(), 5);
        assert_eq!(source.poll(), 7);
        assert_eq!(source.poll(), 0);
    }
}
