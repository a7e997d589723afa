//! RMS bucketing of 16-bit PCM into a fixed number of display values.

use super::normalize::normalize;

/// Full-scale magnitude of a signed 16-bit sample.
pub const I16_FULL_SCALE: f32 = i16::MAX as f32;

/// Reduces `samples` to at most `target_count` magnitudes in `[0, 1]`.
///
/// Short inputs (no more samples than the target) map one-to-one to `|s| / 32767`
/// without normalization. Longer inputs are split into `target_count` contiguous
/// buckets, each reduced to the root-mean-square of its normalized samples, and the
/// result is peak-normalized.
///
/// # Panics
/// If `target_count` is zero while `samples` is non-empty.
pub fn downsample(samples: &[i16], target_count: usize) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }
    if samples.len() <= target_count {
        return samples
            .iter()
            .map(|&s| (s as f32).abs() / I16_FULL_SCALE)
            .collect();
    }
    assert!(target_count > 0, "downsample target_count must be positive");

    let len = samples.len();
    let bucket_size = len as f64 / target_count as f64;

    let buckets: Vec<f32> = (0..target_count)
        .map(|i| {
            let start = ((i as f64 * bucket_size).floor() as usize).min(len);
            let end = (((i + 1) as f64 * bucket_size).floor() as usize).min(len);
            rms(&samples[start..end])
        })
        .collect();

    normalize(&buckets)
}

/// Root-mean-square of normalized samples; an empty slice is silent.
fn rms(bucket: &[i16]) -> f32 {
    if bucket.is_empty() {
        return 0.0;
    }
    let sum_of_squares: f64 = bucket
        .iter()
        .map(|&s| {
            let n = s as f64 / I16_FULL_SCALE as f64;
            n * n
        })
        .sum();
    (sum_of_squares / bucket.len() as f64).sqrt() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert!(downsample(&[], 10).is_empty());
        assert!(downsample(&[], 0).is_empty());
    }

    #[test]
    fn test_short_input_maps_one_to_one() {
        let samples = [0i16, 32767, -32767, 16384, -100];
        let out = downsample(&samples, 8);

        assert_eq!(out.len(), samples.len());
        for (value, &sample) in out.iter().zip(samples.iter()) {
            assert_relative_eq!(*value, (sample as f32).abs() / 32767.0);
        }
    }

    #[test]
    fn test_input_equal_to_target_is_not_normalized() {
        let out = downsample(&[1000, 2000], 2);
        assert_relative_eq!(out[1], 2000.0 / 32767.0);
    }

    #[test]
    fn test_long_input_is_bucketed_and_normalized() {
        let samples: Vec<i16> = (0..1000).map(|i| ((i % 50) * 100) as i16).collect();
        let out = downsample(&samples, 37);

        assert_eq!(out.len(), 37);
        assert!(out.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(out.iter().any(|&v| v == 1.0));
    }

    #[test]
    fn test_bucket_rms_values() {
        // Two buckets: constant quarter scale, then constant half scale.
        let quarter = (32767.0 * 0.25) as i16;
        let half = (32767.0 * 0.5) as i16;
        let samples = [quarter, -quarter, half, -half];
        let out = downsample(&samples, 2);

        assert_relative_eq!(out[0], 0.5, epsilon = 1e-3);
        assert_relative_eq!(out[1], 1.0);
    }

    #[test]
    fn test_uneven_buckets_cover_every_sample() {
        // 10 samples into 3 buckets: boundaries 0..3, 3..6, 6..10.
        let mut samples = vec![0i16; 10];
        samples[9] = 20_000;
        let out = downsample(&samples, 3);

        assert_eq!(out.len(), 3);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 0.0);
        assert_eq!(out[2], 1.0);
    }

    #[test]
    fn test_all_silent_input_stays_zero() {
        let out = downsample(&[0i16; 64], 8);
        assert_eq!(out, vec![0.0; 8]);
    }

    #[test]
    #[should_panic(expected = "target_count must be positive")]
    fn test_zero_target_with_samples_panics() {
        downsample(&[1, 2, 3], 0);
    }
}
