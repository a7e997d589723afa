//! Peak normalization of magnitude sequences.

/// Rescales `values` so the largest becomes exactly 1.0.
///
/// Silence (all zeros) and empty input are returned unchanged.
pub fn normalize(values: &[f32]) -> Vec<f32> {
    let max = values.iter().copied().fold(0.0_f32, f32::max);
    if max == 0.0 {
        return values.to_vec();
    }
    values.iter().map(|&v| v / max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_input() {
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn test_silence_is_untouched() {
        assert_eq!(normalize(&[0.0, 0.0, 0.0]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_peak_becomes_one() {
        let out = normalize(&[0.1, 0.4, 0.2]);
        assert_relative_eq!(out[0], 0.25);
        assert_eq!(out[1], 1.0);
        assert_relative_eq!(out[2], 0.5);
    }
}
