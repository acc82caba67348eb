//! Linear-interpolation sample-rate conversion
//!
//! No anti-aliasing filter is applied; for speech resampled between the
//! synthesis rate and the transport rate the quality trade-off is accepted.

/// Resample mono PCM from `from_hz` to `to_hz`.
///
/// Output length is exactly `round(n * to_hz / from_hz)`. Each output sample
/// is linearly interpolated between its two neighbours in the input; the
/// final stretch holds the last input sample.
#[must_use]
pub fn resample(input: &[i16], from_hz: u32, to_hz: u32) -> Vec<i16> {
    assert!(from_hz > 0 && to_hz > 0, "sample rates must be non-zero");

    if input.is_empty() || from_hz == to_hz {
        return input.to_vec();
    }

    let out_len = ((input.len() as u64 * u64::from(to_hz) + u64::from(from_hz) / 2)
        / u64::from(from_hz)) as usize;
    let step = f64::from(from_hz) / f64::from(to_hz);

    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let pos = i as f64 * step;
        let idx = pos as usize;
        let frac = pos - idx as f64;

        let s0 = f64::from(input[idx.min(input.len() - 1)]);
        let s1 = f64::from(input[(idx + 1).min(input.len() - 1)]);
        out.push((s0 + (s1 - s0) * frac).round() as i16);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_length_is_rounded_rate_ratio() {
        assert_eq!(resample(&[0; 480], 24_000, 48_000).len(), 960);
        assert_eq!(resample(&[0; 960], 48_000, 24_000).len(), 480);
        assert_eq!(resample(&[0; 441], 44_100, 48_000).len(), 480);
        assert_eq!(resample(&[0; 100], 48_000, 44_100).len(), 92);
        assert_eq!(resample(&[0; 3], 24_000, 48_000).len(), 6);
    }

    #[test]
    fn same_rate_and_empty_input_pass_through() {
        let pcm = vec![5i16, -5, 10];
        assert_eq!(resample(&pcm, 48_000, 48_000), pcm);
        assert_eq!(resample(&[], 24_000, 48_000), Vec::<i16>::new());
    }

    #[test]
    fn upsampling_interpolates_between_neighbours() {
        let out = resample(&[0, 100], 24_000, 48_000);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], 0);
        assert_eq!(out[1], 50);
        assert_eq!(out[2], 100);
    }

    #[test]
    fn there_and_back_approximates_identity() {
        let ramp: Vec<i16> = (0..2400).map(|i| (i % 2000) as i16).collect();
        let up = resample(&ramp, 24_000, 48_000);
        let back = resample(&up, 48_000, 24_000);

        assert!(back.len().abs_diff(ramp.len()) <= 1);
        for (a, b) in ramp.iter().zip(&back) {
            assert!(
                (i32::from(*a) - i32::from(*b)).abs() <= 2,
                "sample drifted: {a} vs {b}"
            );
        }
    }
}
