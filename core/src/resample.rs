//! Capture preparation: channel selection and sample-rate conversion

/// Extract channel `channel` from interleaved multi-channel audio.
///
/// A trailing partial frame is ignored. `channels == 0` or an out-of-range
/// channel gives an empty result.
pub fn extract_channel(samples: &[f32], channels: usize, channel: usize) -> Vec<f32> {
    if channels == 0 || channel >= channels {
        return Vec::new();
    }
    samples
        .chunks_exact(channels)
        .map(|frame| frame[channel])
        .collect()
}

/// First channel of interleaved audio. Recordings are decoded from the left
/// channel only, never a downmix.
pub fn first_channel(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    extract_channel(samples, channels, 0)
}

/// Resample audio to a target sample rate using linear interpolation
///
/// # Arguments
/// * `samples` - Input audio samples
/// * `from_rate` - Current sample rate in Hz
/// * `to_rate` - Target sample rate in Hz
///
/// # Example
/// ```ignore
/// let audio_44k = vec![0.1, 0.2, 0.3, ...];
/// let audio_48k = resample_audio(&audio_44k, 44100, 48000);
/// ```
pub fn resample_audio(samples: &[f32], from_rate: usize, to_rate: usize) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }

    // exact integer ratio: 44100 samples at 44.1 kHz give 48000 at 48 kHz
    let (from, to) = (from_rate as u64, to_rate as u64);
    let new_length = (samples.len() as u64 * to).div_ceil(from) as usize;
    let last = samples.len() - 1;

    (0..new_length as u64)
        .map(|i| {
            let scaled = i * from;
            let floor = ((scaled / to) as usize).min(last);
            let fraction = ((scaled % to) as f64 / to as f64) as f32;
            if floor < last {
                samples[floor] * (1.0 - fraction) + samples[floor + 1] * fraction
            } else {
                samples[last]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_channel_of_stereo() {
        let stereo = vec![0.2, 0.8, 0.4, 0.6, -0.1, 0.9];
        assert_eq!(first_channel(&stereo, 2), vec![0.2, 0.4, -0.1]);
        assert_eq!(first_channel(&stereo, 1), stereo);
    }

    #[test]
    fn test_extract_channel_edges() {
        let frames = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        assert_eq!(extract_channel(&frames, 3, 2), vec![3.0, 6.0]);
        assert!(extract_channel(&frames, 3, 3).is_empty());
        assert!(extract_channel(&frames, 0, 0).is_empty());
    }

    #[test]
    fn test_resample_same_rate() {
        let samples = vec![0.1, 0.2, 0.3, 0.4];
        assert_eq!(resample_audio(&samples, 48000, 48000), samples);
        assert!(resample_audio(&[], 44100, 48000).is_empty());
    }

    #[test]
    fn test_resample_upsample_interpolates() {
        let samples = vec![0.0, 1.0, 0.0];
        let resampled = resample_audio(&samples, 24000, 48000);
        assert_eq!(resampled.len(), 6);
        assert!((resampled[1] - 0.5).abs() < 1e-6);
        assert!((resampled[2] - 1.0).abs() < 1e-6);
        assert!((resampled[5] - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_resample_downsample_length() {
        let samples: Vec<f32> = (0..8).map(|i| i as f32 * 0.1).collect();
        let resampled = resample_audio(&samples, 48000, 16000);
        assert_eq!(resampled.len(), 3);
        assert!((resampled[1] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_resample_preserves_tone_frequency() {
        let tone: Vec<f32> = (0..44100)
            .map(|i| (2.0 * std::f32::consts::PI * 1200.0 * i as f32 / 44100.0).sin())
            .collect();
        let resampled = resample_audio(&tone, 44100, 48000);
        assert_eq!(resampled.len(), 48000);
        let crossings = resampled
            .windows(2)
            .filter(|w| (w[0] < 0.0) != (w[1] < 0.0))
            .count();
        assert!((crossings as i64 - 2400).abs() <= 4, "crossings {}", crossings);
    }

    #[test]
    fn test_resample_lengths_are_exact() {
        for (len, from, to, expected) in [
            (44100, 44100, 48000, 48000),
            (48000, 48000, 44100, 44100),
            (58040, 48000, 44100, 53325),
            (22050, 22050, 48000, 48000),
            (1, 44100, 48000, 2),
        ] {
            let samples = vec![0.25f32; len];
            let resampled = resample_audio(&samples, from, to);
            assert_eq!(resampled.len(), expected, "{} @ {} -> {}", len, from, to);
            assert!(resampled.iter().all(|&x| (x - 0.25).abs() < 1e-6));
        }
    }
}
