/// A single-frame pitch estimate: the dominant in-band frequency and the
/// magnitude it was detected at. Absence of a detectable pitch is `None`
/// at the call site, not a sentinel value in here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    pub frequency_hz: f32,
    pub amplitude: f32,
}

/// Search band and gate for the per-frame peak scan.
#[derive(Debug, Clone)]
pub struct BandConfig {
    /// Lower edge of the search band in Hz.
    pub min_hz: f32,
    /// Upper edge of the search band in Hz.
    pub max_hz: f32,
    /// A winning magnitude must strictly exceed this, on the same
    /// 0..=255 scale the spectrum front-end emits. Calibrated so ambient
    /// room noise stays below it.
    pub threshold: f32,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            min_hz: 80.0,
            max_hz: 2000.0,
            threshold: 80.0,
        }
    }
}

/// Find the dominant frequency within the configured band.
///
/// One pass over the in-band bins, keeping the maximum magnitude above
/// the threshold; ties keep the first (lowest-frequency) bin. There is no
/// smoothing here beyond what the spectrum front-end already applied, so
/// the scan favors responsiveness over robustness to transient spikes.
///
/// `magnitudes` is indexed by frequency bin over `[0, sample_rate / 2)`,
/// so `bin = floor(freq * bin_count / (sample_rate / 2))` and back again
/// `freq = bin * sample_rate / (2 * bin_count)`.
pub fn find_band_peak(
    magnitudes: &[f32],
    sample_rate: u32,
    config: &BandConfig,
) -> Option<PitchEstimate> {
    if magnitudes.is_empty() || sample_rate == 0 {
        return None;
    }

    let bin_count = magnitudes.len();
    let nyquist = sample_rate as f32 / 2.0;
    let lo = ((config.min_hz * bin_count as f32) / nyquist).floor().max(0.0) as usize;
    let hi = ((config.max_hz * bin_count as f32) / nyquist).floor() as usize;
    let hi = hi.min(bin_count);

    let mut best: Option<(usize, f32)> = None;
    for (bin, &amplitude) in magnitudes.iter().enumerate().take(hi).skip(lo) {
        if amplitude > config.threshold && best.is_none_or(|(_, a)| amplitude > a) {
            best = Some((bin, amplitude));
        }
    }

    best.map(|(bin, amplitude)| PitchEstimate {
        frequency_hz: bin as f32 * sample_rate as f32 / (2.0 * bin_count as f32),
        amplitude,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 44100;
    const BIN_COUNT: usize = 2048; // fft size 4096

    fn bin_for(freq_hz: f32) -> usize {
        (freq_hz * BIN_COUNT as f32 / (SAMPLE_RATE as f32 / 2.0)).floor() as usize
    }

    fn bin_width() -> f32 {
        SAMPLE_RATE as f32 / (2.0 * BIN_COUNT as f32)
    }

    #[test]
    fn all_zero_frame_is_absent() {
        let magnitudes = vec![0.0; BIN_COUNT];
        for rate in [8000, 44100, 48000, 96000] {
            assert_eq!(find_band_peak(&magnitudes, rate, &BandConfig::default()), None);
        }
    }

    #[test]
    fn empty_input_is_absent() {
        assert_eq!(find_band_peak(&[], SAMPLE_RATE, &BandConfig::default()), None);
    }

    #[test]
    fn spike_at_440_maps_back_within_one_bin_width() {
        let mut magnitudes = vec![0.0; BIN_COUNT];
        magnitudes[bin_for(440.0)] = 200.0;

        let est = find_band_peak(&magnitudes, SAMPLE_RATE, &BandConfig::default())
            .expect("spike above threshold");
        assert!((est.frequency_hz - 440.0).abs() < bin_width());
        assert_eq!(est.amplitude, 200.0);
    }

    #[test]
    fn amplitude_at_threshold_is_absent() {
        let config = BandConfig::default();
        let mut magnitudes = vec![0.0; BIN_COUNT];
        magnitudes[bin_for(440.0)] = config.threshold;
        assert_eq!(find_band_peak(&magnitudes, SAMPLE_RATE, &config), None);

        magnitudes[bin_for(440.0)] = config.threshold + 0.5;
        assert!(find_band_peak(&magnitudes, SAMPLE_RATE, &config).is_some());
    }

    #[test]
    fn tie_keeps_the_lower_frequency() {
        let mut magnitudes = vec![0.0; BIN_COUNT];
        let low = bin_for(220.0);
        let high = bin_for(880.0);
        magnitudes[low] = 150.0;
        magnitudes[high] = 150.0;

        let est = find_band_peak(&magnitudes, SAMPLE_RATE, &BandConfig::default()).unwrap();
        let low_freq = low as f32 * SAMPLE_RATE as f32 / (2.0 * BIN_COUNT as f32);
        assert!((est.frequency_hz - low_freq).abs() < f32::EPSILON);
    }

    #[test]
    fn louder_later_bin_wins_over_quieter_earlier_one() {
        let mut magnitudes = vec![0.0; BIN_COUNT];
        magnitudes[bin_for(220.0)] = 120.0;
        magnitudes[bin_for(880.0)] = 180.0;

        let est = find_band_peak(&magnitudes, SAMPLE_RATE, &BandConfig::default()).unwrap();
        assert!((est.frequency_hz - 880.0).abs() < bin_width());
    }

    #[test]
    fn spikes_outside_the_band_are_ignored() {
        let mut magnitudes = vec![0.0; BIN_COUNT];
        magnitudes[bin_for(50.0)] = 250.0;
        magnitudes[bin_for(3000.0)] = 250.0;

        assert_eq!(find_band_peak(&magnitudes, SAMPLE_RATE, &BandConfig::default()), None);
    }

    #[test]
    fn band_wider_than_nyquist_is_clamped() {
        let config = BandConfig {
            min_hz: 80.0,
            max_hz: 1_000_000.0,
            threshold: 80.0,
        };
        let mut magnitudes = vec![0.0; BIN_COUNT];
        magnitudes[BIN_COUNT - 1] = 200.0;

        let est = find_band_peak(&magnitudes, SAMPLE_RATE, &config).unwrap();
        assert!(est.frequency_hz < SAMPLE_RATE as f32 / 2.0);
    }
}
