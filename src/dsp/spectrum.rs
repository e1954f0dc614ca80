use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Parameters for the spectrum front-end.
///
/// The magnitude scale is deliberately byte-like: per-bin decibels are
/// mapped linearly from `[min_db, max_db]` onto 0..=255, which is the
/// scale the detection amplitude threshold is calibrated against.
#[derive(Debug, Clone)]
pub struct SpectrumParams {
    /// FFT size in samples. One analysis frame is exactly this long.
    pub fft_size: usize,
    /// Exponential time-smoothing factor per bin, 0.0 (none) to <1.0.
    pub smoothing: f32,
    /// Decibel value mapped to magnitude 0.
    pub min_db: f32,
    /// Decibel value mapped to magnitude 255.
    pub max_db: f32,
}

impl Default for SpectrumParams {
    fn default() -> Self {
        Self {
            fft_size: 4096,
            smoothing: 0.8,
            min_db: -100.0,
            max_db: -30.0,
        }
    }
}

/// Converts fixed-size time-domain frames into smoothed, byte-scaled
/// magnitude spectra.
///
/// Holds the planned FFT and the per-bin smoothing state, so one instance
/// belongs to one analysis loop. The pipeline per frame is Hann window,
/// forward FFT, single-sided magnitudes normalized by 1/N, exponential
/// time smoothing, then dB conversion onto the 0..=255 scale.
pub struct SpectrumAnalyzer {
    params: SpectrumParams,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    magnitudes: Vec<f32>,
}

impl SpectrumAnalyzer {
    pub fn new(params: SpectrumParams) -> SpectrumAnalyzer {
        let fft = FftPlanner::new().plan_fft_forward(params.fft_size);
        let scratch_len = fft.get_inplace_scratch_len();
        let bin_count = params.fft_size / 2;
        SpectrumAnalyzer {
            window: hann_window(params.fft_size),
            buffer: vec![Complex::default(); params.fft_size],
            scratch: vec![Complex::default(); scratch_len],
            smoothed: vec![0.0; bin_count],
            magnitudes: vec![0.0; bin_count],
            fft,
            params,
        }
    }

    /// Analyze one frame and return its magnitude spectrum.
    ///
    /// The frame must be exactly `fft_size` samples; frames are produced
    /// internally at that size, so a mismatch is a programming error.
    pub fn process(&mut self, frame: &[f32]) -> &[f32] {
        assert_eq!(frame.len(), self.params.fft_size, "frame size mismatch");

        for ((slot, &sample), &w) in self.buffer.iter_mut().zip(frame).zip(&self.window) {
            *slot = Complex {
                re: sample * w,
                im: 0.0,
            };
        }
        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        let norm = 1.0 / self.params.fft_size as f32;
        let tau = self.params.smoothing;
        let db_span = self.params.max_db - self.params.min_db;

        for (k, out) in self.magnitudes.iter_mut().enumerate() {
            let mag = self.buffer[k].norm() * norm;
            self.smoothed[k] = tau * self.smoothed[k] + (1.0 - tau) * mag;

            *out = if self.smoothed[k] > 0.0 {
                let db = 20.0 * self.smoothed[k].log10();
                (255.0 * (db - self.params.min_db) / db_span).clamp(0.0, 255.0)
            } else {
                0.0
            };
        }

        &self.magnitudes
    }
}

fn hann_window(len: usize) -> Vec<f32> {
    if len <= 1 {
        return vec![1.0; len];
    }
    let scale = 2.0 * PI / (len - 1) as f32;
    (0..len).map(|i| 0.5 * (1.0 - (scale * i as f32).cos())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_frame(freq_hz: f32, sample_rate: u32, len: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                amplitude * (2.0 * PI * freq_hz * t).sin()
            })
            .collect()
    }

    fn peak_bin(magnitudes: &[f32]) -> usize {
        magnitudes
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap()
    }

    #[test]
    fn silence_produces_zero_magnitudes() {
        let mut analyzer = SpectrumAnalyzer::new(SpectrumParams::default());
        let frame = vec![0.0; 4096];
        let mags = analyzer.process(&frame);
        assert!(mags.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn sine_peaks_at_its_own_bin() {
        let mut analyzer = SpectrumAnalyzer::new(SpectrumParams::default());
        let frame = sine_frame(440.0, 44100, 4096, 0.8);
        let mags = analyzer.process(&frame).to_vec();

        // 440 Hz lands between bins 40 and 41 at this resolution.
        let bin = peak_bin(&mags);
        assert!((40..=41).contains(&bin), "peak at bin {bin}");
        assert!(mags[bin] > 80.0, "peak magnitude {}", mags[bin]);
    }

    #[test]
    fn output_stays_on_byte_scale() {
        let mut analyzer = SpectrumAnalyzer::new(SpectrumParams::default());
        let frame = sine_frame(440.0, 44100, 4096, 1.0);
        let mags = analyzer.process(&frame);
        assert!(mags.iter().all(|&m| (0.0..=255.0).contains(&m)));
    }

    #[test]
    fn smoothing_decays_after_signal_stops() {
        let mut analyzer = SpectrumAnalyzer::new(SpectrumParams::default());
        // Quiet enough that the peak stays under the 255 clamp, so the
        // decay is visible in the output.
        let quiet = sine_frame(440.0, 44100, 4096, 0.05);
        let silent = vec![0.0; 4096];

        let bin = peak_bin(&analyzer.process(&quiet).to_vec());
        let during = analyzer.process(&quiet)[bin];
        let after = analyzer.process(&silent)[bin];

        assert!(after < during, "expected decay: {after} < {during}");
        assert!(after > 0.0, "one silent frame must not zero the history");
    }

    #[test]
    fn output_has_one_bin_per_half_fft_size() {
        let mut analyzer = SpectrumAnalyzer::new(SpectrumParams {
            fft_size: 2048,
            ..SpectrumParams::default()
        });
        assert_eq!(analyzer.process(&vec![0.0; 2048]).len(), 1024);
    }
}
