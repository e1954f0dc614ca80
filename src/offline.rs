use std::path::Path;

use anyhow::Result;
use console::style;

use crate::audio::session::DetectionConfig;
use crate::audio::wav;
use crate::config::AppConfig;
use crate::dsp::peak::{self, PitchEstimate};
use crate::dsp::spectrum::SpectrumAnalyzer;
use crate::note::Note;

/// A point in the detection timeline where the current note changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Change {
    pub time_secs: f32,
    pub note: Option<Note>,
    pub estimate: Option<PitchEstimate>,
}

/// Run the detection pipeline over a WAV file and print the timeline of
/// note changes. Same spectrum, peak scan, and quantizer as the live
/// path, one frame per `fft_size` samples, no overlap.
pub fn analyze(path: &Path, config: &AppConfig) -> Result<()> {
    let (samples, sample_rate) = wav::load_mono(path)?;
    let detection = config.detection();
    let frame_size = detection.spectrum.fft_size;

    println!(
        "{}",
        style(format!("{} ({sample_rate} Hz)", path.display())).bold()
    );
    println!();

    if samples.len() < frame_size {
        eprintln!(
            "  {} File is shorter than one analysis frame ({frame_size} samples); nothing to analyze.",
            style("WARNING").red().bold()
        );
        return Ok(());
    }

    let changes = detect_changes(&samples, sample_rate, &detection);
    let mut segments = 0usize;

    for change in &changes {
        match (change.note, change.estimate) {
            (Some(note), Some(est)) => {
                segments += 1;
                println!(
                    "  {:6.2}s  {}  {:.1} Hz  amp {:.0}",
                    change.time_secs,
                    style(note.to_string()).cyan().bold(),
                    est.frequency_hz,
                    est.amplitude
                );
            }
            _ => println!("  {:6.2}s  {}", change.time_secs, style("---").dim()),
        }
    }

    let duration = samples.len() as f32 / sample_rate as f32;
    println!();
    println!("  {segments} note segment(s) across {duration:.1}s.");

    Ok(())
}

/// The offline counterpart of the live analysis loop: one cycle per
/// frame, recording only the frames where the quantized note changed.
fn detect_changes(samples: &[f32], sample_rate: u32, config: &DetectionConfig) -> Vec<Change> {
    let frame_size = config.spectrum.fft_size;
    let mut spectrum = SpectrumAnalyzer::new(config.spectrum.clone());

    let mut changes = Vec::new();
    let mut current: Option<Note> = None;

    for (index, frame) in samples.chunks_exact(frame_size).enumerate() {
        let time_secs = (index * frame_size) as f32 / sample_rate as f32;
        let magnitudes = spectrum.process(frame);
        let estimate = peak::find_band_peak(magnitudes, sample_rate, &config.band);
        let note = estimate
            .and_then(|est| Note::from_frequency(est.frequency_hz, config.reference_a4_hz));

        if note != current {
            changes.push(Change {
                time_secs,
                note,
                estimate,
            });
            current = note;
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::PitchClass;
    use std::f32::consts::PI;

    const SAMPLE_RATE: u32 = 44100;

    fn sine(freq_hz: f32, amplitude: f32, samples: usize) -> Vec<f32> {
        (0..samples)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                amplitude * (2.0 * PI * freq_hz * t).sin()
            })
            .collect()
    }

    #[test]
    fn sustained_tone_is_one_change() {
        let samples = sine(220.0, 0.6, 4096 * 8);
        let changes = detect_changes(&samples, SAMPLE_RATE, &DetectionConfig::default());

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].note, Some(Note::new(PitchClass::A, 3)));
        assert_eq!(changes[0].time_secs, 0.0);
    }

    #[test]
    fn silence_produces_no_changes() {
        let samples = vec![0.0; 4096 * 4];
        let changes = detect_changes(&samples, SAMPLE_RATE, &DetectionConfig::default());
        assert!(changes.is_empty());
    }

    #[test]
    fn tone_then_silence_ends_absent() {
        let mut samples = sine(220.0, 0.6, 4096 * 4);
        samples.extend(vec![0.0; 4096 * 60]);

        let changes = detect_changes(&samples, SAMPLE_RATE, &DetectionConfig::default());
        assert_eq!(changes.first().unwrap().note, Some(Note::new(PitchClass::A, 3)));
        assert_eq!(changes.last().unwrap().note, None);
    }

    #[test]
    fn short_input_yields_nothing() {
        let samples = sine(220.0, 0.6, 100);
        let changes = detect_changes(&samples, SAMPLE_RATE, &DetectionConfig::default());
        assert!(changes.is_empty());
    }
}
