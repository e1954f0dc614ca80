use std::path::Path;

use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader};

/// Load a WAV file as mono f32 samples in [-1.0, 1.0].
///
/// Multi-channel files are reduced to mono by taking the first channel,
/// the same reduction the live capture path applies. Returns the samples
/// and the file's sample rate.
pub fn load_mono(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader = WavReader::open(path)
        .with_context(|| format!("could not open WAV file: {}", path.display()))?;

    let spec = reader.spec();
    let channels = spec.channels as usize;

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Int => {
            let full_scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<hound::Result<Vec<_>>>()
                .context("could not read WAV samples")?
        }
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<hound::Result<Vec<_>>>()
            .context("could not read WAV samples")?,
    };

    let mono = if channels > 1 {
        samples.into_iter().step_by(channels).collect()
    } else {
        samples
    };

    Ok((mono, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    fn write_wav(path: &Path, channels: u16, samples: &[i16]) {
        let spec = WavSpec {
            channels,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &sample in samples {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn loads_mono_int_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, 1, &[0, i16::MAX / 2, i16::MIN / 2]);

        let (samples, rate) = load_mono(&path).unwrap();
        assert_eq!(rate, 44100);
        assert_eq!(samples.len(), 3);
        assert!((samples[1] - 0.5).abs() < 0.001);
        assert!((samples[2] + 0.5).abs() < 0.001);
    }

    #[test]
    fn stereo_keeps_the_first_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        // Interleaved L/R pairs; only the left channel should survive.
        write_wav(&path, 2, &[100, -100, 200, -200, 300, -300]);

        let (samples, _) = load_mono(&path).unwrap();
        assert_eq!(samples.len(), 3);
        assert!(samples.iter().all(|&s| s > 0.0));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = load_mono(Path::new("/nonexistent/notescope-test.wav"));
        assert!(result.is_err());
    }
}
