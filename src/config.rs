use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::audio::session::DetectionConfig;
use crate::dsp::peak::BandConfig;
use crate::dsp::spectrum::SpectrumParams;
use crate::instrument::fingerboard::{Fingerboard, InstrumentString};
use crate::instrument::keyboard::Keyboard;
use crate::note::Note;
use crate::paths;

/// Application configuration, loaded from `<config dir>/config.toml`.
///
/// serde's `default` attribute means a field missing from the TOML file
/// takes the value from the Default implementation instead of failing to
/// parse, so the config file is optional and may be partial.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub spectrum: SpectrumConfig,
    pub keyboard: KeyboardConfig,
    pub fingerboard: FingerboardConfig,
}

/// The detection band, gate, and tuning reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Lower edge of the search band in Hz.
    pub band_min_hz: f32,
    /// Upper edge of the search band in Hz.
    pub band_max_hz: f32,
    /// Minimum winning magnitude on the 0-255 spectrum scale. An
    /// empirical constant; `notescope check` helps calibrate it.
    pub amplitude_threshold: f32,
    /// Frequency assigned to A4.
    pub reference_a4_hz: f32,
}

/// Spectrum front-end parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumConfig {
    pub fft_size: usize,
    pub smoothing: f32,
    pub min_db: f32,
    pub max_db: f32,
}

/// Octave window of the visual keyboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    pub low_octave: i32,
    pub high_octave: i32,
}

/// Declarative fingerboard layout: strings low to high, plus the
/// fret-to-finger assignment shared by every string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerboardConfig {
    pub finger_labels: Vec<String>,
    pub strings: Vec<StringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StringConfig {
    /// Open-string note name, e.g. `"E1"`. Flat spellings are accepted.
    pub open: String,
    #[serde(default = "default_frets")]
    pub frets: u32,
}

fn default_frets() -> u32 {
    8
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            band_min_hz: 80.0,
            band_max_hz: 2000.0,
            amplitude_threshold: 80.0,
            reference_a4_hz: 440.0,
        }
    }
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            fft_size: 4096,
            smoothing: 0.8,
            min_db: -100.0,
            max_db: -30.0,
        }
    }
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            low_octave: 3,
            high_octave: 5,
        }
    }
}

impl Default for FingerboardConfig {
    fn default() -> Self {
        // Standard double bass tuning with first-position fingerings.
        Self {
            finger_labels: ["Open", "1", "2", "3", "4", "1", "2", "3", "4"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            strings: ["E1", "A1", "D2", "G2"]
                .iter()
                .map(|open| StringConfig {
                    open: open.to_string(),
                    frets: 8,
                })
                .collect(),
        }
    }
}

impl From<&AnalysisConfig> for BandConfig {
    fn from(cfg: &AnalysisConfig) -> Self {
        BandConfig {
            min_hz: cfg.band_min_hz,
            max_hz: cfg.band_max_hz,
            threshold: cfg.amplitude_threshold,
        }
    }
}

impl From<&SpectrumConfig> for SpectrumParams {
    fn from(cfg: &SpectrumConfig) -> Self {
        SpectrumParams {
            fft_size: cfg.fft_size,
            smoothing: cfg.smoothing,
            min_db: cfg.min_db,
            max_db: cfg.max_db,
        }
    }
}

impl AppConfig {
    /// Bridge into the parameters the detection session runs on.
    pub fn detection(&self) -> DetectionConfig {
        DetectionConfig {
            spectrum: (&self.spectrum).into(),
            band: (&self.analysis).into(),
            reference_a4_hz: self.analysis.reference_a4_hz,
        }
    }

    pub fn build_keyboard(&self) -> Result<Keyboard> {
        ensure!(
            self.keyboard.low_octave <= self.keyboard.high_octave,
            "keyboard.low_octave must not exceed keyboard.high_octave"
        );
        Ok(Keyboard::new(
            self.keyboard.low_octave,
            self.keyboard.high_octave,
        ))
    }

    pub fn build_fingerboard(&self) -> Result<Fingerboard> {
        let mut strings = Vec::with_capacity(self.fingerboard.strings.len());
        for entry in &self.fingerboard.strings {
            let open: Note = entry
                .open
                .parse()
                .with_context(|| format!("bad open-string note {:?}", entry.open))?;
            let string = InstrumentString::new(open, entry.frets, &self.fingerboard.finger_labels)
                .with_context(|| format!("bad string configuration for {:?}", entry.open))?;
            strings.push(string);
        }
        Ok(Fingerboard::new(strings))
    }
}

/// Load the config from the standard location, falling back to defaults
/// when no file exists. A file that exists but does not parse is a hard
/// error; silently ignoring it would hide typos.
pub fn load_config() -> Result<AppConfig> {
    load_config_from(&paths::config_file())
}

fn load_config_from(path: &Path) -> Result<AppConfig> {
    let config: AppConfig = if path.exists() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("could not read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("could not parse config file: {}", path.display()))?
    } else {
        AppConfig::default()
    };

    ensure!(
        config.spectrum.fft_size.is_power_of_two() && config.spectrum.fft_size >= 32,
        "spectrum.fft_size must be a power of two of at least 32"
    );
    ensure!(
        (0.0..1.0).contains(&config.spectrum.smoothing),
        "spectrum.smoothing must be in [0.0, 1.0)"
    );

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.analysis.band_min_hz, 80.0);
        assert_eq!(cfg.analysis.band_max_hz, 2000.0);
        assert_eq!(cfg.analysis.amplitude_threshold, 80.0);
        assert_eq!(cfg.spectrum.fft_size, 4096);
        assert_eq!(cfg.fingerboard.strings.len(), 4);
        assert_eq!(cfg.fingerboard.finger_labels.len(), 9);
    }

    #[test]
    fn partial_toml_keeps_defaults_elsewhere() {
        let toml_str = r#"
[analysis]
amplitude_threshold = 60.0
"#;
        let cfg: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.analysis.amplitude_threshold, 60.0);
        assert_eq!(cfg.analysis.band_max_hz, 2000.0);
        assert_eq!(cfg.spectrum.fft_size, 4096);
    }

    #[test]
    fn toml_round_trip() {
        let cfg = AppConfig::default();
        let serialized = toml::to_string_pretty(&cfg).unwrap();
        let loaded: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(loaded.analysis.reference_a4_hz, cfg.analysis.reference_a4_hz);
        assert_eq!(loaded.fingerboard.strings.len(), cfg.fingerboard.strings.len());
    }

    #[test]
    fn default_fingerboard_builds() {
        let board = AppConfig::default().build_fingerboard().unwrap();
        assert_eq!(board.strings().len(), 4);
        assert_eq!(board.strings()[0].open_note().to_string(), "E1");
    }

    #[test]
    fn flat_spelled_open_string_is_accepted() {
        let mut cfg = AppConfig::default();
        cfg.fingerboard.strings[0].open = "Eb1".to_string();
        let board = cfg.build_fingerboard().unwrap();
        assert_eq!(board.strings()[0].open_note().to_string(), "D#1");
    }

    #[test]
    fn bad_open_string_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.fingerboard.strings[0].open = "H1".to_string();
        assert!(cfg.build_fingerboard().is_err());
    }

    #[test]
    fn inverted_keyboard_range_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.keyboard.low_octave = 6;
        cfg.keyboard.high_octave = 3;
        assert!(cfg.build_keyboard().is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg.analysis.amplitude_threshold, 80.0);
    }

    #[test]
    fn file_contents_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[analysis]\nband_min_hz = 100.0").unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.analysis.band_min_hz, 100.0);
        assert_eq!(cfg.analysis.band_max_hz, 2000.0);
    }

    #[test]
    fn invalid_fft_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[spectrum]\nfft_size = 1000\n").unwrap();
        assert!(load_config_from(&path).is_err());
    }

    #[test]
    fn unparsable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not valid toml [").unwrap();
        assert!(load_config_from(&path).is_err());
    }
}
