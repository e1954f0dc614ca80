use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::audio::capture;
use crate::config::AppConfig;
use crate::dsp::peak::{self, BandConfig};
use crate::dsp::spectrum::SpectrumAnalyzer;

const CAPTURE_SECONDS: u64 = 2;

/// Measure ambient room noise against the detection threshold.
///
/// Runs the exact live pipeline for a couple of seconds with the
/// amplitude gate disabled and reports the loudest in-band magnitude it
/// saw. The threshold is an empirical constant; this is the calibration
/// aid for picking it.
pub fn run(config: &AppConfig) -> Result<()> {
    let (stream, frames) = capture::open_input(config.spectrum.fft_size)?;

    println!("  Device:  {}", style(&stream.device_name).cyan().bold());
    println!("  Rate:    {} Hz", stream.sample_rate);
    println!();
    println!("  Stay quiet for {CAPTURE_SECONDS} seconds so ambient noise can be measured.");
    println!();

    let pb = ProgressBar::new(CAPTURE_SECONDS * 10);
    pb.set_style(
        ProgressStyle::with_template("  Measuring {bar:30.green/dim} {elapsed_precise}").unwrap(),
    );

    let mut spectrum = SpectrumAnalyzer::new((&config.spectrum).into());
    // Accept every in-band bin; the gate is the thing being calibrated.
    let survey = BandConfig {
        threshold: -1.0,
        ..(&config.analysis).into()
    };

    let mut ambient_peak: f32 = 0.0;
    let start = Instant::now();
    let deadline = Duration::from_secs(CAPTURE_SECONDS);

    while start.elapsed() < deadline {
        match frames.recv_timeout(Duration::from_millis(100)) {
            Ok(frame) => {
                let magnitudes = spectrum.process(&frame);
                if let Some(est) = peak::find_band_peak(magnitudes, stream.sample_rate, &survey) {
                    ambient_peak = ambient_peak.max(est.amplitude);
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        pb.set_position((start.elapsed().as_millis() / 100) as u64);
    }

    drop(stream);
    pb.finish_and_clear();

    let threshold = config.analysis.amplitude_threshold;
    println!("  Ambient band peak:   {ambient_peak:.0} / 255");
    println!("  Detection threshold: {threshold:.0}");
    println!();

    if ambient_peak >= threshold {
        eprintln!(
            "  {} Ambient noise reaches the threshold. Raise amplitude_threshold above {:.0}.",
            style("WARNING").red().bold(),
            ambient_peak
        );
    } else if ambient_peak >= threshold * 0.75 {
        println!(
            "  {} Ambient noise is close to the threshold. Quiet sources may be missed either way.",
            style("NOTE").yellow().bold()
        );
    } else {
        println!(
            "  {} Threshold clears ambient noise comfortably.",
            style("OK").green().bold()
        );
    }

    Ok(())
}
