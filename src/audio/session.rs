use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;

use crate::audio::capture::{self, CaptureError, InputStream};
use crate::dsp::peak::{self, BandConfig, PitchEstimate};
use crate::dsp::spectrum::{SpectrumAnalyzer, SpectrumParams};
use crate::note::Note;

/// Everything the analysis loop needs, bridged from the application
/// config at session start.
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    pub spectrum: SpectrumParams,
    pub band: BandConfig,
    pub reference_a4_hz: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            spectrum: SpectrumParams::default(),
            band: BandConfig::default(),
            reference_a4_hz: 440.0,
        }
    }
}

/// Single-slot handoff between the analysis loop and its readers.
///
/// The loop is the only writer; readers sample at whatever cadence suits
/// them and always see the freshest value. Values are packed into atomics
/// (note number + 1 in one cell, f32 bits in the others, 0 meaning
/// absent) so no lock is ever taken on the hot path.
struct EstimateSlot {
    note: AtomicU32,
    frequency: AtomicU32,
    amplitude: AtomicU32,
}

impl EstimateSlot {
    fn new() -> EstimateSlot {
        EstimateSlot {
            note: AtomicU32::new(0),
            frequency: AtomicU32::new(0),
            amplitude: AtomicU32::new(0),
        }
    }

    fn publish(&self, estimate: Option<PitchEstimate>, note: Option<Note>) {
        match estimate {
            Some(est) => {
                self.frequency.store(est.frequency_hz.to_bits(), Ordering::Relaxed);
                self.amplitude.store(est.amplitude.to_bits(), Ordering::Relaxed);
            }
            None => {
                self.frequency.store(0, Ordering::Relaxed);
                self.amplitude.store(0, Ordering::Relaxed);
            }
        }
        let packed = note.map_or(0, |n| n.number() as u32 + 1);
        self.note.store(packed, Ordering::Relaxed);
    }

    fn clear(&self) {
        self.publish(None, None);
    }

    fn note(&self) -> Option<Note> {
        match self.note.load(Ordering::Relaxed) {
            0 => None,
            packed => Note::from_number(packed as i32 - 1),
        }
    }

    fn estimate(&self) -> Option<PitchEstimate> {
        let bits = self.frequency.load(Ordering::Relaxed);
        if bits == 0 {
            return None;
        }
        Some(PitchEstimate {
            frequency_hz: f32::from_bits(bits),
            amplitude: f32::from_bits(self.amplitude.load(Ordering::Relaxed)),
        })
    }
}

/// Cheap cloneable read handle onto a session's current result.
#[derive(Clone)]
pub struct EstimateReader {
    slot: Arc<EstimateSlot>,
}

impl EstimateReader {
    /// The latest detected note, or `None` while nothing is sounding.
    pub fn note(&self) -> Option<Note> {
        self.slot.note()
    }

    /// The latest raw frequency estimate behind the note.
    pub fn estimate(&self) -> Option<PitchEstimate> {
        self.slot.estimate()
    }
}

struct Listening {
    stream: InputStream,
    live: Arc<AtomicBool>,
    worker: JoinHandle<()>,
}

/// The continuous capture-and-analysis loop.
///
/// Idle holds nothing; `start` acquires the default input device and
/// spawns the analysis worker, `stop` tears both down and clears the
/// published result. The worker runs one analysis cycle per captured
/// frame, strictly sequentially, and checks a liveness flag before every
/// publish so `stop` is total even with a cycle in flight.
pub struct DetectionSession {
    slot: Arc<EstimateSlot>,
    listening: Option<Listening>,
}

impl DetectionSession {
    pub fn new() -> DetectionSession {
        DetectionSession {
            slot: Arc::new(EstimateSlot::new()),
            listening: None,
        }
    }

    pub fn reader(&self) -> EstimateReader {
        EstimateReader {
            slot: Arc::clone(&self.slot),
        }
    }

    /// Used in tests and by callers inspecting the session state.
    #[allow(dead_code)]
    pub fn is_listening(&self) -> bool {
        self.listening.is_some()
    }

    /// Sample rate of the open stream, `None` while idle.
    pub fn sample_rate(&self) -> Option<u32> {
        self.listening.as_ref().map(|l| l.stream.sample_rate)
    }

    /// Name of the device held by the open stream, `None` while idle.
    pub fn device_name(&self) -> Option<&str> {
        self.listening.as_ref().map(|l| l.stream.device_name.as_str())
    }

    /// Idle to listening. A failure to acquire the device leaves the
    /// session idle with no partial side effects. Calling this while
    /// already listening is a no-op.
    pub fn start(&mut self, config: &DetectionConfig) -> Result<(), CaptureError> {
        if self.listening.is_some() {
            return Ok(());
        }

        let (stream, frames) = capture::open_input(config.spectrum.fft_size)?;
        let live = Arc::new(AtomicBool::new(true));

        let worker = {
            let slot = Arc::clone(&self.slot);
            let live = Arc::clone(&live);
            let config = config.clone();
            let sample_rate = stream.sample_rate;
            std::thread::spawn(move || {
                run_analysis_loop(frames, sample_rate, &config, &slot, &live)
            })
        };

        self.listening = Some(Listening {
            stream,
            live,
            worker,
        });
        Ok(())
    }

    /// Listening to idle. Releases the device, joins the worker, and
    /// clears the published result unconditionally, even when called
    /// before the first frame was ever analyzed.
    pub fn stop(&mut self) {
        if let Some(listening) = self.listening.take() {
            listening.live.store(false, Ordering::Relaxed);
            // Dropping the stream stops the callback and closes the
            // frame channel, which ends the worker's receive loop.
            drop(listening.stream);
            let _ = listening.worker.join();
        }
        self.slot.clear();
    }
}

impl Default for DetectionSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DetectionSession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One analysis cycle per received frame: spectrum, band peak, quantize,
/// publish. Numeric edge cases inside the cycle degrade to an absent
/// estimate; nothing here can take the loop down.
fn run_analysis_loop(
    frames: mpsc::Receiver<Vec<f32>>,
    sample_rate: u32,
    config: &DetectionConfig,
    slot: &EstimateSlot,
    live: &AtomicBool,
) {
    let mut spectrum = SpectrumAnalyzer::new(config.spectrum.clone());

    for frame in frames.iter() {
        if !live.load(Ordering::Relaxed) {
            break;
        }

        let magnitudes = spectrum.process(&frame);
        let estimate = peak::find_band_peak(magnitudes, sample_rate, &config.band);
        let note = estimate
            .and_then(|est| Note::from_frequency(est.frequency_hz, config.reference_a4_hz));

        // Re-check liveness so a stopping session never gets one more
        // estimate published under it.
        if !live.load(Ordering::Relaxed) {
            break;
        }
        slot.publish(estimate, note);
    }
}
