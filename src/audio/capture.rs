use std::sync::mpsc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use thiserror::Error;

/// How many analysis frames may queue between the audio callback and the
/// analysis thread. When the queue is full the newest frame is dropped;
/// a stale frame has no value once a newer one exists.
const FRAME_QUEUE_DEPTH: usize = 4;

/// Failure to acquire the capture device. Surfaced once from session
/// start; the session stays idle and holds nothing on failure.
///
/// `NoInputDevice` is the "environment cannot capture at all" case.
/// Permission denials show up through the config/build/play variants,
/// depending on the backend.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no audio input device available")]
    NoInputDevice,
    #[error("could not query the input configuration: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),
    #[error("unsupported sample format {0:?}")]
    UnsupportedFormat(SampleFormat),
    #[error("could not open the input stream: {0}")]
    Build(#[from] cpal::BuildStreamError),
    #[error("could not start the input stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
}

/// A running input stream. Dropping it stops the callback and releases
/// the device, which also closes the frame channel.
pub struct InputStream {
    _stream: cpal::Stream,
    pub sample_rate: u32,
    pub device_name: String,
}

/// Open the default input device and stream fixed-size mono frames.
///
/// Multi-channel input is reduced to mono by taking the first channel,
/// and i16 samples are rescaled to [-1.0, 1.0]. Frames are exactly
/// `frame_size` samples long; the tail that has not filled a frame yet
/// stays buffered inside the callback.
pub fn open_input(
    frame_size: usize,
) -> Result<(InputStream, mpsc::Receiver<Vec<f32>>), CaptureError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(CaptureError::NoInputDevice)?;
    let device_name = device.name().unwrap_or_else(|_| "<unknown>".into());

    let config = device.default_input_config()?;
    let sample_rate = config.sample_rate().0;
    let channels = config.channels() as usize;
    let format = config.sample_format();

    let (tx, rx) = mpsc::sync_channel::<Vec<f32>>(FRAME_QUEUE_DEPTH);
    let mut pending: Vec<f32> = Vec::with_capacity(frame_size * 2);

    let err_fn = |err| eprintln!("input stream error: {err}");

    let stream = match format {
        SampleFormat::F32 => device.build_input_stream(
            &config.into(),
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                pending.extend(data.iter().step_by(channels).copied());
                flush_frames(&mut pending, frame_size, &tx);
            },
            err_fn,
            None,
        )?,
        SampleFormat::I16 => device.build_input_stream(
            &config.into(),
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                pending.extend(
                    data.iter()
                        .step_by(channels)
                        .map(|&s| s as f32 / i16::MAX as f32),
                );
                flush_frames(&mut pending, frame_size, &tx);
            },
            err_fn,
            None,
        )?,
        other => return Err(CaptureError::UnsupportedFormat(other)),
    };

    stream.play()?;

    Ok((
        InputStream {
            _stream: stream,
            sample_rate,
            device_name,
        },
        rx,
    ))
}

/// Cut completed frames off the front of the pending buffer and hand
/// them to the analysis thread, dropping frames the thread cannot keep
/// up with.
fn flush_frames(pending: &mut Vec<f32>, frame_size: usize, tx: &mpsc::SyncSender<Vec<f32>>) {
    while pending.len() >= frame_size {
        let frame = pending[..frame_size].to_vec();
        let _ = tx.try_send(frame);
        pending.drain(..frame_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_input_stays_pending() {
        let (tx, rx) = mpsc::sync_channel(4);
        let mut pending = vec![0.5; 100];
        flush_frames(&mut pending, 256, &tx);

        assert_eq!(pending.len(), 100);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn complete_frames_are_cut_in_order() {
        let (tx, rx) = mpsc::sync_channel(4);
        let mut pending: Vec<f32> = (0..600).map(|i| i as f32).collect();
        flush_frames(&mut pending, 256, &tx);

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!(first[0], 0.0);
        assert_eq!(second[0], 256.0);
        assert!(rx.try_recv().is_err());

        // 600 - 2 * 256 samples of tail remain buffered.
        assert_eq!(pending.len(), 88);
    }

    #[test]
    fn frames_are_dropped_when_the_queue_is_full() {
        let (tx, rx) = mpsc::sync_channel(1);
        let mut pending = vec![0.0; 256 * 3];
        flush_frames(&mut pending, 256, &tx);

        // Only one frame fits; the rest were dropped, not queued.
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
        assert!(pending.is_empty());
    }
}
