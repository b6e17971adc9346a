//! CPAL-based audio output backend.
//!
//! The device callback owns a [`FreeRunningTransport`] and a scratch
//! [`AudioBuffer`], and renders straight from the shared engine. It only ever
//! `try_lock`s the engine: if the control side holds the lock (loading a
//! pattern, say) the callback writes silence for that buffer.

use std::sync::Arc;

use bg_engine::{Engine, FreeRunningTransport, TransportSource};
use bg_ir::AudioBuffer;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use parking_lot::Mutex;

use crate::traits::{AudioError, AudioOutput};

/// Largest device buffer rendered in one engine call.
const SCRATCH_FRAMES: usize = 4096;

/// CPAL-based audio output.
pub struct CpalOutput {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
}

impl CpalOutput {
    /// Open the default output device as stereo f32.
    pub fn new() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        if let Ok(name) = device.name() {
            log::info!("audio device: {name}");
        }

        let supported = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceInit(e.to_string()))?;
        if supported.sample_format() != SampleFormat::F32 {
            return Err(AudioError::UnsupportedFormat(format!("{:?}", supported.sample_format())));
        }

        let mut config: StreamConfig = supported.into();
        config.channels = 2;

        Ok(Self { device, config, stream: None })
    }

    /// Prepare `engine` for this device and start a stream that renders it.
    pub fn build_stream(
        &mut self,
        engine: Arc<Mutex<Engine>>,
        mut transport: FreeRunningTransport,
    ) -> Result<(), AudioError> {
        let channels = self.config.channels as usize;
        engine.lock().prepare(self.config.sample_rate.0, SCRATCH_FRAMES);
        let mut scratch = AudioBuffer::new(2, SCRATCH_FRAMES);

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let Some(mut engine) = engine.try_lock() else {
                        data.fill(0.0);
                        return;
                    };
                    for chunk in data.chunks_mut(SCRATCH_FRAMES * channels) {
                        let frames = chunk.len() / channels;
                        let info = transport.next_block(frames);
                        engine.process_frames(info, &mut scratch, frames);
                        interleave(&scratch, chunk, channels);
                    }
                },
                |err| log::error!("audio stream error: {err}"),
                None,
            )
            .map_err(|e| AudioError::StreamCreate(e.to_string()))?;

        stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }
}

/// Copy planar stereo into an interleaved device buffer, zeroing extra channels.
fn interleave(src: &AudioBuffer, dst: &mut [f32], channels: usize) {
    let (left, right) = (src.channel(0), src.channel(1));
    for (i, frame) in dst.chunks_mut(channels).enumerate() {
        for (ch, sample) in frame.iter_mut().enumerate() {
            *sample = match ch {
                0 => left[i],
                1 => right[i],
                _ => 0.0,
            };
        }
    }
}

impl AudioOutput for CpalOutput {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn start(&mut self) -> Result<(), AudioError> {
        if let Some(ref stream) = self.stream {
            stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        if let Some(ref stream) = self.stream {
            stream.pause().map_err(|e| AudioError::Playback(e.to_string()))?;
        }
        Ok(())
    }
}
