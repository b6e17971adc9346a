//! Headless controller for beatgrid.
//!
//! Owns the live engine behind a mutex shared with the audio device, plus the
//! engine's control handle, and offers the operations the CLI needs: live
//! playback, pattern editing and persistence, and offline rendering to WAV.

mod wav;

use std::sync::Arc;

use bg_audio::{AudioError, AudioOutput, CpalOutput};
use bg_engine::transport::samples_per_step;
use bg_engine::{Engine, EngineHandle, FreeRunningTransport, TransportControl, TransportSource};
use bg_ir::AudioBuffer;
use parking_lot::Mutex;

pub use bg_engine::{EngineConfig, Frame, ParamId};
pub use bg_ir::{Command, Pattern, PatternTree, TreeError};

pub use wav::{frames_to_wav, write_wav};

/// Beats per bar for bar-based rendering.
pub const BEATS_PER_BAR: u32 = 4;

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error("invalid pattern: {0}")]
    Pattern(#[from] TreeError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Headless sequencer controller.
pub struct Controller {
    config: EngineConfig,
    engine: Arc<Mutex<Engine>>,
    handle: EngineHandle,
    transport: Arc<TransportControl>,
    output: Option<CpalOutput>,
}

impl Controller {
    pub fn new(config: EngineConfig) -> Self {
        let (engine, handle) = Engine::new(config);
        let config = *engine.config();
        Self {
            config,
            engine: Arc::new(Mutex::new(engine)),
            handle,
            transport: TransportControl::new(bg_engine::transport::FALLBACK_BPM),
            output: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // --- Live playback ---

    /// Open the default device and start rendering into it. Idempotent.
    pub fn open_audio(&mut self) -> Result<(), ControllerError> {
        if self.output.is_some() {
            return Ok(());
        }
        let mut output = CpalOutput::new()?;
        output.build_stream(self.engine.clone(), FreeRunningTransport::new(self.transport.clone()))?;
        log::info!("audio running at {} Hz", output.sample_rate());
        self.output = Some(output);
        Ok(())
    }

    /// Close the device stream.
    pub fn close_audio(&mut self) -> Result<(), ControllerError> {
        if let Some(mut output) = self.output.take() {
            output.stop()?;
        }
        Ok(())
    }

    /// Start the transport from step 0, opening the device if needed.
    pub fn play(&mut self) -> Result<(), ControllerError> {
        self.open_audio()?;
        self.transport.set_playing(true);
        log::info!("play at {} BPM", self.transport.bpm());
        Ok(())
    }

    pub fn stop(&mut self) {
        self.transport.set_playing(false);
        log::info!("stop");
    }

    pub fn is_playing(&self) -> bool {
        self.transport.is_playing()
    }

    pub fn set_bpm(&self, bpm: f64) {
        self.transport.set_bpm(bpm);
    }

    pub fn bpm(&self) -> f64 {
        self.transport.bpm()
    }

    // --- Pattern ---

    /// Queue an edit. `false` if the command channel was full.
    pub fn enqueue(&mut self, command: Command) -> bool {
        self.handle.enqueue(command)
    }

    pub fn snapshot(&self) -> Pattern {
        self.handle.read_snapshot()
    }

    pub fn current_step(&self) -> Option<usize> {
        self.handle.current_step()
    }

    pub fn set_param(&self, id: ParamId, value: f32) {
        self.handle.set_param(id, value);
    }

    pub fn param(&self, id: ParamId) -> f32 {
        self.handle.param(id)
    }

    /// Replace the live pattern. Waits for the device callback to release the engine.
    pub fn load_pattern(&self, tree: &PatternTree) -> Result<(), ControllerError> {
        self.engine.lock().deserialize(tree)?;
        Ok(())
    }

    pub fn save_pattern(&self) -> PatternTree {
        self.engine.lock().serialize()
    }

    // --- Offline rendering ---

    /// Render `frames` stereo frames of the current pattern from step 0 at `bpm`.
    ///
    /// Uses a private engine with the same seed and parameters, so the live
    /// engine is not disturbed.
    pub fn render_frames(&self, bpm: f64, frames: usize) -> Result<Vec<Frame>, ControllerError> {
        let (mut engine, offline) = Engine::new(self.config);
        engine.deserialize(&self.save_pattern())?;
        for id in ParamId::ALL {
            offline.set_param(id, self.handle.param(id));
        }

        let control = TransportControl::new(bpm);
        control.set_playing(true);
        let mut transport = FreeRunningTransport::new(control);

        let block = self.config.max_block_size;
        let mut buf = AudioBuffer::new(2, block);
        let mut out = Vec::with_capacity(frames);
        while out.len() < frames {
            let len = (frames - out.len()).min(block);
            engine.process_frames(transport.next_block(len), &mut buf, len);
            Frame::extend_from_buffer(&mut out, &buf, len);
        }
        Ok(out)
    }

    /// Frames spanned by `bars` bars at `bpm`.
    pub fn frames_for_bars(&self, bars: u32, bpm: f64) -> usize {
        let bpm = bg_engine::transport::sanitize_bpm(bpm);
        let step = samples_per_step(bpm, self.config.sample_rate as f64, self.config.steps_per_beat);
        let steps = bars as f64 * (BEATS_PER_BAR * self.config.steps_per_beat) as f64;
        (steps * step).round() as usize
    }

    pub fn render_bars(&self, bars: u32, bpm: f64) -> Result<Vec<Frame>, ControllerError> {
        self.render_frames(bpm, self.frames_for_bars(bars, bpm))
    }

    /// Render `bars` bars and encode them as a WAV file image.
    pub fn render_to_wav(&self, bars: u32, bpm: f64) -> Result<Vec<u8>, ControllerError> {
        let frames = self.render_bars(bars, bpm)?;
        Ok(wav::frames_to_wav(&frames, self.config.sample_rate)?)
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
