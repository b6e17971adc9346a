//! Drum voices, one per track.
//!
//! Each voice owns its envelope and oscillator state and renders additively
//! into the engine's output. Voices never allocate after construction.

mod bass;
mod kick;
mod noise;

pub use bass::{BassParams, BassVoice};
pub use kick::{KickParams, KickVoice};
pub use noise::{ClapVoice, HatVoice};

use bg_ir::AudioBuffer;

/// A sound generator the scheduler can trigger.
pub trait Voice: Send {
    /// Reset rate-dependent state for a new sample rate.
    fn prepare(&mut self, sample_rate: f32);

    /// Start a new note. `velocity` scales the output amplitude.
    fn trigger(&mut self, velocity: f32);

    /// Whether the amplitude envelope is still sounding.
    fn is_active(&self) -> bool;

    /// Produce one mono sample. Idle voices return 0.0 without running DSP.
    fn next_sample(&mut self) -> f32;

    /// Add `len` samples into every channel of `output`, starting at frame `start`.
    fn render(&mut self, output: &mut AudioBuffer, start: usize, len: usize) {
        if !self.is_active() {
            return;
        }
        for i in 0..len {
            let s = self.next_sample();
            output.add_mono(start + i, s);
        }
    }
}
