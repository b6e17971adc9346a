//! Filtered sawtooth bass with drive, glide and sidechain ducking.

use super::Voice;
use crate::dsp::{cutoff_coeff, soft_clip, OnePole, Phasor, Smoothed};
use crate::envelope::Envelope;

/// Drive maps `[0, 1]` onto a pre-clip gain of `1..=10`.
const DRIVE_RANGE: f32 = 9.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BassParams {
    pub cutoff_hz: f32,
    pub drive: f32,
    pub attack_s: f32,
    pub decay_s: f32,
}

impl Default for BassParams {
    fn default() -> Self {
        Self { cutoff_hz: 200.0, drive: 0.0, attack_s: 0.01, decay_s: 0.4 }
    }
}

pub struct BassVoice {
    sample_rate: f32,
    env: Envelope,
    phasor: Phasor,
    filter: OnePole,
    cutoff: Smoothed,
    drive: Smoothed,
    freq: f32,
    glide_target: f32,
    glide_ratio: f32,
    glide_remaining: u32,
    velocity: f32,
    gain: f32,
    duck: f32,
}

impl BassVoice {
    pub fn new(sample_rate: f32) -> Self {
        let p = BassParams::default();
        let freq = bg_ir::note_to_hz(bg_ir::TrackId::Bass.default_note());
        Self {
            sample_rate,
            env: Envelope::new(sample_rate, p.attack_s, p.decay_s),
            phasor: Phasor::default(),
            filter: OnePole::default(),
            cutoff: Smoothed::new(p.cutoff_hz, sample_rate),
            drive: Smoothed::new(p.drive, sample_rate),
            freq,
            glide_target: freq,
            glide_ratio: 1.0,
            glide_remaining: 0,
            velocity: 0.0,
            gain: bg_ir::TrackId::Bass.default_gain(),
            duck: 1.0,
        }
    }

    pub fn set_params(&mut self, params: BassParams) {
        self.cutoff.set_target(params.cutoff_hz);
        self.drive.set_target(params.drive.clamp(0.0, 1.0));
        self.env.set_parameters(params.attack_s, params.decay_s);
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
    }

    /// Jump straight to `note`, cancelling any glide in progress.
    pub fn set_note(&mut self, note: u8) {
        self.freq = bg_ir::note_to_hz(note);
        self.glide_target = self.freq;
        self.glide_remaining = 0;
    }

    /// Slide exponentially from the current frequency to `note` over `samples`.
    ///
    /// A still-sounding note is continued without retriggering the envelope;
    /// an idle voice starts a fresh note at the target pitch.
    pub fn glide_to(&mut self, note: u8, samples: u32, velocity: f32) {
        if !self.env.is_active() || samples == 0 {
            self.set_note(note);
            self.trigger(velocity);
            return;
        }
        self.velocity = velocity;
        self.glide_target = bg_ir::note_to_hz(note);
        self.glide_ratio = (self.glide_target / self.freq).powf(1.0 / samples as f32);
        self.glide_remaining = samples;
    }

    /// Gain applied after the clipper, set per sample by the sidechain.
    #[inline]
    pub fn set_duck(&mut self, duck: f32) {
        self.duck = duck;
    }

    pub fn frequency(&self) -> f32 {
        self.freq
    }
}

impl Voice for BassVoice {
    fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.env.set_sample_rate(sample_rate);
        self.cutoff.set_sample_rate(sample_rate);
        self.drive.set_sample_rate(sample_rate);
    }

    fn trigger(&mut self, velocity: f32) {
        self.velocity = velocity;
        self.env.trigger();
    }

    fn is_active(&self) -> bool {
        self.env.is_active()
    }

    #[inline]
    fn next_sample(&mut self) -> f32 {
        if !self.env.is_active() {
            return 0.0;
        }
        if self.glide_remaining > 0 {
            self.glide_remaining -= 1;
            self.freq = if self.glide_remaining == 0 {
                self.glide_target
            } else {
                self.freq * self.glide_ratio
            };
        }

        self.phasor.set_frequency(self.freq, self.sample_rate);
        let raw = self.phasor.tick() * 2.0 - 1.0;
        let coeff = cutoff_coeff(self.cutoff.next(), self.sample_rate);
        let filtered = self.filter.lowpass(raw, coeff);
        let level = self.env.next_sample();

        let drive_gain = 1.0 + self.drive.next() * DRIVE_RANGE;
        let sample = filtered * level * self.velocity * self.gain;
        soft_clip(sample * drive_gain) * self.duck.max(0.0)
    }
}
