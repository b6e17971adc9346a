//! Sine kick with a pitch sweep and a noise click.

use core::f32::consts::TAU;

use super::Voice;
use crate::dsp::{Noise, Phasor, Smoothed};
use crate::envelope::Envelope;

const AMP_ATTACK_S: f32 = 0.001;
const PITCH_ENV: (f32, f32) = (0.0001, 0.05);
const CLICK_ENV: (f32, f32) = (0.0001, 0.005);
/// Peak pitch multiplier above the base frequency at the start of the sweep.
const SWEEP_DEPTH: f32 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KickParams {
    pub pitch_hz: f32,
    pub decay_s: f32,
    pub click: f32,
}

impl Default for KickParams {
    fn default() -> Self {
        Self { pitch_hz: 60.0, decay_s: 0.4, click: 0.5 }
    }
}

pub struct KickVoice {
    sample_rate: f32,
    amp_env: Envelope,
    pitch_env: Envelope,
    click_env: Envelope,
    phasor: Phasor,
    noise: Noise,
    pitch: Smoothed,
    click: f32,
    velocity: f32,
    gain: f32,
}

impl KickVoice {
    pub fn new(sample_rate: f32, seed: u64) -> Self {
        let p = KickParams::default();
        Self {
            sample_rate,
            amp_env: Envelope::new(sample_rate, AMP_ATTACK_S, p.decay_s),
            pitch_env: Envelope::new(sample_rate, PITCH_ENV.0, PITCH_ENV.1),
            click_env: Envelope::new(sample_rate, CLICK_ENV.0, CLICK_ENV.1),
            phasor: Phasor::default(),
            noise: Noise::new(seed),
            pitch: Smoothed::new(p.pitch_hz, sample_rate),
            click: p.click,
            velocity: 0.0,
            gain: bg_ir::TrackId::Kick.default_gain(),
        }
    }

    pub fn set_params(&mut self, params: KickParams) {
        self.pitch.set_target(params.pitch_hz);
        self.amp_env.set_parameters(AMP_ATTACK_S, params.decay_s);
        self.click = params.click.clamp(0.0, 1.0);
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
    }

    pub fn reseed(&mut self, seed: u64) {
        self.noise.reseed(seed);
    }

    /// Amplitude envelope level after the most recent sample, used for sidechain ducking.
    pub fn envelope_level(&self) -> f32 {
        self.amp_env.level()
    }
}

impl Voice for KickVoice {
    fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.amp_env.set_sample_rate(sample_rate);
        self.pitch_env.set_sample_rate(sample_rate);
        self.click_env.set_sample_rate(sample_rate);
        self.pitch.set_sample_rate(sample_rate);
    }

    fn trigger(&mut self, velocity: f32) {
        self.velocity = velocity;
        self.phasor.reset();
        self.amp_env.trigger();
        self.pitch_env.trigger();
        self.click_env.trigger();
    }

    fn is_active(&self) -> bool {
        self.amp_env.is_active()
    }

    #[inline]
    fn next_sample(&mut self) -> f32 {
        if !self.amp_env.is_active() {
            return 0.0;
        }
        let amp = self.amp_env.next_sample();
        let sweep = self.pitch_env.next_sample();
        let click_level = self.click_env.next_sample();

        let freq = self.pitch.next() * (1.0 + SWEEP_DEPTH * sweep);
        self.phasor.set_frequency(freq, self.sample_rate);
        let body = (TAU * self.phasor.tick()).sin();
        let click = self.noise.next() * click_level * self.click;

        (body + click) * amp * self.velocity * self.gain
    }
}
