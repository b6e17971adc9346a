//! Small DSP building blocks shared by the voices and FX.

use core::f32::consts::TAU;

/// Phase accumulator wrapping in `[0, 1)`.
#[derive(Clone, Debug, Default)]
pub struct Phasor {
    phase: f32,
    increment: f32,
}

impl Phasor {
    pub fn set_frequency(&mut self, hz: f32, sample_rate: f32) {
        self.increment = hz / sample_rate;
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Return the current phase, then advance.
    #[inline]
    pub fn tick(&mut self) -> f32 {
        let out = self.phase;
        self.phase += self.increment;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }
        out
    }
}

/// One-pole low-pass: `y += a * (x - y)`.
#[derive(Clone, Debug, Default)]
pub struct OnePole {
    state: f32,
}

impl OnePole {
    #[inline]
    pub fn lowpass(&mut self, input: f32, coeff: f32) -> f32 {
        self.state += coeff * (input - self.state);
        self.state
    }

    /// Input minus its low-passed copy.
    #[inline]
    pub fn highpass(&mut self, input: f32, coeff: f32) -> f32 {
        input - self.lowpass(input, coeff)
    }

    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}

/// Filter coefficient for a cutoff in Hz, clamped to `[0, 1]`.
#[inline]
pub fn cutoff_coeff(cutoff_hz: f32, sample_rate: f32) -> f32 {
    (TAU * cutoff_hz / sample_rate).clamp(0.0, 1.0)
}

/// Rational soft clipper, `x / (1 + |x|)`.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    x / (1.0 + x.abs())
}

/// Linear-ramp parameter smoother.
#[derive(Clone, Debug)]
pub struct Smoothed {
    current: f32,
    target: f32,
    step: f32,
    remaining: u32,
    ramp_len: u32,
}

/// Default smoothing ramp length.
pub const SMOOTHING_SECONDS: f32 = 0.05;

impl Smoothed {
    pub fn new(value: f32, sample_rate: f32) -> Self {
        let mut s = Self { current: value, target: value, step: 0.0, remaining: 0, ramp_len: 1 };
        s.set_sample_rate(sample_rate);
        s
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.ramp_len = ((SMOOTHING_SECONDS * sample_rate).round() as u32).max(1);
    }

    /// Start ramping toward `target`. Setting the current target again is a no-op.
    pub fn set_target(&mut self, target: f32) {
        if target == self.target {
            return;
        }
        self.target = target;
        self.remaining = self.ramp_len;
        self.step = (target - self.current) / self.ramp_len as f32;
    }

    /// Jump straight to `value`.
    pub fn reset(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.remaining = 0;
    }

    #[inline]
    pub fn next(&mut self) -> f32 {
        if self.remaining > 0 {
            self.remaining -= 1;
            self.current = if self.remaining == 0 { self.target } else { self.current + self.step };
        }
        self.current
    }

    pub fn current(&self) -> f32 {
        self.current
    }
}

/// Seeded white noise in `[-1, 1)`.
#[derive(Clone, Debug)]
pub struct Noise {
    rng: fastrand::Rng,
}

impl Noise {
    pub fn new(seed: u64) -> Self {
        Self { rng: fastrand::Rng::with_seed(seed) }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng.seed(seed);
    }

    #[inline]
    pub fn next(&mut self) -> f32 {
        self.rng.f32() * 2.0 - 1.0
    }
}
