//! Per-voice attack/decay amplitude envelope.

/// Level below which the decay phase snaps to zero and the envelope goes idle.
pub const IDLE_THRESHOLD: f32 = 0.001;

/// Shortest allowed attack or decay time, in seconds.
pub const MIN_TIME: f32 = 1.0e-5;

/// Envelope phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Attack,
    Decay,
}

/// Linear-attack, exponential-decay envelope.
///
/// `trigger` always restarts from zero, so retriggering mid-decay drops the
/// level to 0 and ramps up again.
#[derive(Clone, Debug)]
pub struct Envelope {
    stage: Stage,
    level: f32,
    attack_s: f32,
    decay_s: f32,
    sample_rate: f32,
    attack_rate: f32,
    decay_coeff: f32,
}

impl Envelope {
    pub fn new(sample_rate: f32, attack_s: f32, decay_s: f32) -> Self {
        let mut env = Self {
            stage: Stage::Idle,
            level: 0.0,
            attack_s,
            decay_s,
            sample_rate: sample_rate.max(1.0),
            attack_rate: 1.0,
            decay_coeff: 0.0,
        };
        env.recompute();
        env
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
        self.recompute();
    }

    /// Set attack and decay times in seconds. Times are clamped to [`MIN_TIME`]
    /// so the derived rates stay finite.
    pub fn set_parameters(&mut self, attack_s: f32, decay_s: f32) {
        if attack_s == self.attack_s && decay_s == self.decay_s {
            return;
        }
        self.attack_s = attack_s;
        self.decay_s = decay_s;
        self.recompute();
    }

    fn recompute(&mut self) {
        let attack = sanitize_time(self.attack_s);
        let decay = sanitize_time(self.decay_s);
        self.attack_rate = 1.0 / (attack * self.sample_rate);
        self.decay_coeff = (-1.0 / (decay * self.sample_rate)).exp();
    }

    /// Restart from zero in the attack stage.
    pub fn trigger(&mut self) {
        self.stage = Stage::Attack;
        self.level = 0.0;
    }

    /// Advance one sample and return the new level.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            Stage::Idle => return 0.0,
            Stage::Attack => {
                self.level += self.attack_rate;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = Stage::Decay;
                }
            }
            Stage::Decay => {
                self.level *= self.decay_coeff;
                if self.level < IDLE_THRESHOLD {
                    self.level = 0.0;
                    self.stage = Stage::Idle;
                }
            }
        }
        self.level
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn is_active(&self) -> bool {
        self.stage != Stage::Idle
    }
}

fn sanitize_time(t: f32) -> f32 {
    if t.is_finite() {
        t.max(MIN_TIME)
    } else {
        MIN_TIME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_outputs_zero() {
        let mut env = Envelope::new(48_000.0, 0.01, 0.1);
        assert_eq!(env.stage(), Stage::Idle);
        for _ in 0..10 {
            assert_eq!(env.next_sample(), 0.0);
        }
    }

    #[test]
    fn attack_reaches_peak_then_decays() {
        let mut env = Envelope::new(1000.0, 0.01, 0.05);
        env.trigger();
        let mut peak_at = None;
        for i in 0..12 {
            if env.next_sample() >= 1.0 {
                peak_at = Some(i);
                break;
            }
        }
        // 10 ms at 1 kHz is ten increments of 0.1
        assert!(matches!(peak_at, Some(9) | Some(10)));
        assert_eq!(env.stage(), Stage::Decay);
        let next = env.next_sample();
        assert!(next < 1.0 && next > 0.9);
    }

    #[test]
    fn level_stays_in_unit_range_and_goes_idle() {
        let mut env = Envelope::new(48_000.0, 0.001, 0.01);
        env.trigger();
        for _ in 0..48_000 {
            let v = env.next_sample();
            assert!((0.0..=1.0).contains(&v));
        }
        assert_eq!(env.stage(), Stage::Idle);
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn retrigger_restarts_from_zero() {
        let mut env = Envelope::new(48_000.0, 0.01, 0.5);
        env.trigger();
        for _ in 0..1000 {
            env.next_sample();
        }
        assert!(env.level() > 0.5);
        env.trigger();
        assert_eq!(env.level(), 0.0);
        assert_eq!(env.stage(), Stage::Attack);
        assert!(env.next_sample() < 0.01);
    }

    #[test]
    fn zero_and_nan_times_stay_finite() {
        let mut env = Envelope::new(48_000.0, 0.0, f32::NAN);
        env.trigger();
        let first = env.next_sample();
        assert_eq!(first, 1.0);
        let second = env.next_sample();
        assert!(second.is_finite());
        env.set_parameters(-1.0, 0.0);
        env.trigger();
        assert!(env.next_sample().is_finite());
    }
}
