//! Noise percussion: a high-passed hat and a low-passed clap.

use super::Voice;
use crate::dsp::{Noise, OnePole};
use crate::envelope::Envelope;

fn hat_shape(filter: &mut OnePole, x: f32) -> f32 {
    filter.highpass(x, 0.8)
}

fn clap_shape(filter: &mut OnePole, x: f32) -> f32 {
    filter.lowpass(x, 0.2)
}

macro_rules! noise_voice {
    ($(#[$doc:meta])* $name:ident, $track:expr, $attack:expr, $decay:expr, $shape:ident) => {
        $(#[$doc])*
        pub struct $name {
            env: Envelope,
            noise: Noise,
            filter: OnePole,
            velocity: f32,
            gain: f32,
        }

        impl $name {
            pub fn new(sample_rate: f32, seed: u64) -> Self {
                Self {
                    env: Envelope::new(sample_rate, $attack, $decay),
                    noise: Noise::new(seed),
                    filter: OnePole::default(),
                    velocity: 0.0,
                    gain: $track.default_gain(),
                }
            }

            pub fn set_gain(&mut self, gain: f32) {
                self.gain = gain;
            }

            pub fn reseed(&mut self, seed: u64) {
                self.noise.reseed(seed);
            }
        }

        impl Voice for $name {
            fn prepare(&mut self, sample_rate: f32) {
                self.env.set_sample_rate(sample_rate);
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
                let level = self.env.next_sample();
                let shaped = $shape(&mut self.filter, self.noise.next());
                shaped * level * self.velocity * self.gain
            }
        }
    };
}

noise_voice!(
    /// Closed hat: white noise minus its low-passed copy, short decay.
    HatVoice,
    bg_ir::TrackId::Hat,
    0.001,
    0.05,
    hat_shape
);

noise_voice!(
    /// Clap: dull low-passed noise burst.
    ClapVoice,
    bg_ir::TrackId::Clap,
    0.001,
    0.2,
    clap_shape
);
