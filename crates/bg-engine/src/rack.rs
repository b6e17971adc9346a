//! The fixed set of drum voices and their per-sample mix.

use bg_ir::{AudioBuffer, Pattern, TrackId};

use crate::dsp::Smoothed;
use crate::params::ParamValues;
use crate::voices::{BassParams, BassVoice, ClapVoice, HatVoice, KickParams, KickVoice, Voice};

/// One voice per track, mixed to mono and written to every output channel.
pub struct VoiceRack {
    kick: KickVoice,
    bass: BassVoice,
    hat: HatVoice,
    clap: ClapVoice,
    sidechain: Smoothed,
}

impl VoiceRack {
    pub fn new(sample_rate: f32, seed: u64) -> Self {
        let mut rack = Self {
            kick: KickVoice::new(sample_rate, 0),
            bass: BassVoice::new(sample_rate),
            hat: HatVoice::new(sample_rate, 0),
            clap: ClapVoice::new(sample_rate, 0),
            sidechain: Smoothed::new(ParamValues::default().sidechain, sample_rate),
        };
        rack.reseed(seed);
        rack
    }

    /// Derive distinct noise streams for each voice from one seed.
    pub fn reseed(&mut self, seed: u64) {
        self.kick.reseed(seed.wrapping_add(1));
        self.hat.reseed(seed.wrapping_add(2));
        self.clap.reseed(seed.wrapping_add(3));
    }

    pub fn prepare(&mut self, sample_rate: f32) {
        self.kick.prepare(sample_rate);
        self.bass.prepare(sample_rate);
        self.hat.prepare(sample_rate);
        self.clap.prepare(sample_rate);
        self.sidechain.set_sample_rate(sample_rate);
    }

    /// Push block-rate settings: sound parameters and per-track gains.
    pub fn configure(&mut self, params: &ParamValues, pattern: &Pattern) {
        self.kick.set_params(KickParams {
            pitch_hz: params.kick_pitch,
            decay_s: params.kick_decay,
            click: params.kick_click,
        });
        self.bass.set_params(BassParams {
            cutoff_hz: params.bass_cutoff,
            drive: params.bass_drive,
            attack_s: params.bass_attack,
            decay_s: params.bass_decay,
        });
        self.sidechain.set_target(params.sidechain);

        self.kick.set_gain(pattern.track(TrackId::Kick).gain());
        self.bass.set_gain(pattern.track(TrackId::Bass).gain());
        self.hat.set_gain(pattern.track(TrackId::Hat).gain());
        self.clap.set_gain(pattern.track(TrackId::Clap).gain());
    }

    /// Start a note on `track`'s voice.
    ///
    /// `note` retunes the bass; `glide` is the slide length in samples when
    /// the step carries a glide.
    pub fn fire(&mut self, track: TrackId, velocity: f32, note: u8, glide: Option<u32>) {
        match track {
            TrackId::Kick => self.kick.trigger(velocity),
            TrackId::Bass => match glide {
                Some(samples) => self.bass.glide_to(note, samples, velocity),
                None => {
                    self.bass.set_note(note);
                    self.bass.trigger(velocity);
                }
            },
            TrackId::Hat => self.hat.trigger(velocity),
            TrackId::Clap => self.clap.trigger(velocity),
        }
    }

    pub fn is_active(&self, track: TrackId) -> bool {
        match track {
            TrackId::Kick => self.kick.is_active(),
            TrackId::Bass => self.bass.is_active(),
            TrackId::Hat => self.hat.is_active(),
            TrackId::Clap => self.clap.is_active(),
        }
    }

    /// Mix `len` samples into `output` from frame `start`.
    pub fn render(&mut self, output: &mut AudioBuffer, start: usize, len: usize) {
        for i in 0..len {
            let kick = self.kick.next_sample();
            let amount = self.sidechain.next();
            self.bass.set_duck(1.0 - self.kick.envelope_level() * amount);
            let mix = kick + self.bass.next_sample() + self.hat.next_sample() + self.clap.next_sample();
            output.add_mono(start + i, mix);
        }
    }
}
