//! Momentary performance effects applied after the voices.
//!
//! Each effect is held on while its parameter is above a threshold:
//! stutter loops the last sixteenth note, sweep high-passes with a cutoff
//! that rises with the amount, bitcrush quantises and sample-holds.

use bg_ir::AudioBuffer;

use crate::dsp::{cutoff_coeff, OnePole};
use crate::params::ParamValues;

const FX_CHANNELS: usize = 2;

pub const STUTTER_THRESHOLD: f32 = 0.5;
pub const SWEEP_THRESHOLD: f32 = 0.01;
pub const BITCRUSH_THRESHOLD: f32 = 0.5;

const SWEEP_MIN_HZ: f32 = 20.0;
const SWEEP_MAX_HZ: f32 = 20_000.0;
const SWEEP_RANGE: f32 = 500.0;
const CRUSH_BITS: i32 = 4;
const CRUSH_HOLD: u32 = 4;

/// Captures one loop's worth of audio, then replays it in place of the input.
pub struct Stutter {
    buffer: [Vec<f32>; FX_CHANNELS],
    sample_rate: f32,
    write_pos: usize,
    read_offset: usize,
    loop_len: usize,
    captured: usize,
    capturing: bool,
    playing: bool,
}

impl Stutter {
    /// Allocates a one-second capture buffer.
    pub fn new(sample_rate: f32) -> Self {
        let len = (sample_rate.max(1.0) as usize).max(1);
        Self {
            buffer: [vec![0.0; len], vec![0.0; len]],
            sample_rate,
            write_pos: 0,
            read_offset: 0,
            loop_len: 0,
            captured: 0,
            capturing: false,
            playing: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.capturing || self.playing
    }

    /// Begin capturing a sixteenth note at `bpm`.
    pub fn activate(&mut self, bpm: f64) {
        let samples_per_beat = 60.0 / bpm * self.sample_rate as f64;
        let len = (samples_per_beat / 4.0) as usize;
        self.loop_len = len.min(self.buffer[0].len());
        if self.loop_len > 0 {
            self.capturing = true;
            self.playing = false;
            self.captured = 0;
            self.read_offset = 0;
        }
    }

    pub fn deactivate(&mut self) {
        self.capturing = false;
        self.playing = false;
    }

    pub fn process(&mut self, output: &mut AudioBuffer, start: usize, len: usize) {
        let cap = self.buffer[0].len();
        let channels = (output.channels() as usize).min(FX_CHANNELS);
        for i in start..start + len {
            if self.capturing {
                for ch in 0..channels {
                    self.buffer[ch][self.write_pos] = output.channel(ch as u16)[i];
                }
                self.write_pos = (self.write_pos + 1) % cap;
                self.captured += 1;
                if self.captured >= self.loop_len {
                    self.capturing = false;
                    self.playing = true;
                    self.read_offset = 0;
                }
            }
            if self.playing {
                let loop_start = (self.write_pos + cap - self.loop_len) % cap;
                let read = (loop_start + self.read_offset) % cap;
                for ch in 0..channels {
                    output.channel_mut(ch as u16)[i] = self.buffer[ch][read];
                }
                self.read_offset = (self.read_offset + 1) % self.loop_len;
            }
        }
    }
}

/// One-pole high-pass with a cutoff swept exponentially by the amount.
#[derive(Default)]
pub struct SweepFilter {
    filters: [OnePole; FX_CHANNELS],
}

/// Sweep cutoff for an amount in `[0, 1]`: `20 * 500^amount` Hz.
pub fn sweep_cutoff(amount: f32) -> f32 {
    (SWEEP_MIN_HZ * SWEEP_RANGE.powf(amount)).clamp(SWEEP_MIN_HZ, SWEEP_MAX_HZ)
}

impl SweepFilter {
    pub fn process(&mut self, output: &mut AudioBuffer, start: usize, len: usize, amount: f32, sample_rate: f32) {
        let coeff = cutoff_coeff(sweep_cutoff(amount), sample_rate);
        let channels = (output.channels() as usize).min(FX_CHANNELS);
        for ch in 0..channels {
            let filter = &mut self.filters[ch];
            for s in &mut output.channel_mut(ch as u16)[start..start + len] {
                *s = filter.highpass(*s, coeff);
            }
        }
    }

    pub fn reset(&mut self) {
        self.filters.iter_mut().for_each(OnePole::reset);
    }
}

/// 4-bit quantiser with a 4-sample hold.
#[derive(Default)]
pub struct Bitcrush {
    held: [f32; FX_CHANNELS],
    counter: u32,
}

impl Bitcrush {
    pub fn process(&mut self, output: &mut AudioBuffer, start: usize, len: usize) {
        let levels = (1 << CRUSH_BITS) as f32;
        let channels = (output.channels() as usize).min(FX_CHANNELS);
        for i in start..start + len {
            let hold = self.counter % CRUSH_HOLD != 0;
            for ch in 0..channels {
                let s = &mut output.channel_mut(ch as u16)[i];
                if hold {
                    *s = self.held[ch];
                } else {
                    let q = (*s * levels).round() / levels;
                    self.held[ch] = q;
                    *s = q;
                }
            }
            self.counter = self.counter.wrapping_add(1);
        }
    }
}

/// The three effects in processing order.
pub struct PunchInFx {
    pub stutter: Stutter,
    pub sweep: SweepFilter,
    pub crush: Bitcrush,
    sample_rate: f32,
}

impl PunchInFx {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            stutter: Stutter::new(sample_rate),
            sweep: SweepFilter::default(),
            crush: Bitcrush::default(),
            sample_rate,
        }
    }

    pub fn process(&mut self, output: &mut AudioBuffer, start: usize, len: usize, params: &ParamValues, bpm: f64) {
        if params.fx_stutter > STUTTER_THRESHOLD {
            if !self.stutter.is_active() {
                self.stutter.activate(bpm);
            }
            self.stutter.process(output, start, len);
        } else {
            self.stutter.deactivate();
        }

        if params.fx_sweep > SWEEP_THRESHOLD {
            self.sweep.process(output, start, len, params.fx_sweep, self.sample_rate);
        } else {
            self.sweep.reset();
        }

        if params.fx_bitcrush > BITCRUSH_THRESHOLD {
            self.crush.process(output, start, len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize) -> AudioBuffer {
        let mut buf = AudioBuffer::new(2, frames);
        for ch in 0..2 {
            for (i, s) in buf.channel_mut(ch).iter_mut().enumerate() {
                *s = i as f32 / frames as f32;
            }
        }
        buf
    }

    fn params() -> ParamValues {
        ParamValues { fx_stutter: 0.0, fx_sweep: 0.0, fx_bitcrush: 0.0, ..ParamValues::default() }
    }

    #[test]
    fn inactive_fx_pass_audio_through() {
        let mut fx = PunchInFx::new(48_000.0);
        let mut buf = ramp(256);
        let expected = buf.clone();
        fx.process(&mut buf, 0, 256, &params(), 120.0);
        assert_eq!(buf.channel(0), expected.channel(0));
    }

    #[test]
    fn stutter_repeats_captured_sixteenth() {
        // 1 kHz at 60 BPM: a sixteenth is 250 samples
        let mut fx = PunchInFx::new(1000.0);
        let mut buf = ramp(1000);
        let input = buf.clone();
        let p = ParamValues { fx_stutter: 1.0, ..params() };
        fx.process(&mut buf, 0, 1000, &p, 60.0);
        let out = buf.channel(0);
        let src = input.channel(0);
        assert_eq!(out[..249], src[..249]);
        // From the end of capture on, the captured 250 samples repeat
        assert_eq!(out[249], src[0]);
        assert_eq!(out[250], src[1]);
        assert_eq!(out[499], src[0]);
        assert_eq!(out[749], src[0]);
    }

    #[test]
    fn stutter_release_restores_input() {
        let mut fx = PunchInFx::new(1000.0);
        let on = ParamValues { fx_stutter: 1.0, ..params() };
        let mut buf = ramp(500);
        fx.process(&mut buf, 0, 500, &on, 60.0);
        assert!(fx.stutter.is_active());
        let mut buf = ramp(100);
        let expected = buf.clone();
        fx.process(&mut buf, 0, 100, &params(), 60.0);
        assert!(!fx.stutter.is_active());
        assert_eq!(buf.channel(1), expected.channel(1));
    }

    #[test]
    fn sweep_cutoff_spans_range() {
        assert!((sweep_cutoff(0.0) - 20.0).abs() < 1e-3);
        assert!((sweep_cutoff(1.0) - 10_000.0).abs() < 1.0);
    }

    #[test]
    fn sweep_removes_dc() {
        let mut fx = PunchInFx::new(48_000.0);
        let mut buf = AudioBuffer::new(1, 4096);
        buf.channel_mut(0).fill(0.5);
        let p = ParamValues { fx_sweep: 1.0, ..params() };
        fx.process(&mut buf, 0, 4096, &p, 120.0);
        assert!(buf.channel(0)[4095].abs() < 1e-3);
    }

    #[test]
    fn bitcrush_quantises_and_holds() {
        let mut fx = PunchInFx::new(48_000.0);
        let mut buf = ramp(16);
        let p = ParamValues { fx_bitcrush: 1.0, ..params() };
        fx.process(&mut buf, 0, 16, &p, 120.0);
        let out = buf.channel(0);
        for s in out {
            assert_eq!((s * 16.0).fract(), 0.0);
        }
        assert_eq!(out[1], out[0]);
        assert_eq!(out[3], out[0]);
        assert_eq!(out[4], 0.25);
    }
}
