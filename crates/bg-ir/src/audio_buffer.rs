//! Multichannel f32 audio buffer with planar layout.

use alloc::vec;
use alloc::vec::Vec;

/// Maximum number of audio channels per buffer.
pub const MAX_CHANNELS: u16 = 8;

/// A multichannel f32 audio buffer in planar layout.
///
/// Data is stored as `channels` contiguous planes of `frames` samples each.
/// `data[ch * frames + frame]` gives the sample for channel `ch` at `frame`.
/// Allocation happens only in [`AudioBuffer::new`]; everything else is safe
/// to call from the audio thread.
#[derive(Clone, Debug)]
pub struct AudioBuffer {
    data: Vec<f32>,
    channels: u16,
    frames: usize,
}

impl AudioBuffer {
    /// Create a new silent buffer with the given dimensions.
    pub fn new(channels: u16, frames: usize) -> Self {
        let channels = channels.min(MAX_CHANNELS);
        Self {
            data: vec![0.0; channels as usize * frames],
            channels,
            frames,
        }
    }

    /// Fill all samples with zero.
    pub fn silence(&mut self) {
        self.data.fill(0.0);
    }

    /// Zero `len` frames starting at `start` on every channel.
    pub fn silence_range(&mut self, start: usize, len: usize) {
        let end = (start + len).min(self.frames);
        for ch in 0..self.channels {
            if let Some(range) = self.channel_mut(ch).get_mut(start..end) {
                range.fill(0.0);
            }
        }
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Read-only access to one channel's sample data.
    pub fn channel(&self, ch: u16) -> &[f32] {
        let start = ch as usize * self.frames;
        &self.data[start..start + self.frames]
    }

    /// Mutable access to one channel's sample data.
    pub fn channel_mut(&mut self, ch: u16) -> &mut [f32] {
        let start = ch as usize * self.frames;
        let len = self.frames;
        &mut self.data[start..start + len]
    }

    /// Add a mono sample to every channel at `frame`. Out-of-range frames are ignored.
    #[inline]
    pub fn add_mono(&mut self, frame: usize, value: f32) {
        if frame >= self.frames {
            return;
        }
        for ch in 0..self.channels as usize {
            self.data[ch * self.frames + frame] += value;
        }
    }

    /// Scale all samples by `gain`.
    pub fn apply_gain(&mut self, gain: f32) {
        for s in &mut self.data {
            *s *= gain;
        }
    }

    /// Largest absolute sample value across all channels.
    pub fn peak(&self) -> f32 {
        self.data.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_silent() {
        let buf = AudioBuffer::new(2, 4);
        assert_eq!(buf.channels(), 2);
        assert_eq!(buf.frames(), 4);
        assert_eq!(buf.peak(), 0.0);
    }

    #[test]
    fn add_mono_writes_every_channel() {
        let mut buf = AudioBuffer::new(2, 3);
        buf.add_mono(1, 0.5);
        buf.add_mono(1, 0.25);
        buf.add_mono(9, 1.0);
        assert_eq!(buf.channel(0), &[0.0, 0.75, 0.0]);
        assert_eq!(buf.channel(1), &[0.0, 0.75, 0.0]);
    }

    #[test]
    fn silence_range_clears_only_the_range() {
        let mut buf = AudioBuffer::new(1, 4);
        buf.channel_mut(0).fill(1.0);
        buf.silence_range(1, 2);
        assert_eq!(buf.channel(0), &[1.0, 0.0, 0.0, 1.0]);
        buf.silence_range(3, 10);
        assert_eq!(buf.channel(0), &[1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn apply_gain_scales_all() {
        let mut buf = AudioBuffer::new(2, 1);
        buf.channel_mut(0)[0] = 1.0;
        buf.channel_mut(1)[0] = -0.5;
        buf.apply_gain(2.0);
        assert!((buf.channel(0)[0] - 2.0).abs() < 1e-6);
        assert!((buf.peak() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn channel_count_is_capped() {
        let buf = AudioBuffer::new(32, 2);
        assert_eq!(buf.channels(), MAX_CHANNELS);
    }
}
