//! Interleaved 16-bit stereo frames for file and device output.

use bg_ir::AudioBuffer;

/// A stereo audio frame (16-bit integer).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    pub left: i16,
    pub right: i16,
}

/// Convert a float sample in `[-1, 1]` to i16, clipping outside it.
#[inline]
pub fn sample_to_i16(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

impl Frame {
    pub const fn silence() -> Self {
        Self { left: 0, right: 0 }
    }

    pub fn from_f32(left: f32, right: f32) -> Self {
        Self { left: sample_to_i16(left), right: sample_to_i16(right) }
    }

    /// Append `len` frames of `buffer` to `out`. Mono buffers feed both sides.
    pub fn extend_from_buffer(out: &mut Vec<Frame>, buffer: &AudioBuffer, len: usize) {
        let len = len.min(buffer.frames());
        match buffer.channels() {
            0 => out.extend(std::iter::repeat(Frame::silence()).take(len)),
            1 => out.extend(buffer.channel(0)[..len].iter().map(|&s| Frame::from_f32(s, s))),
            _ => {
                let (l, r) = (&buffer.channel(0)[..len], &buffer.channel(1)[..len]);
                out.extend(l.iter().zip(r).map(|(&a, &b)| Frame::from_f32(a, b)));
            }
        }
    }
}
