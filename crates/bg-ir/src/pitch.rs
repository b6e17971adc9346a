//! MIDI note to frequency conversion.

/// Concert A.
pub const A4_HZ: f32 = 440.0;

/// Equal-tempered frequency of a MIDI note: `440 * 2^((note - 69) / 12)`.
pub fn note_to_hz(note: u8) -> f32 {
    A4_HZ * libm::exp2f((note as f32 - 69.0) / 12.0)
}
