//! Edit commands sent from the control side to the audio thread.

use crate::step::Modifier;

/// A pattern mutation.
///
/// Indices are raw `usize`s because commands come from untrusted UI input;
/// [`Pattern::apply`](crate::Pattern::apply) bounds-checks them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    ToggleStep { track: usize, step: usize, active: bool },
    SetVelocity { track: usize, step: usize, velocity: f32 },
    SetProbability { track: usize, step: usize, probability: f32 },
    SetModifier { track: usize, step: usize, modifier: Modifier },
    SetTrackGain { track: usize, gain: f32 },
    SetTrackNote { track: usize, note: u8 },
}

impl Command {
    /// The track this command addresses.
    pub fn track(&self) -> usize {
        match *self {
            Command::ToggleStep { track, .. }
            | Command::SetVelocity { track, .. }
            | Command::SetProbability { track, .. }
            | Command::SetModifier { track, .. }
            | Command::SetTrackGain { track, .. }
            | Command::SetTrackNote { track, .. } => track,
        }
    }
}

/// Why a command was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("track index {0} out of range")]
    TrackOutOfRange(usize),
    #[error("step index {0} out of range")]
    StepOutOfRange(usize),
    #[error("value is not finite")]
    NonFinite,
}
