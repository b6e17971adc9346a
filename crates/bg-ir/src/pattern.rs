//! Fixed-size step grid: one track per drum voice, sixteen steps per track.

use arrayvec::ArrayString;

use crate::command::{Command, CommandError};
use crate::step::Step;

/// Steps per track (one bar of sixteenth notes).
pub const NUM_STEPS: usize = 16;

/// Number of tracks in a pattern.
pub const NUM_TRACKS: usize = 4;

/// Maximum stored length of a track name, in bytes.
pub const TRACK_NAME_LEN: usize = 16;

/// Identifies one of the fixed tracks. The discriminant is the track index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackId {
    Kick = 0,
    Bass = 1,
    Hat = 2,
    Clap = 3,
}

impl TrackId {
    /// All tracks in index order.
    pub const ALL: [TrackId; NUM_TRACKS] = [TrackId::Kick, TrackId::Bass, TrackId::Hat, TrackId::Clap];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<TrackId> {
        Self::ALL.get(index).copied()
    }

    /// Whether the track's voice follows the track note.
    pub const fn is_pitched(self) -> bool {
        matches!(self, TrackId::Bass)
    }

    pub const fn default_name(self) -> &'static str {
        match self {
            TrackId::Kick => "Kick",
            TrackId::Bass => "Bass",
            TrackId::Hat => "Hat",
            TrackId::Clap => "Clap",
        }
    }

    pub const fn default_note(self) -> u8 {
        match self {
            TrackId::Kick => 36,
            TrackId::Bass => 36,
            TrackId::Hat => 42,
            TrackId::Clap => 38,
        }
    }

    pub const fn default_gain(self) -> f32 {
        match self {
            TrackId::Kick => 1.0,
            TrackId::Bass => 0.7,
            TrackId::Hat => 0.4,
            TrackId::Clap => 0.6,
        }
    }
}

/// One track: a row of steps plus per-track voice settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Track {
    pub steps: [Step; NUM_STEPS],
    name: ArrayString<TRACK_NAME_LEN>,
    pub note: u8,
    gain: f32,
}

impl Track {
    /// An empty track with the defaults for `id`.
    pub fn new(id: TrackId) -> Self {
        let mut track = Self {
            steps: [Step::default(); NUM_STEPS],
            name: ArrayString::new(),
            note: id.default_note(),
            gain: id.default_gain(),
        };
        track.set_name(id.default_name());
        track
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the name, truncated on a character boundary to fit.
    pub fn set_name(&mut self, name: &str) {
        let mut end = name.len().min(TRACK_NAME_LEN);
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        self.name.clear();
        self.name.push_str(&name[..end]);
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Set output gain, clamped to `[0, 2]`. Non-finite values are ignored.
    pub fn set_gain(&mut self, gain: f32) {
        if gain.is_finite() {
            self.gain = gain.clamp(0.0, 2.0);
        }
    }

    /// Activate the given step indices at full velocity.
    fn with_hits(mut self, hits: &[usize]) -> Self {
        for &i in hits {
            self.steps[i] = Step::on();
        }
        self
    }
}

/// The complete editable sequence state.
///
/// `Copy` so the real-time thread can snapshot it without allocating.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pattern {
    pub tracks: [Track; NUM_TRACKS],
}

impl Default for Pattern {
    /// The starter groove: four-on-the-floor kick, offbeat bass and hats,
    /// claps on two and four.
    fn default() -> Self {
        Self {
            tracks: [
                Track::new(TrackId::Kick).with_hits(&[0, 4, 8, 12]),
                Track::new(TrackId::Bass).with_hits(&[2, 6, 10, 14]),
                Track::new(TrackId::Hat).with_hits(&[2, 6, 10, 14]),
                Track::new(TrackId::Clap).with_hits(&[4, 12]),
            ],
        }
    }
}

impl Pattern {
    /// A pattern with every step inactive.
    pub fn empty() -> Self {
        Self { tracks: TrackId::ALL.map(Track::new) }
    }

    pub fn track(&self, id: TrackId) -> &Track {
        &self.tracks[id.index()]
    }

    pub fn track_mut(&mut self, id: TrackId) -> &mut Track {
        &mut self.tracks[id.index()]
    }

    pub fn step(&self, id: TrackId, step: usize) -> Option<&Step> {
        self.tracks[id.index()].steps.get(step)
    }

    /// Apply an edit command. Out-of-range indices and non-finite values
    /// are rejected and leave the pattern unchanged.
    pub fn apply(&mut self, command: &Command) -> Result<(), CommandError> {
        match *command {
            Command::ToggleStep { track, step, active } => {
                self.step_mut(track, step)?.active = active;
            }
            Command::SetVelocity { track, step, velocity } => {
                check_finite(velocity)?;
                self.step_mut(track, step)?.set_velocity(velocity);
            }
            Command::SetProbability { track, step, probability } => {
                check_finite(probability)?;
                self.step_mut(track, step)?.set_probability(probability);
            }
            Command::SetModifier { track, step, modifier } => {
                self.step_mut(track, step)?.modifier = modifier;
            }
            Command::SetTrackGain { track, gain } => {
                check_finite(gain)?;
                self.track_at(track)?.set_gain(gain);
            }
            Command::SetTrackNote { track, note } => {
                self.track_at(track)?.note = note.min(127);
            }
        }
        Ok(())
    }

    fn track_at(&mut self, track: usize) -> Result<&mut Track, CommandError> {
        self.tracks.get_mut(track).ok_or(CommandError::TrackOutOfRange(track))
    }

    fn step_mut(&mut self, track: usize, step: usize) -> Result<&mut Step, CommandError> {
        self.track_at(track)?
            .steps
            .get_mut(step)
            .ok_or(CommandError::StepOutOfRange(step))
    }
}

fn check_finite(value: f32) -> Result<(), CommandError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CommandError::NonFinite)
    }
}
