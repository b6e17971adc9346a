//! Structured persistence tree for a [`Pattern`].
//!
//! The tree is a plain serde model: Pattern > Track { name, midiNote, gain }
//! > Step { index, active, velocity, probability, modifier }. How it is laid
//! out on disk is up to the host.

use alloc::string::String;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::pattern::{Pattern, NUM_STEPS, NUM_TRACKS};
use crate::step::Modifier;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternTree {
    pub tracks: Vec<TrackNode>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackNode {
    pub name: String,
    #[serde(rename = "midiNote")]
    pub midi_note: u8,
    #[serde(default = "unity_gain")]
    pub gain: f32,
    #[serde(default)]
    pub steps: Vec<StepNode>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepNode {
    pub index: usize,
    pub active: bool,
    pub velocity: f32,
    pub probability: f32,
    #[serde(default)]
    pub modifier: u8,
}

fn unity_gain() -> f32 {
    1.0
}

/// Why a tree could not be loaded.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum TreeError {
    #[error("tree has {0} tracks, more than a pattern holds")]
    TooManyTracks(usize),
    #[error("track {track}: step index {index} out of range")]
    StepOutOfRange { track: usize, index: usize },
    #[error("track {track} step {index}: unknown modifier code {code}")]
    UnknownModifier { track: usize, index: usize, code: u8 },
    #[error("track {track}: non-finite value")]
    NonFinite { track: usize },
}

impl Pattern {
    /// Capture every track and step into a tree.
    pub fn to_tree(&self) -> PatternTree {
        let tracks = self
            .tracks
            .iter()
            .map(|track| TrackNode {
                name: track.name().into(),
                midi_note: track.note,
                gain: track.gain(),
                steps: track
                    .steps
                    .iter()
                    .enumerate()
                    .map(|(index, step)| StepNode {
                        index,
                        active: step.active,
                        velocity: step.velocity(),
                        probability: step.probability(),
                        modifier: step.modifier.code(),
                    })
                    .collect(),
            })
            .collect();
        PatternTree { tracks }
    }

    /// Build a pattern from a tree.
    ///
    /// Tracks are matched by position. Tracks or steps the tree omits keep
    /// their [`Pattern::empty`] values. Velocity and probability are clamped;
    /// anything structurally invalid fails the whole load.
    pub fn from_tree(tree: &PatternTree) -> Result<Pattern, TreeError> {
        if tree.tracks.len() > NUM_TRACKS {
            return Err(TreeError::TooManyTracks(tree.tracks.len()));
        }

        let mut pattern = Pattern::empty();
        for (ti, node) in tree.tracks.iter().enumerate() {
            let track = &mut pattern.tracks[ti];
            if !node.gain.is_finite() {
                return Err(TreeError::NonFinite { track: ti });
            }
            track.set_name(&node.name);
            track.note = node.midi_note.min(127);
            track.set_gain(node.gain);

            for sn in &node.steps {
                if sn.index >= NUM_STEPS {
                    return Err(TreeError::StepOutOfRange { track: ti, index: sn.index });
                }
                if !sn.velocity.is_finite() || !sn.probability.is_finite() {
                    return Err(TreeError::NonFinite { track: ti });
                }
                let modifier = Modifier::from_code(sn.modifier).ok_or(TreeError::UnknownModifier {
                    track: ti,
                    index: sn.index,
                    code: sn.modifier,
                })?;
                let step = &mut track.steps[sn.index];
                step.active = sn.active;
                step.set_velocity(sn.velocity);
                step.set_probability(sn.probability);
                step.modifier = modifier;
            }
        }
        Ok(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::TrackId;
    use crate::step::{Ratchet, Step};
    use alloc::vec;

    fn edited_pattern() -> Pattern {
        let mut p = Pattern::default();
        p.track_mut(TrackId::Hat).steps[3] = Step::on()
            .with_velocity(0.25)
            .with_probability(0.5)
            .with_modifier(Modifier::Ratchet(Ratchet::Four));
        p.track_mut(TrackId::Bass).note = 43;
        p.track_mut(TrackId::Clap).set_gain(0.3);
        p.track_mut(TrackId::Kick).set_name("Boom");
        p
    }

    #[test]
    fn tree_reproduces_pattern() {
        let p = edited_pattern();
        let restored = Pattern::from_tree(&p.to_tree()).unwrap();
        assert_eq!(restored, p);
    }

    #[test]
    fn tree_carries_every_step() {
        let tree = Pattern::default().to_tree();
        assert_eq!(tree.tracks.len(), NUM_TRACKS);
        assert!(tree.tracks.iter().all(|t| t.steps.len() == NUM_STEPS));
        assert_eq!(tree.tracks[0].name, "Kick");
        assert_eq!(tree.tracks[2].midi_note, 42);
    }

    #[test]
    fn missing_entries_fall_back_to_empty() {
        let tree = PatternTree {
            tracks: vec![TrackNode {
                name: "Solo".into(),
                midi_note: 40,
                gain: 1.0,
                steps: vec![StepNode { index: 7, active: true, velocity: 2.0, probability: 0.5, modifier: 3 }],
            }],
        };
        let p = Pattern::from_tree(&tree).unwrap();
        let step = p.step(TrackId::Kick, 7).unwrap();
        assert!(step.active);
        assert_eq!(step.velocity(), 1.0);
        assert_eq!(step.modifier, Modifier::Glide);
        assert!(p.tracks[1].steps.iter().all(|s| !s.active));
    }

    #[test]
    fn out_of_range_step_fails() {
        let mut tree = Pattern::default().to_tree();
        tree.tracks[1].steps[0].index = NUM_STEPS;
        assert_eq!(
            Pattern::from_tree(&tree),
            Err(TreeError::StepOutOfRange { track: 1, index: NUM_STEPS })
        );
    }

    #[test]
    fn unknown_modifier_fails() {
        let mut tree = Pattern::default().to_tree();
        tree.tracks[0].steps[2].modifier = 9;
        assert!(matches!(
            Pattern::from_tree(&tree),
            Err(TreeError::UnknownModifier { code: 9, .. })
        ));
    }

    #[test]
    fn too_many_tracks_fails() {
        let mut tree = Pattern::default().to_tree();
        let extra = tree.tracks[0].clone();
        tree.tracks.push(extra);
        assert_eq!(Pattern::from_tree(&tree), Err(TreeError::TooManyTracks(5)));
    }
}
