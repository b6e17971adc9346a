//! Core types for the beatgrid step sequencer.
//!
//! Defines the step grid edited by the control side, the commands that
//! carry those edits to the audio thread, the persistence tree, and the
//! planar audio buffer the engine renders into.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod audio_buffer;
mod command;
mod pattern;
mod pitch;
mod step;
mod tree;

pub use audio_buffer::{AudioBuffer, MAX_CHANNELS};
pub use command::{Command, CommandError};
pub use pattern::{Pattern, Track, TrackId, NUM_STEPS, NUM_TRACKS, TRACK_NAME_LEN};
pub use pitch::{note_to_hz, A4_HZ};
pub use step::{Modifier, Ratchet, Step};
pub use tree::{PatternTree, StepNode, TrackNode, TreeError};
