//! Eventually-consistent copy of the live pattern for readers off the audio thread.
//!
//! The audio thread owns the authoritative [`Pattern`]. After a block in
//! which commands changed it, [`SnapshotPublisher::try_publish`] copies it into
//! a mutex-guarded slot with `try_lock`; if a reader holds the lock the copy
//! is retried on the next block. Readers take the lock normally.

use std::sync::Arc;

use bg_ir::Pattern;
use parking_lot::Mutex;

/// Result of a publish attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Nothing changed since the last publish.
    Clean,
    Published,
    /// A reader held the lock; still dirty.
    Contended,
}

/// Audio-thread side.
pub struct SnapshotPublisher {
    slot: Arc<Mutex<Pattern>>,
    dirty: bool,
}

/// Reader side. Cheap to clone.
#[derive(Clone)]
pub struct SnapshotReader {
    slot: Arc<Mutex<Pattern>>,
}

/// Create a publisher/reader pair seeded with `initial`.
pub fn snapshot_pair(initial: Pattern) -> (SnapshotPublisher, SnapshotReader) {
    let slot = Arc::new(Mutex::new(initial));
    (SnapshotPublisher { slot: slot.clone(), dirty: false }, SnapshotReader { slot })
}

impl SnapshotPublisher {
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Copy `pattern` into the shared slot if dirty and the lock is free. Never blocks.
    pub fn try_publish(&mut self, pattern: &Pattern) -> PublishOutcome {
        if !self.dirty {
            return PublishOutcome::Clean;
        }
        match self.slot.try_lock() {
            Some(mut guard) => {
                *guard = *pattern;
                self.dirty = false;
                PublishOutcome::Published
            }
            None => PublishOutcome::Contended,
        }
    }
}

impl SnapshotReader {
    /// The most recently published pattern.
    pub fn read(&self) -> Pattern {
        *self.slot.lock()
    }
}
