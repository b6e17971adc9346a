//! Step boundary detection and trigger decisions.
//!
//! Every sample of a playing block is checked against the step grid. When a
//! sample lies on a new step index the scheduler:
//!
//! 1. advances the loop counter if the pattern wrapped from the last step to 0,
//! 2. clears every track's ratchet state and publishes the step index,
//! 3. walks the tracks in index order, applying the cycle gate and the
//!    probability draw, and reports the survivors to a [`TriggerSink`].
//!
//! Ratchet subdivisions of a step that fired are reported as the play head
//! crosses each subdivision inside the step. No steps fire while stopped,
//! and nothing fires for time skipped over while stopped or by a host jump.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use bg_ir::{Modifier, Pattern, TrackId, NUM_STEPS, NUM_TRACKS};

use crate::transport::TransportFrame;

/// Glide length as a fraction of one step.
pub const GLIDE_FRACTION: f64 = 0.5;

/// Why a voice is being started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerKind {
    /// The step's own boundary.
    Step,
    /// A later subdivision of a ratcheted step (`1..divisions`).
    Ratchet { subdivision: u8 },
}

/// A voice start at a sample offset within the current block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerEvent {
    pub offset: usize,
    pub track: TrackId,
    pub step: usize,
    pub velocity: f32,
    pub note: u8,
    pub kind: TriggerKind,
    /// Slide length in samples, for glide steps on pitched tracks.
    pub glide: Option<u32>,
}

/// Receives triggers in the order they occur.
pub trait TriggerSink {
    fn on_trigger(&mut self, event: TriggerEvent);
}

/// Collects events. Allocates, so keep it off the audio thread.
impl TriggerSink for Vec<TriggerEvent> {
    fn on_trigger(&mut self, event: TriggerEvent) {
        self.push(event);
    }
}

/// The current step index, shared with readers on other threads.
/// Holds -1 while the transport is stopped.
#[derive(Clone, Debug)]
pub struct StepPosition(Arc<AtomicI32>);

impl Default for StepPosition {
    fn default() -> Self {
        Self(Arc::new(AtomicI32::new(-1)))
    }
}

impl StepPosition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw index, -1 when stopped.
    pub fn raw(&self) -> i32 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn get(&self) -> Option<usize> {
        usize::try_from(self.raw()).ok()
    }

    fn set(&self, step: Option<usize>) {
        self.0.store(step.map_or(-1, |s| s as i32), Ordering::Relaxed);
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct RatchetState {
    /// The step's boundary trigger passed its gate and probability draw.
    armed: bool,
    /// Highest subdivision already fired.
    fired: u8,
}

/// Sequencing state owned by the audio thread.
#[derive(Debug)]
pub struct StepScheduler {
    /// Absolute sample position of the last sample examined.
    last_time: Option<i64>,
    current_step: Option<usize>,
    loop_count: u32,
    ratchets: [RatchetState; NUM_TRACKS],
    position: StepPosition,
}

impl StepScheduler {
    pub fn new(position: StepPosition) -> Self {
        Self {
            last_time: None,
            current_step: None,
            loop_count: 0,
            ratchets: [RatchetState::default(); NUM_TRACKS],
            position,
        }
    }

    pub fn current_step(&self) -> Option<usize> {
        self.current_step
    }

    /// Completed passes through the pattern since playback started.
    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    pub fn position(&self) -> &StepPosition {
        &self.position
    }

    /// Return to the stopped state.
    pub fn halt(&mut self) {
        self.last_time = None;
        self.current_step = None;
        self.loop_count = 0;
        self.ratchets = [RatchetState::default(); NUM_TRACKS];
        self.position.set(None);
    }

    /// Scan `len` samples starting at `frame.block_start` and report every trigger.
    pub fn run<S: TriggerSink>(
        &mut self,
        frame: &TransportFrame,
        len: usize,
        pattern: &Pattern,
        rng: &mut fastrand::Rng,
        sink: &mut S,
    ) {
        if !frame.playing {
            self.halt();
            return;
        }

        let start = frame.block_start;
        if frame.started || self.last_time != Some(start - 1) {
            // Pretend the previous sample was examined so a boundary exactly
            // at `start` fires and nothing before it does.
            self.ratchets = [RatchetState::default(); NUM_TRACKS];
            self.last_time = Some(start - 1);
        }
        let end = start + len as i64;

        let sps = frame.samples_per_step;
        if !(sps.is_finite() && sps > 0.0) {
            self.last_time = Some(end - 1);
            return;
        }

        let mut prev_index = step_index(start - 1, sps);
        for offset in 0..len {
            let now = start + offset as i64;
            let index = step_index(now, sps);
            for crossed in (prev_index + 1)..=index {
                self.enter_step(crossed, offset, sps, pattern, rng, sink);
            }
            prev_index = index;
            self.poll_ratchets(now, index, offset, sps, pattern, sink);
        }
        self.last_time = Some(end - 1);
    }

    fn enter_step<S: TriggerSink>(
        &mut self,
        index: i64,
        offset: usize,
        sps: f64,
        pattern: &Pattern,
        rng: &mut fastrand::Rng,
        sink: &mut S,
    ) {
        let step = index.rem_euclid(NUM_STEPS as i64) as usize;
        if step == 0 && self.current_step == Some(NUM_STEPS - 1) {
            self.loop_count = self.loop_count.wrapping_add(1);
        }
        self.current_step = Some(step);
        self.ratchets = [RatchetState::default(); NUM_TRACKS];
        self.position.set(Some(step));

        for track in TrackId::ALL {
            let t = pattern.track(track);
            let cell = &t.steps[step];
            if !cell.active || !cell.modifier.passes_cycle_gate(self.loop_count) {
                continue;
            }
            let p = cell.probability();
            if p < 1.0 {
                let draw = rng.f32();
                if p <= 0.0 || draw > p {
                    continue;
                }
            }

            self.ratchets[track.index()].armed = true;
            let glide = (cell.modifier == Modifier::Glide && track.is_pitched())
                .then(|| (sps * GLIDE_FRACTION) as u32);
            sink.on_trigger(TriggerEvent {
                offset,
                track,
                step,
                velocity: cell.velocity(),
                note: t.note,
                kind: TriggerKind::Step,
                glide,
            });
        }
    }

    fn poll_ratchets<S: TriggerSink>(
        &mut self,
        now: i64,
        index: i64,
        offset: usize,
        sps: f64,
        pattern: &Pattern,
        sink: &mut S,
    ) {
        let Some(step) = self.current_step else {
            return;
        };
        let pos_in_step = now as f64 - index as f64 * sps;

        for track in TrackId::ALL {
            let state = &mut self.ratchets[track.index()];
            if !state.armed {
                continue;
            }
            let t = pattern.track(track);
            let cell = &t.steps[step];
            let Some(divisions) = cell.modifier.ratchet_divisions() else {
                continue;
            };
            if !cell.active {
                continue;
            }
            let sub_len = sps / divisions as f64;
            let expected = (pos_in_step / sub_len).floor() as i64;
            if expected > state.fired as i64 && expected < divisions as i64 {
                state.fired = expected as u8;
                sink.on_trigger(TriggerEvent {
                    offset,
                    track,
                    step,
                    velocity: cell.velocity(),
                    note: t.note,
                    kind: TriggerKind::Ratchet { subdivision: expected as u8 },
                    glide: None,
                });
            }
        }
    }
}

#[inline]
fn step_index(sample: i64, sps: f64) -> i64 {
    (sample as f64 / sps).floor() as i64
}
