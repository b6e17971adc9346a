//! The engine facade: one object owned by the audio thread plus a handle for
//! everybody else.
//!
//! Per block the engine drains queued commands into its pattern, derives the
//! step grid from the host transport, walks the grid sample by sample, renders
//! the voices in segments between triggers, applies the punch-in effects and
//! finally offers a snapshot of the pattern to readers. After [`Engine::prepare`]
//! nothing on that path allocates, blocks or logs.

use std::sync::Arc;

use bg_ir::{AudioBuffer, Command, Pattern, PatternTree, TrackId, TreeError};

use crate::command_queue::{command_channel, CommandReceiver, CommandSender, DEFAULT_CAPACITY};
use crate::fx::PunchInFx;
use crate::params::{ParamId, ParamStore};
use crate::rack::VoiceRack;
use crate::scheduler::{StepPosition, StepScheduler, TriggerEvent, TriggerSink};
use crate::snapshot::{snapshot_pair, SnapshotPublisher, SnapshotReader};
use crate::transport::{TransportClock, TransportInfo};

/// Pending external notes held between blocks.
pub const MAX_PENDING_NOTES: usize = 32;

/// MIDI note that fires the kick.
pub const KICK_NOTE: u8 = 36;

/// Lowest MIDI note routed to the bass.
pub const BASS_NOTE_MIN: u8 = 48;

const MIN_SAMPLE_RATE: u32 = 1_000;

/// Construction-time settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub sample_rate: u32,
    /// Largest block rendered in one pass. Bigger host blocks are chunked.
    pub max_block_size: usize,
    pub steps_per_beat: u32,
    pub command_capacity: usize,
    /// Seeds the probability draws and the noise sources.
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            max_block_size: 1024,
            steps_per_beat: 4,
            command_capacity: DEFAULT_CAPACITY,
            seed: 0x5eed,
        }
    }
}

impl EngineConfig {
    /// Replace unusable values with defaults, warning about each one.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let mut cfg = self;
        if cfg.sample_rate < MIN_SAMPLE_RATE {
            log::warn!("sample rate {} too low, using {}", cfg.sample_rate, defaults.sample_rate);
            cfg.sample_rate = defaults.sample_rate;
        }
        if cfg.max_block_size == 0 {
            log::warn!("block size 0, using {}", defaults.max_block_size);
            cfg.max_block_size = defaults.max_block_size;
        }
        if cfg.steps_per_beat == 0 {
            log::warn!("steps per beat 0, using {}", defaults.steps_per_beat);
            cfg.steps_per_beat = defaults.steps_per_beat;
        }
        if cfg.command_capacity == 0 {
            log::warn!("command capacity 0, using {}", defaults.command_capacity);
            cfg.command_capacity = defaults.command_capacity;
        }
        cfg
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct PendingNote {
    note: u8,
    velocity: f32,
}

/// Audio-thread side of the sequencer.
pub struct Engine {
    config: EngineConfig,
    pattern: Pattern,
    commands: CommandReceiver,
    publisher: SnapshotPublisher,
    clock: TransportClock,
    scheduler: StepScheduler,
    rack: VoiceRack,
    fx: PunchInFx,
    params: Arc<ParamStore>,
    rng: fastrand::Rng,
    notes: heapless::Vec<PendingNote, MAX_PENDING_NOTES>,
}

/// Control side: queue edits, read the snapshot and play position, set parameters.
pub struct EngineHandle {
    sender: CommandSender,
    snapshot: SnapshotReader,
    position: StepPosition,
    params: Arc<ParamStore>,
}

impl Engine {
    /// Build an engine with the default pattern, and the handle that talks to it.
    pub fn new(config: EngineConfig) -> (Engine, EngineHandle) {
        let config = config.sanitized();
        let pattern = Pattern::default();
        let (sender, commands) = command_channel(config.command_capacity);
        let (publisher, snapshot) = snapshot_pair(pattern);
        let position = StepPosition::new();
        let params = Arc::new(ParamStore::default());
        let sr = config.sample_rate as f32;

        log::info!(
            "engine: {} Hz, {} frames/block, {} steps/beat, {} command slots",
            config.sample_rate,
            config.max_block_size,
            config.steps_per_beat,
            config.command_capacity
        );

        let engine = Engine {
            config,
            pattern,
            commands,
            publisher,
            clock: TransportClock::new(config.sample_rate as f64, config.steps_per_beat),
            scheduler: StepScheduler::new(position.clone()),
            rack: VoiceRack::new(sr, config.seed),
            fx: PunchInFx::new(sr),
            params: params.clone(),
            rng: fastrand::Rng::with_seed(config.seed),
            notes: heapless::Vec::new(),
        };
        let handle = EngineHandle { sender, snapshot, position, params };
        (engine, handle)
    }

    /// Reconfigure for a new device. Allocates; call off the audio thread.
    pub fn prepare(&mut self, sample_rate: u32, max_block_size: usize) {
        let cfg = EngineConfig { sample_rate, max_block_size, ..self.config }.sanitized();
        if cfg.sample_rate != self.config.sample_rate {
            let sr = cfg.sample_rate as f32;
            self.clock.set_sample_rate(cfg.sample_rate as f64);
            self.rack.prepare(sr);
            self.fx = PunchInFx::new(sr);
        }
        self.config = cfg;
        log::info!("engine prepared: {} Hz, {} frames/block", cfg.sample_rate, cfg.max_block_size);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// The live pattern as seen by the audio thread.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn current_step(&self) -> Option<usize> {
        self.scheduler.current_step()
    }

    pub fn loop_count(&self) -> u32 {
        self.scheduler.loop_count()
    }

    /// Render one host block filling all of `output`.
    pub fn process_block(&mut self, transport: TransportInfo, output: &mut AudioBuffer) {
        let frames = output.frames();
        self.process_frames(transport, output, frames);
    }

    /// Render the first `frames` frames of `output`, leaving the rest alone.
    pub fn process_frames(&mut self, transport: TransportInfo, output: &mut AudioBuffer, frames: usize) {
        #[cfg(feature = "alloc_check")]
        assert_no_alloc::assert_no_alloc(|| self.render_chunks(transport, output, frames));
        #[cfg(not(feature = "alloc_check"))]
        self.render_chunks(transport, output, frames);
    }

    fn render_chunks(&mut self, transport: TransportInfo, output: &mut AudioBuffer, frames: usize) {
        let frames = frames.min(output.frames());
        let mut start = 0;
        while start < frames {
            let len = (frames - start).min(self.config.max_block_size);
            self.process_chunk(transport.advanced(start), output, start, len);
            start += len;
        }
    }

    fn process_chunk(&mut self, transport: TransportInfo, output: &mut AudioBuffer, start: usize, len: usize) {
        output.silence_range(start, len);

        if self.commands.drain_into(&mut self.pattern).changed() {
            self.publisher.mark_dirty();
        }

        let frame = self.clock.update(transport);
        let params = self.params.load();
        self.rack.configure(&params, &self.pattern);
        self.fire_pending_notes();

        let mut cursor = RenderCursor { rack: &mut self.rack, output: &mut *output, start, rendered: 0 };
        self.scheduler.run(&frame, len, &self.pattern, &mut self.rng, &mut cursor);
        cursor.finish(len);

        self.fx.process(output, start, len, &params, frame.bpm);
        self.publisher.try_publish(&self.pattern);
    }

    fn fire_pending_notes(&mut self) {
        for pending in self.notes.iter() {
            if pending.note == KICK_NOTE {
                self.rack.fire(TrackId::Kick, pending.velocity, pending.note, None);
            } else if pending.note >= BASS_NOTE_MIN {
                self.rack.fire(TrackId::Bass, pending.velocity, pending.note, None);
            }
        }
        self.notes.clear();
    }

    /// Queue an external note for the next block. Returns `false` if the
    /// pending list is full and the note was dropped.
    pub fn note_on(&mut self, note: u8, velocity: f32) -> bool {
        let velocity = if velocity.is_finite() { velocity.clamp(0.0, 1.0) } else { 1.0 };
        self.notes.push(PendingNote { note, velocity }).is_ok()
    }

    /// Export the live pattern.
    pub fn serialize(&self) -> PatternTree {
        self.pattern.to_tree()
    }

    /// Replace the live pattern. On error the current pattern is kept.
    pub fn deserialize(&mut self, tree: &PatternTree) -> Result<(), TreeError> {
        let pattern = Pattern::from_tree(tree).map_err(|e| {
            log::warn!("pattern load rejected: {e}");
            e
        })?;
        self.pattern = pattern;
        self.publisher.mark_dirty();
        self.publisher.try_publish(&self.pattern);
        log::info!("pattern loaded ({} tracks in tree)", tree.tracks.len());
        Ok(())
    }

    /// Restart every random stream from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.config.seed = seed;
        self.rng.seed(seed);
        self.rack.reseed(seed);
    }
}

impl EngineHandle {
    /// Queue a command for the audio thread. `false` means the channel was
    /// full and the command was dropped.
    pub fn enqueue(&mut self, command: Command) -> bool {
        let queued = self.sender.enqueue(command);
        if !queued {
            log::debug!("command channel full, dropped {command:?}");
        }
        queued
    }

    pub fn free_slots(&self) -> usize {
        self.sender.free_slots()
    }

    /// Latest published copy of the pattern.
    pub fn read_snapshot(&self) -> Pattern {
        self.snapshot.read()
    }

    pub fn snapshot_reader(&self) -> SnapshotReader {
        self.snapshot.clone()
    }

    pub fn current_step(&self) -> Option<usize> {
        self.position.get()
    }

    /// Step index with -1 while stopped.
    pub fn current_step_raw(&self) -> i32 {
        self.position.raw()
    }

    pub fn set_param(&self, id: ParamId, value: f32) {
        self.params.set(id, value);
    }

    pub fn param(&self, id: ParamId) -> f32 {
        self.params.get(id)
    }

    pub fn params(&self) -> &Arc<ParamStore> {
        &self.params
    }
}

/// Renders voices up to each trigger's offset before starting the voice.
struct RenderCursor<'a> {
    rack: &'a mut VoiceRack,
    output: &'a mut AudioBuffer,
    start: usize,
    rendered: usize,
}

impl RenderCursor<'_> {
    fn render_to(&mut self, offset: usize) {
        if offset > self.rendered {
            self.rack.render(self.output, self.start + self.rendered, offset - self.rendered);
            self.rendered = offset;
        }
    }

    fn finish(mut self, len: usize) {
        self.render_to(len);
    }
}

impl TriggerSink for RenderCursor<'_> {
    fn on_trigger(&mut self, event: TriggerEvent) {
        self.render_to(event.offset);
        self.rack.fire(event.track, event.velocity, event.note, event.glide);
    }
}
