//! Real-time step sequencing engine for beatgrid.
//!
//! The audio thread owns an [`Engine`] and calls [`Engine::process_block`]
//! once per host block. Everything else talks to it through an
//! [`EngineHandle`]: edits go through a bounded lock-free command channel,
//! the pattern comes back through a try-lock snapshot, the play position
//! through an atomic.

pub mod command_queue;
pub mod dsp;
mod engine;
pub mod envelope;
mod frame;
pub mod fx;
pub mod params;
pub mod rack;
pub mod scheduler;
pub mod snapshot;
pub mod transport;
pub mod voices;

pub use command_queue::{command_channel, CommandReceiver, CommandSender, DrainStats};
pub use engine::{Engine, EngineConfig, EngineHandle, BASS_NOTE_MIN, KICK_NOTE, MAX_PENDING_NOTES};
pub use envelope::{Envelope, Stage};
pub use frame::{sample_to_i16, Frame};
pub use fx::PunchInFx;
pub use params::{ParamId, ParamRange, ParamStore, ParamValues};
pub use scheduler::{StepPosition, StepScheduler, TriggerEvent, TriggerKind, TriggerSink};
pub use snapshot::{snapshot_pair, PublishOutcome, SnapshotPublisher, SnapshotReader};
pub use transport::{FreeRunningTransport, TransportClock, TransportControl, TransportInfo, TransportSource};
