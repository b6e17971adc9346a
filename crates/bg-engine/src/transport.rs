//! Host transport state and step-length arithmetic.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Slowest accepted tempo.
pub const MIN_BPM: f64 = 1.0;

/// Fastest accepted tempo.
pub const MAX_BPM: f64 = 999.0;

/// Tempo used when the host reports something non-finite.
pub const FALLBACK_BPM: f64 = 120.0;

/// What the host reports at the start of a block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransportInfo {
    pub is_playing: bool,
    pub bpm: f64,
    /// Absolute sample index of the block's first frame.
    pub sample_position: i64,
}

impl TransportInfo {
    pub const fn stopped() -> Self {
        Self { is_playing: false, bpm: FALLBACK_BPM, sample_position: 0 }
    }

    pub const fn playing(bpm: f64, sample_position: i64) -> Self {
        Self { is_playing: true, bpm, sample_position }
    }

    /// The same transport `frames` samples later.
    pub fn advanced(self, frames: usize) -> Self {
        Self { sample_position: self.sample_position + frames as i64, ..self }
    }
}

/// Transport state derived for one block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransportFrame {
    pub playing: bool,
    /// True on the first block after a stopped-to-playing edge.
    pub started: bool,
    pub bpm: f64,
    pub block_start: i64,
    pub samples_per_step: f64,
}

/// Samples per sequencer step: `(60 / bpm) * sample_rate / steps_per_beat`.
pub fn samples_per_step(bpm: f64, sample_rate: f64, steps_per_beat: u32) -> f64 {
    (60.0 / bpm) * sample_rate / steps_per_beat.max(1) as f64
}

/// Clamp a host tempo into the usable range.
pub fn sanitize_bpm(bpm: f64) -> f64 {
    if bpm.is_finite() {
        bpm.clamp(MIN_BPM, MAX_BPM)
    } else {
        FALLBACK_BPM
    }
}

/// Tracks play/stop edges and converts host tempo into step lengths.
#[derive(Clone, Debug)]
pub struct TransportClock {
    sample_rate: f64,
    steps_per_beat: u32,
    was_playing: bool,
}

impl TransportClock {
    pub fn new(sample_rate: f64, steps_per_beat: u32) -> Self {
        Self { sample_rate, steps_per_beat: steps_per_beat.max(1), was_playing: false }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
    }

    pub fn update(&mut self, info: TransportInfo) -> TransportFrame {
        let started = info.is_playing && !self.was_playing;
        self.was_playing = info.is_playing;
        let bpm = sanitize_bpm(info.bpm);
        TransportFrame {
            playing: info.is_playing,
            started,
            bpm,
            block_start: info.sample_position,
            samples_per_step: samples_per_step(bpm, self.sample_rate, self.steps_per_beat),
        }
    }
}

/// Something that hands out one [`TransportInfo`] per rendered block.
pub trait TransportSource {
    fn next_block(&mut self, frames: usize) -> TransportInfo;
}

/// Play flag and tempo shared between a control thread and a
/// [`FreeRunningTransport`].
#[derive(Debug)]
pub struct TransportControl {
    playing: AtomicBool,
    bpm_bits: AtomicU64,
}

impl TransportControl {
    pub fn new(bpm: f64) -> Arc<Self> {
        Arc::new(Self { playing: AtomicBool::new(false), bpm_bits: AtomicU64::new(sanitize_bpm(bpm).to_bits()) })
    }

    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::Release);
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    pub fn set_bpm(&self, bpm: f64) {
        self.bpm_bits.store(sanitize_bpm(bpm).to_bits(), Ordering::Relaxed);
    }

    pub fn bpm(&self) -> f64 {
        f64::from_bits(self.bpm_bits.load(Ordering::Relaxed))
    }
}

/// Standalone transport: counts samples while playing, restarts at zero on play.
#[derive(Debug)]
pub struct FreeRunningTransport {
    control: Arc<TransportControl>,
    position: i64,
    was_playing: bool,
}

impl FreeRunningTransport {
    pub fn new(control: Arc<TransportControl>) -> Self {
        Self { control, position: 0, was_playing: false }
    }

    pub fn control(&self) -> &Arc<TransportControl> {
        &self.control
    }
}

impl TransportSource for FreeRunningTransport {
    fn next_block(&mut self, frames: usize) -> TransportInfo {
        let playing = self.control.is_playing();
        if playing && !self.was_playing {
            self.position = 0;
        }
        self.was_playing = playing;
        let info = TransportInfo { is_playing: playing, bpm: self.control.bpm(), sample_position: self.position };
        if playing {
            self.position += frames as i64;
        }
        info
    }
}
