//! Continuous sound parameters shared lock-free between control and audio threads.
//!
//! Each parameter is an `f32` stored as bits in an `AtomicU32`. The control
//! side writes with [`ParamStore::set`]; the engine reads a
//! [`ParamValues`] once per block. Values are independent; a block may see
//! one write and miss another made at the same time.

use std::sync::atomic::{AtomicU32, Ordering};

/// Identifies one sound parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamId {
    KickPitch,
    KickDecay,
    KickClick,
    BassCutoff,
    BassDrive,
    BassAttack,
    BassDecay,
    Sidechain,
    FxStutter,
    FxSweep,
    FxBitcrush,
}

/// Number of [`ParamId`] variants.
pub const NUM_PARAMS: usize = 11;

/// Allowed range and default of a parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl ParamId {
    pub const ALL: [ParamId; NUM_PARAMS] = [
        ParamId::KickPitch,
        ParamId::KickDecay,
        ParamId::KickClick,
        ParamId::BassCutoff,
        ParamId::BassDrive,
        ParamId::BassAttack,
        ParamId::BassDecay,
        ParamId::Sidechain,
        ParamId::FxStutter,
        ParamId::FxSweep,
        ParamId::FxBitcrush,
    ];

    pub const fn range(self) -> ParamRange {
        let (min, max, default) = match self {
            ParamId::KickPitch => (40.0, 150.0, 60.0),
            ParamId::KickDecay => (0.1, 1.0, 0.4),
            ParamId::KickClick => (0.0, 1.0, 0.5),
            ParamId::BassCutoff => (20.0, 2000.0, 200.0),
            ParamId::BassDrive => (0.0, 1.0, 0.0),
            ParamId::BassAttack => (0.001, 0.5, 0.01),
            ParamId::BassDecay => (0.1, 2.0, 0.4),
            ParamId::Sidechain => (0.0, 1.0, 0.5),
            ParamId::FxStutter | ParamId::FxSweep | ParamId::FxBitcrush => (0.0, 1.0, 0.0),
        };
        ParamRange { min, max, default }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ParamId::KickPitch => "kick_pitch",
            ParamId::KickDecay => "kick_decay",
            ParamId::KickClick => "kick_click",
            ParamId::BassCutoff => "bass_cutoff",
            ParamId::BassDrive => "bass_drive",
            ParamId::BassAttack => "bass_attack",
            ParamId::BassDecay => "bass_decay",
            ParamId::Sidechain => "sidechain",
            ParamId::FxStutter => "fx_stutter",
            ParamId::FxSweep => "fx_sweep",
            ParamId::FxBitcrush => "fx_bitcrush",
        }
    }

    pub fn from_name(name: &str) -> Option<ParamId> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Atomic parameter storage.
#[derive(Debug)]
pub struct ParamStore {
    values: [AtomicU32; NUM_PARAMS],
}

impl Default for ParamStore {
    fn default() -> Self {
        Self { values: ParamId::ALL.map(|p| AtomicU32::new(p.range().default.to_bits())) }
    }
}

impl ParamStore {
    /// Store `value` clamped to the parameter's range. Non-finite values are ignored.
    pub fn set(&self, id: ParamId, value: f32) {
        if !value.is_finite() {
            return;
        }
        let r = id.range();
        self.values[id as usize].store(value.clamp(r.min, r.max).to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self, id: ParamId) -> f32 {
        f32::from_bits(self.values[id as usize].load(Ordering::Relaxed))
    }

    /// Read every parameter.
    pub fn load(&self) -> ParamValues {
        ParamValues {
            kick_pitch: self.get(ParamId::KickPitch),
            kick_decay: self.get(ParamId::KickDecay),
            kick_click: self.get(ParamId::KickClick),
            bass_cutoff: self.get(ParamId::BassCutoff),
            bass_drive: self.get(ParamId::BassDrive),
            bass_attack: self.get(ParamId::BassAttack),
            bass_decay: self.get(ParamId::BassDecay),
            sidechain: self.get(ParamId::Sidechain),
            fx_stutter: self.get(ParamId::FxStutter),
            fx_sweep: self.get(ParamId::FxSweep),
            fx_bitcrush: self.get(ParamId::FxBitcrush),
        }
    }
}

/// A plain copy of every parameter, read once per block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamValues {
    pub kick_pitch: f32,
    pub kick_decay: f32,
    pub kick_click: f32,
    pub bass_cutoff: f32,
    pub bass_drive: f32,
    pub bass_attack: f32,
    pub bass_decay: f32,
    pub sidechain: f32,
    pub fx_stutter: f32,
    pub fx_sweep: f32,
    pub fx_bitcrush: f32,
}

impl Default for ParamValues {
    fn default() -> Self {
        ParamStore::default().load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_lie_within_ranges() {
        for id in ParamId::ALL {
            let r = id.range();
            assert!(r.min <= r.default && r.default <= r.max, "{:?}", id);
        }
    }

    #[test]
    fn set_clamps_and_ignores_nan() {
        let store = ParamStore::default();
        store.set(ParamId::BassCutoff, 1.0e6);
        assert_eq!(store.get(ParamId::BassCutoff), 2000.0);
        store.set(ParamId::BassCutoff, f32::NAN);
        assert_eq!(store.get(ParamId::BassCutoff), 2000.0);
        store.set(ParamId::KickPitch, 0.0);
        assert_eq!(store.get(ParamId::KickPitch), 40.0);
    }

    #[test]
    fn load_reflects_writes() {
        let store = ParamStore::default();
        store.set(ParamId::Sidechain, 0.9);
        store.set(ParamId::FxSweep, 0.25);
        let v = store.load();
        assert_eq!(v.sidechain, 0.9);
        assert_eq!(v.fx_sweep, 0.25);
        assert_eq!(v.kick_pitch, 60.0);
    }

    #[test]
    fn names_round_trip() {
        for id in ParamId::ALL {
            assert_eq!(ParamId::from_name(id.name()), Some(id));
        }
        assert_eq!(ParamId::from_name("volume"), None);
    }
}
