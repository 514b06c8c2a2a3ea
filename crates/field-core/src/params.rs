//! Host parameter store.
//!
//! The Machine never owns the plugin's parameters. It reads and writes them
//! through [`ParamStore`], which mirrors the host automation contract:
//! every write is wrapped in a begin/set/end gesture so host undo and
//! automation recording see engine edits the same way they see knob drags.
//!
//! [`ParameterTree`] is the in-process implementation used by the plugin shell
//! and by tests. Values live in [`AtomicFloat`]s so the audio thread can read
//! them without locking; listeners get [`ParameterEvent`]s over a channel.

use crate::{AtomicFloat, ParamError, ParameterRange};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Parameter identifiers the Machine knows how to propose.
pub mod ids {
    pub const MONO_HZ: &str = "mono_hz";
    pub const WIDTH_LO: &str = "width_lo";
    pub const WIDTH_MID: &str = "width_mid";
    pub const WIDTH_HI: &str = "width_hi";
    pub const ROTATION_DEG: &str = "rotation_deg";
    pub const XOVER_LO_HZ: &str = "xover_lo_hz";
    pub const XOVER_HI_HZ: &str = "xover_hi_hz";
    pub const SHUFFLER_LO_PCT: &str = "shuffler_lo_pct";
    pub const SHUFFLER_HI_PCT: &str = "shuffler_hi_pct";
    pub const TILT_DB: &str = "tilt_db";
    pub const BASS_DB: &str = "bass_db";
    pub const AIR_DB: &str = "air_db";
    pub const SCOOP_DB: &str = "scoop_db";
    pub const HP_HZ: &str = "hp_hz";
    pub const LP_HZ: &str = "lp_hz";
    pub const SPACE_DEPTH: &str = "space_depth";
    pub const SPACE_ALGO: &str = "space_algo";
    pub const DUCK_DEPTH_DB: &str = "duck_depth_db";
    pub const DUCK_ATTACK_MS: &str = "duck_attack_ms";
    pub const DUCK_RELEASE_MS: &str = "duck_release_ms";
    pub const DUCK_THRESHOLD_DB: &str = "duck_threshold_db";
    pub const DUCK_RATIO: &str = "duck_ratio";
    pub const DUCK_WET_ONLY: &str = "duck_wet_only";
}

/// Notification emitted by a [`ParameterTree`] for every gesture step.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterEvent {
    GestureBegin { id: String },
    Changed { id: String, value: f32 },
    GestureEnd { id: String },
}

/// Read/write access to the live parameter set, keyed by string id.
pub trait ParamStore: Send + Sync {
    fn value(&self, id: &str) -> Result<f32, ParamError>;

    fn range(&self, id: &str) -> Result<ParameterRange, ParamError>;

    fn begin_gesture(&self, id: &str) -> Result<(), ParamError>;

    /// Store `value` (clamped to the parameter's range) and return what was stored.
    fn set_value(&self, id: &str, value: f32) -> Result<f32, ParamError>;

    fn end_gesture(&self, id: &str) -> Result<(), ParamError>;

    /// One complete begin/set/end gesture.
    fn write(&self, id: &str, value: f32) -> Result<f32, ParamError> {
        self.begin_gesture(id)?;
        let stored = self.set_value(id, value);
        self.end_gesture(id)?;
        stored
    }
}

struct ParamSlot {
    range: ParameterRange,
    value: AtomicFloat,
}

/// Concrete parameter store with change notifications.
pub struct ParameterTree {
    slots: HashMap<String, ParamSlot>,
    listeners: Mutex<Vec<Sender<ParameterEvent>>>,
}

impl ParameterTree {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Register a parameter at its default value.
    pub fn with_param(mut self, id: impl Into<String>, range: ParameterRange) -> Self {
        self.slots.insert(
            id.into(),
            ParamSlot {
                range,
                value: AtomicFloat::new(range.default),
            },
        );
        self
    }

    /// Every parameter the Machine can propose, at plugin defaults.
    pub fn field_defaults() -> Self {
        Self::new()
            .with_param(ids::MONO_HZ, ParameterRange::logarithmic(20.0, 300.0, 60.0))
            .with_param(ids::WIDTH_LO, ParameterRange::linear(0.0, 2.0, 1.0))
            .with_param(ids::WIDTH_MID, ParameterRange::linear(0.0, 2.0, 1.0))
            .with_param(ids::WIDTH_HI, ParameterRange::linear(0.0, 2.0, 1.0))
            .with_param(ids::ROTATION_DEG, ParameterRange::linear(-45.0, 45.0, 0.0))
            .with_param(ids::XOVER_LO_HZ, ParameterRange::logarithmic(40.0, 800.0, 150.0))
            .with_param(
                ids::XOVER_HI_HZ,
                ParameterRange::logarithmic(1000.0, 12000.0, 3000.0),
            )
            .with_param(ids::SHUFFLER_LO_PCT, ParameterRange::linear(0.0, 100.0, 0.0))
            .with_param(ids::SHUFFLER_HI_PCT, ParameterRange::linear(0.0, 100.0, 0.0))
            .with_param(ids::TILT_DB, ParameterRange::linear(-6.0, 6.0, 0.0))
            .with_param(ids::BASS_DB, ParameterRange::linear(-6.0, 6.0, 0.0))
            .with_param(ids::AIR_DB, ParameterRange::linear(-6.0, 6.0, 0.0))
            .with_param(ids::SCOOP_DB, ParameterRange::linear(-6.0, 0.0, 0.0))
            .with_param(ids::HP_HZ, ParameterRange::logarithmic(20.0, 400.0, 20.0))
            .with_param(ids::LP_HZ, ParameterRange::logarithmic(2000.0, 20000.0, 20000.0))
            .with_param(ids::SPACE_DEPTH, ParameterRange::linear(0.0, 1.0, 0.2))
            .with_param(ids::SPACE_ALGO, ParameterRange::integer(0, 1, 0))
            .with_param(ids::DUCK_DEPTH_DB, ParameterRange::linear(0.0, 24.0, 0.0))
            .with_param(ids::DUCK_ATTACK_MS, ParameterRange::logarithmic(1.0, 200.0, 10.0))
            .with_param(
                ids::DUCK_RELEASE_MS,
                ParameterRange::logarithmic(20.0, 2000.0, 250.0),
            )
            .with_param(ids::DUCK_THRESHOLD_DB, ParameterRange::linear(-60.0, 0.0, -24.0))
            .with_param(ids::DUCK_RATIO, ParameterRange::linear(1.0, 20.0, 2.0))
            .with_param(ids::DUCK_WET_ONLY, ParameterRange::toggle(false))
    }

    /// Receive every subsequent [`ParameterEvent`].
    pub fn subscribe(&self) -> Receiver<ParameterEvent> {
        let (tx, rx) = unbounded();
        self.listeners.lock().push(tx);
        rx
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All `(id, value)` pairs, sorted by id.
    pub fn snapshot(&self) -> Vec<(String, f32)> {
        let mut values: Vec<(String, f32)> = self
            .slots
            .iter()
            .map(|(id, slot)| (id.clone(), slot.value.get()))
            .collect();
        values.sort_by(|a, b| a.0.cmp(&b.0));
        values
    }

    fn slot(&self, id: &str) -> Result<&ParamSlot, ParamError> {
        self.slots
            .get(id)
            .ok_or_else(|| ParamError::NotFound(id.to_string()))
    }

    fn notify(&self, event: ParameterEvent) {
        let mut listeners = self.listeners.lock();
        // Drop listeners whose receiver has gone away.
        listeners.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl Default for ParameterTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamStore for ParameterTree {
    fn value(&self, id: &str) -> Result<f32, ParamError> {
        Ok(self.slot(id)?.value.get())
    }

    fn range(&self, id: &str) -> Result<ParameterRange, ParamError> {
        Ok(self.slot(id)?.range)
    }

    fn begin_gesture(&self, id: &str) -> Result<(), ParamError> {
        self.slot(id)?;
        self.notify(ParameterEvent::GestureBegin { id: id.to_string() });
        Ok(())
    }

    fn set_value(&self, id: &str, value: f32) -> Result<f32, ParamError> {
        let slot = self.slot(id)?;
        let stored = slot.range.clamp(value);
        slot.value.set(stored);
        self.notify(ParameterEvent::Changed {
            id: id.to_string(),
            value: stored,
        });
        Ok(stored)
    }

    fn end_gesture(&self, id: &str) -> Result<(), ParamError> {
        self.slot(id)?;
        self.notify(ParameterEvent::GestureEnd { id: id.to_string() });
        Ok(())
    }
}
