//! Equipment state cache fed by `FACTORY_*` pushes.

use serde_json::Value;

use watchpost_core::Message;

/// Field value before the first push.
pub const UNKNOWN: i32 = -1;

/// Last known equipment state; each field is `UNKNOWN`, 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EquipmentState {
    pub run: i32,
    pub door: i32,
    pub helmet_ok: i32,
    pub error: i32,
}

impl Default for EquipmentState {
    fn default() -> Self {
        Self {
            run: UNKNOWN,
            door: UNKNOWN,
            helmet_ok: UNKNOWN,
            error: UNKNOWN,
        }
    }
}

/// Values carried by one push; `None` when the field is absent or not a
/// number/bool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FactoryReading {
    pub run: Option<i32>,
    pub door: Option<i32>,
    pub helmet_ok: Option<i32>,
    pub error: Option<i32>,
}

impl FactoryReading {
    pub fn parse(msg: &Message) -> Self {
        // servers disagree on `error` vs `fault`
        let error = int_field(msg, "error")
            .filter(|v| *v >= 0)
            .or_else(|| int_field(msg, "fault"));
        Self {
            run: int_field(msg, "run"),
            door: int_field(msg, "door"),
            helmet_ok: int_field(msg, "helmet_ok"),
            error,
        }
    }
}

/// Which fields an [`EquipmentState::apply`] actually changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EquipmentChange {
    pub run: bool,
    pub door: bool,
    pub helmet_ok: bool,
    pub error: bool,
}

impl EquipmentChange {
    pub fn any(&self) -> bool {
        self.run || self.door || self.helmet_ok || self.error
    }
}

impl EquipmentState {
    /// Take every field that carries a new, known value. Equal or unknown
    /// values leave the field alone.
    pub fn apply(&mut self, reading: &FactoryReading) -> EquipmentChange {
        EquipmentChange {
            run: step(&mut self.run, reading.run),
            door: step(&mut self.door, reading.door),
            helmet_ok: step(&mut self.helmet_ok, reading.helmet_ok),
            error: step(&mut self.error, reading.error),
        }
    }
}

fn step(slot: &mut i32, incoming: Option<i32>) -> bool {
    match incoming {
        Some(v) if v != UNKNOWN && v != *slot => {
            *slot = v;
            true
        }
        _ => false,
    }
}

/// Number (truncated) or bool (0/1).
fn int_field(msg: &Message, key: &str) -> Option<i32> {
    match msg.get(key)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(|v| v.clamp(i32::MIN as i64, i32::MAX as i64) as i32),
        Value::Bool(b) => Some(i32::from(*b)),
        _ => None,
    }
}
