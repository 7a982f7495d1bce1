use serde::{Deserialize, Serialize};

use crate::id::{EntityId, MacroId};

/// Declared type of a job target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Macro,
    Equipment,
}

impl TargetKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Macro => "macro",
            Self::Equipment => "equipment",
        }
    }
}

/// Payload of a `macro` target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerMacro {
    pub id: MacroId,
}

/// Payload of an `equipment` target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEquipment {
    pub id: EntityId,
    pub on: bool,
    /// Seconds after which the outlet is switched back. Zero keeps the new state.
    #[serde(default)]
    pub duration: u64,
}

/// Decoded reference to what a job runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Macro { id: MacroId },
    Equipment { id: EntityId, on: bool, duration: u64 },
}
