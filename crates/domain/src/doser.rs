//! Dosing pump — a motor that moves a liquid for a given speed and duration.

use serde::{Deserialize, Serialize};

use crate::id::EntityId;
use crate::record::Record;
use crate::time::Timestamp;

/// Subsystem name of the dosing pumps.
pub const KIND: &str = "doser";

/// A peristaltic or stepper dosing pump wired to a jack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DosingPump {
    #[serde(default)]
    pub id: EntityId,
    pub name: String,
    /// Jack (pin group) the motor driver is wired to.
    #[serde(default)]
    pub jack: String,
    #[serde(default)]
    pub is_stepper: bool,
    #[serde(default)]
    pub steps_per_revolution: u32,
    #[serde(default)]
    pub enable: bool,
}

impl DosingPump {
    #[must_use]
    pub fn new(name: impl Into<String>, jack: impl Into<String>) -> Self {
        Self {
            id: EntityId::default(),
            name: name.into(),
            jack: jack.into(),
            is_stepper: false,
            steps_per_revolution: 0,
            enable: true,
        }
    }
}

impl Record for DosingPump {
    type Id = EntityId;
    const KIND: &'static str = KIND;

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Telemetry written after every successful dose. Never read back by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub time: Timestamp,
    /// Seconds the pump ran.
    pub amount: f64,
}
