//! Temperature controller — a named probe with a display unit.

use serde::{Deserialize, Serialize};

use crate::id::EntityId;
use crate::record::Record;

/// Subsystem name of the temperature controllers.
pub const KIND: &str = "temperature";

/// A temperature controller bound to a probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemperatureController {
    #[serde(default)]
    pub id: EntityId,
    pub name: String,
    /// Probe identifier understood by the temperature probe driver.
    pub sensor: String,
    /// Readings are reported in Fahrenheit instead of Celsius.
    #[serde(default)]
    pub fahrenheit: bool,
    #[serde(default)]
    pub enable: bool,
}

impl TemperatureController {
    #[must_use]
    pub fn new(name: impl Into<String>, sensor: impl Into<String>) -> Self {
        Self {
            id: EntityId::default(),
            name: name.into(),
            sensor: sensor.into(),
            fahrenheit: false,
            enable: true,
        }
    }

    /// Convert a Celsius probe reading into this controller's unit.
    #[must_use]
    pub fn to_unit(&self, celsius: f64) -> f64 {
        if self.fahrenheit {
            celsius * 9.0 / 5.0 + 32.0
        } else {
            celsius
        }
    }
}

impl Record for TemperatureController {
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
