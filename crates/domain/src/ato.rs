//! Auto-top-off — keeps the water level by driving a pump from a level sensor.

use serde::{Deserialize, Serialize};

use crate::id::EntityId;
use crate::record::Record;

/// Subsystem name of the auto-top-off units.
pub const KIND: &str = "ato";

/// An auto-top-off controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ato {
    #[serde(default)]
    pub id: EntityId,
    pub name: String,
    /// Level sensor inlet.
    #[serde(default)]
    pub inlet: String,
    /// Relay channel of the refill pump, when this unit controls one.
    #[serde(default)]
    pub pump: Option<u32>,
    #[serde(default)]
    pub enable: bool,
    /// Check period in seconds.
    #[serde(default = "default_period")]
    pub period: u64,
}

fn default_period() -> u64 {
    3
}

impl Ato {
    #[must_use]
    pub fn new(name: impl Into<String>, inlet: impl Into<String>) -> Self {
        Self {
            id: EntityId::default(),
            name: name.into(),
            inlet: inlet.into(),
            pump: None,
            enable: false,
            period: default_period(),
        }
    }

    #[must_use]
    pub fn with_pump(mut self, channel: u32) -> Self {
        self.pump = Some(channel);
        self
    }
}

impl Record for Ato {
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
