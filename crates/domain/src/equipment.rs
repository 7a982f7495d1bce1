//! Equipment — a powered outlet switched by a relay.

use serde::{Deserialize, Serialize};

use crate::id::EntityId;
use crate::record::Record;

/// Subsystem name of the equipment outlets.
pub const KIND: &str = "equipment";

/// A heater, pump or valve plugged into a relay channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    #[serde(default)]
    pub id: EntityId,
    pub name: String,
    pub outlet: u32,
    /// Last state applied to the outlet.
    #[serde(default)]
    pub on: bool,
}

impl Equipment {
    #[must_use]
    pub fn new(name: impl Into<String>, outlet: u32) -> Self {
        Self {
            id: EntityId::default(),
            name: name.into(),
            outlet,
            on: false,
        }
    }
}

impl Record for Equipment {
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
