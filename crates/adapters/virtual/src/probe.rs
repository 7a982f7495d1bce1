//! Virtual temperature probe.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use reefhub_app::ports::TemperatureProbe;
use reefhub_domain::error::ReefHubError;

/// Reading reported by sensors that were never set.
pub const DEFAULT_CELSIUS: f64 = 25.0;

/// Probe whose readings are set by hand.
#[derive(Debug, Default)]
pub struct VirtualProbe {
    readings: Mutex<HashMap<String, f64>>,
}

impl VirtualProbe {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, sensor: impl Into<String>, celsius: f64) {
        self.readings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(sensor.into(), celsius);
    }
}

impl TemperatureProbe for VirtualProbe {
    async fn read(&self, sensor: &str) -> Result<f64, ReefHubError> {
        let reading = self
            .readings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(sensor)
            .copied()
            .unwrap_or(DEFAULT_CELSIUS);
        Ok(reading)
    }
}
