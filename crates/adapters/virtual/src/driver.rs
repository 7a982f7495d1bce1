//! Virtual actuator driver — pump motors and relay channels held in memory.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use reefhub_app::ports::ActuatorDriver;
use reefhub_domain::doser::DosingPump;
use reefhub_domain::error::{ActuatorError, ReefHubError};
use reefhub_domain::id::EntityId;
use reefhub_domain::macros::MAX_DOSE_SPEED;

/// A dose performed by the [`VirtualDriver`].
#[derive(Debug, Clone, PartialEq)]
pub struct DoseRecord {
    pub pump: EntityId,
    pub jack: String,
    pub speed: f64,
    pub duration: Duration,
}

/// Simulated motors and relays.
///
/// In real-time mode a dose takes as long as it would on hardware.
/// Channels marked faulty reject every switch.
#[derive(Debug, Default)]
pub struct VirtualDriver {
    realtime: bool,
    faulty_channels: HashSet<u32>,
    relays: Mutex<HashMap<u32, bool>>,
    doses: Mutex<Vec<DoseRecord>>,
}

impl VirtualDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    #[must_use]
    pub fn with_faulty_channels(mut self, channels: impl IntoIterator<Item = u32>) -> Self {
        self.faulty_channels.extend(channels);
        self
    }

    /// Current state of `channel`, `None` if it was never switched.
    #[must_use]
    pub fn relay(&self, channel: u32) -> Option<bool> {
        self.relays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&channel)
            .copied()
    }

    /// Every dose performed so far, oldest first.
    #[must_use]
    pub fn doses(&self) -> Vec<DoseRecord> {
        self.doses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ActuatorDriver for VirtualDriver {
    async fn dose(
        &self,
        pump: &DosingPump,
        speed: f64,
        duration: Duration,
    ) -> Result<(), ReefHubError> {
        if !(0.0..=MAX_DOSE_SPEED).contains(&speed) {
            return Err(ActuatorError::Fault {
                device: pump.name.clone(),
                source: format!("speed {speed} outside 0..={MAX_DOSE_SPEED}").into(),
            }
            .into());
        }
        tracing::debug!(pump = %pump.name, jack = %pump.jack, speed, ?duration, "virtual dose started");
        if self.realtime {
            tokio::time::sleep(duration).await;
        }
        self.doses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(DoseRecord {
                pump: pump.id,
                jack: pump.jack.clone(),
                speed,
                duration,
            });
        Ok(())
    }

    async fn set_state(&self, channel: u32, on: bool) -> Result<(), ReefHubError> {
        if self.faulty_channels.contains(&channel) {
            tracing::warn!(channel, "virtual relay channel is faulty");
            return Err(ActuatorError::UnknownChannel { channel }.into());
        }
        self.relays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(channel, on);
        tracing::debug!(channel, on, "virtual relay switched");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_remember_relay_state() {
        let driver = VirtualDriver::new();
        assert_eq!(driver.relay(4), None);

        driver.set_state(4, true).await.unwrap();
        driver.set_state(4, false).await.unwrap();

        assert_eq!(driver.relay(4), Some(false));
    }

    #[tokio::test]
    async fn should_reject_faulty_channel() {
        let driver = VirtualDriver::new().with_faulty_channels([7]);

        let result = driver.set_state(7, true).await;

        assert!(matches!(
            result,
            Err(ReefHubError::Actuator(ActuatorError::UnknownChannel { channel: 7 }))
        ));
        assert_eq!(driver.relay(7), None);
    }

    #[tokio::test]
    async fn should_record_dose() {
        let driver = VirtualDriver::new();
        let pump = DosingPump::new("alk", "j1");

        driver
            .dose(&pump, 60.0, Duration::from_secs(30))
            .await
            .unwrap();

        assert_eq!(
            driver.doses(),
            vec![DoseRecord {
                pump: pump.id,
                jack: "j1".to_string(),
                speed: 60.0,
                duration: Duration::from_secs(30),
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_take_full_duration_in_realtime_mode() {
        let driver = VirtualDriver::new().with_realtime(true);
        let pump = DosingPump::new("alk", "j1");
        let started = tokio::time::Instant::now();

        driver
            .dose(&pump, 60.0, Duration::from_secs(90))
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_secs(90));
    }

    #[tokio::test]
    async fn should_reject_speed_out_of_range() {
        let driver = VirtualDriver::new();
        let pump = DosingPump::new("alk", "j1");

        let result = driver.dose(&pump, 140.0, Duration::from_secs(1)).await;

        assert!(matches!(
            result,
            Err(ReefHubError::Actuator(ActuatorError::Fault { .. }))
        ));
        assert!(driver.doses().is_empty());
    }
}
