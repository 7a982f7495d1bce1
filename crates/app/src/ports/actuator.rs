//! Actuator port — hardware-specific motor and relay control.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reefhub_domain::doser::DosingPump;
use reefhub_domain::error::ReefHubError;

/// Drives pump motors and relay channels.
///
/// Implementations live in adapter crates (e.g. `adapter_virtual`).
pub trait ActuatorDriver: Send + Sync {
    /// Run `pump` at `speed` percent for `duration`. Resolves once the
    /// motor has stopped.
    fn dose(
        &self,
        pump: &DosingPump,
        speed: f64,
        duration: Duration,
    ) -> impl Future<Output = Result<(), ReefHubError>> + Send;

    /// Switch a relay channel.
    fn set_state(
        &self,
        channel: u32,
        on: bool,
    ) -> impl Future<Output = Result<(), ReefHubError>> + Send;
}

impl<T: ActuatorDriver> ActuatorDriver for Arc<T> {
    fn dose(
        &self,
        pump: &DosingPump,
        speed: f64,
        duration: Duration,
    ) -> impl Future<Output = Result<(), ReefHubError>> + Send {
        (**self).dose(pump, speed, duration)
    }

    fn set_state(
        &self,
        channel: u32,
        on: bool,
    ) -> impl Future<Output = Result<(), ReefHubError>> + Send {
        (**self).set_state(channel, on)
    }
}
