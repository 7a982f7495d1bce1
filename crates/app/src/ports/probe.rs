//! Temperature probe port.

use std::future::Future;
use std::sync::Arc;

use reefhub_domain::error::ReefHubError;

/// Reads a named temperature sensor.
pub trait TemperatureProbe: Send + Sync {
    /// Current reading of `sensor`, in degrees Celsius.
    fn read(&self, sensor: &str) -> impl Future<Output = Result<f64, ReefHubError>> + Send;
}

impl<T: TemperatureProbe> TemperatureProbe for Arc<T> {
    fn read(&self, sensor: &str) -> impl Future<Output = Result<f64, ReefHubError>> + Send {
        (**self).read(sensor)
    }
}
