//! Temperature service — probes and their controllers.

use async_trait::async_trait;

use reefhub_domain::error::ReefHubError;
use reefhub_domain::id::EntityId;
use reefhub_domain::temperature::{self, TemperatureController};

use crate::ports::{EntityStore, TemperatureProbe};
use crate::registry::{CrudEntity, Subsystem, TemperatureReading, Toggleable};
use crate::services::RecordService;

/// Application service for temperature controllers.
pub struct TemperatureService<S, P> {
    records: RecordService<TemperatureController, S>,
    probe: P,
}

impl<S, P> TemperatureService<S, P>
where
    S: EntityStore<TemperatureController>,
    P: TemperatureProbe,
{
    pub fn new(store: S, probe: P) -> Self {
        Self {
            records: RecordService::new(store),
            probe,
        }
    }

    #[must_use]
    pub fn records(&self) -> &RecordService<TemperatureController, S> {
        &self.records
    }

    /// Current reading of controller `id`, in its configured unit.
    ///
    /// # Errors
    ///
    /// Returns [`ReefHubError::NotFound`] for an unknown controller, or the
    /// probe's error.
    #[tracing::instrument(skip(self))]
    pub async fn read(&self, id: EntityId) -> Result<f64, ReefHubError> {
        let controller = self.records.get(id).await?;
        let celsius = self.probe.read(&controller.sensor).await?;
        let reading = controller.to_unit(celsius);
        tracing::debug!(controller = %controller.name, reading, "temperature read");
        Ok(reading)
    }

    /// # Errors
    ///
    /// Returns [`ReefHubError::NotFound`] for an unknown controller, or a
    /// storage error.
    #[tracing::instrument(skip(self))]
    pub async fn set_enabled(
        &self,
        id: EntityId,
        enable: bool,
    ) -> Result<TemperatureController, ReefHubError> {
        let mut controller = self.records.get(id).await?;
        controller.enable = enable;
        self.records.save(controller).await
    }
}

#[async_trait]
impl<S, P> TemperatureReading for TemperatureService<S, P>
where
    S: EntityStore<TemperatureController>,
    P: TemperatureProbe,
{
    async fn read(&self, id: EntityId) -> Result<f64, ReefHubError> {
        TemperatureService::read(self, id).await
    }
}

#[async_trait]
impl<S, P> Toggleable for TemperatureService<S, P>
where
    S: EntityStore<TemperatureController>,
    P: TemperatureProbe,
{
    async fn on(&self, id: EntityId, state: bool) -> Result<(), ReefHubError> {
        self.set_enabled(id, state).await.map(|_| ())
    }
}

impl<S, P> Subsystem for TemperatureService<S, P>
where
    S: EntityStore<TemperatureController>,
    P: TemperatureProbe,
{
    fn name(&self) -> &'static str {
        temperature::KIND
    }

    fn crud(&self) -> &dyn CrudEntity {
        &self.records
    }

    fn toggleable(&self) -> Option<&dyn Toggleable> {
        Some(self)
    }

    fn sensor(&self) -> Option<&dyn TemperatureReading> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeProbe, InMemoryStore};
    use std::sync::Arc;

    fn make_service() -> (
        TemperatureService<InMemoryStore<TemperatureController>, Arc<FakeProbe>>,
        Arc<FakeProbe>,
    ) {
        let probe = Arc::new(FakeProbe::default());
        (
            TemperatureService::new(InMemoryStore::default(), Arc::clone(&probe)),
            probe,
        )
    }

    #[tokio::test]
    async fn should_report_celsius_reading() {
        let (svc, probe) = make_service();
        probe.set("t1", 26.5);
        let tc = svc
            .records()
            .create(TemperatureController::new("display tank", "t1"))
            .await
            .unwrap();

        assert!((svc.read(tc.id).await.unwrap() - 26.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn should_convert_reading_when_controller_uses_fahrenheit() {
        let (svc, probe) = make_service();
        probe.set("t1", 25.0);
        let mut draft = TemperatureController::new("display tank", "t1");
        draft.fahrenheit = true;
        let tc = svc.records().create(draft).await.unwrap();

        assert!((svc.read(tc.id).await.unwrap() - 77.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn should_fail_when_probe_is_unavailable() {
        let (svc, _) = make_service();
        let tc = svc
            .records()
            .create(TemperatureController::new("sump", "missing"))
            .await
            .unwrap();

        assert!(matches!(svc.read(tc.id).await, Err(ReefHubError::Actuator(_))));
    }
}
