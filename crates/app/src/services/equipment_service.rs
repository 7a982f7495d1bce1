//! Equipment service — outlets switched through relay channels.

use async_trait::async_trait;

use reefhub_domain::equipment::{self, Equipment};
use reefhub_domain::error::ReefHubError;
use reefhub_domain::id::EntityId;

use crate::ports::{ActuatorDriver, EntityStore};
use crate::registry::{CrudEntity, Subsystem, Toggleable};
use crate::services::RecordService;

/// Application service for equipment outlets.
pub struct EquipmentService<S, D> {
    records: RecordService<Equipment, S>,
    driver: D,
}

impl<S, D> EquipmentService<S, D>
where
    S: EntityStore<Equipment>,
    D: ActuatorDriver,
{
    pub fn new(store: S, driver: D) -> Self {
        Self {
            records: RecordService::new(store),
            driver,
        }
    }

    #[must_use]
    pub fn records(&self) -> &RecordService<Equipment, S> {
        &self.records
    }

    /// Drive the outlet's relay, then persist the new state.
    ///
    /// # Errors
    ///
    /// Returns [`ReefHubError::NotFound`] for an unknown outlet, the driver's
    /// error when the relay cannot be switched, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn switch(&self, id: EntityId, on: bool) -> Result<Equipment, ReefHubError> {
        let mut outlet = self.records.get(id).await?;
        self.driver.set_state(outlet.outlet, on).await?;
        outlet.on = on;
        let outlet = self.records.save(outlet).await?;
        tracing::info!(equipment = %outlet.name, channel = outlet.outlet, on, "equipment switched");
        Ok(outlet)
    }
}

#[async_trait]
impl<S, D> Toggleable for EquipmentService<S, D>
where
    S: EntityStore<Equipment>,
    D: ActuatorDriver,
{
    async fn on(&self, id: EntityId, state: bool) -> Result<(), ReefHubError> {
        self.switch(id, state).await.map(|_| ())
    }
}

impl<S, D> Subsystem for EquipmentService<S, D>
where
    S: EntityStore<Equipment>,
    D: ActuatorDriver,
{
    fn name(&self) -> &'static str {
        equipment::KIND
    }

    fn crud(&self) -> &dyn CrudEntity {
        &self.records
    }

    fn toggleable(&self) -> Option<&dyn Toggleable> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryStore, RecordingDriver, SideEffect};
    use std::sync::Arc;

    fn make_service() -> (
        EquipmentService<InMemoryStore<Equipment>, Arc<RecordingDriver>>,
        Arc<RecordingDriver>,
    ) {
        let driver = Arc::new(RecordingDriver::default());
        (
            EquipmentService::new(InMemoryStore::default(), Arc::clone(&driver)),
            driver,
        )
    }

    #[tokio::test]
    async fn should_switch_relay_and_persist_state() {
        let (svc, driver) = make_service();
        let heater = svc.records().create(Equipment::new("heater", 6)).await.unwrap();

        svc.switch(heater.id, true).await.unwrap();

        assert_eq!(
            driver.effects(),
            vec![SideEffect::Relay { channel: 6, on: true }]
        );
        assert!(svc.records().get(heater.id).await.unwrap().on);
    }

    #[tokio::test]
    async fn should_keep_previous_state_when_relay_fails() {
        let (svc, driver) = make_service();
        driver.fail_channel(6);
        let heater = svc.records().create(Equipment::new("heater", 6)).await.unwrap();

        let result = svc.switch(heater.id, true).await;

        assert!(matches!(result, Err(ReefHubError::Actuator(_))));
        assert!(!svc.records().get(heater.id).await.unwrap().on);
    }

    #[tokio::test]
    async fn should_expose_toggle_capability() {
        let (svc, _) = make_service();
        assert!(svc.toggleable().is_some());
        assert!(svc.sensor().is_none());
        assert_eq!(svc.name(), "equipment");
    }
}
