//! ATO service — auto-top-off controllers.

use async_trait::async_trait;

use reefhub_domain::ato::{self, Ato};
use reefhub_domain::error::ReefHubError;
use reefhub_domain::id::EntityId;

use crate::ports::{ActuatorDriver, EntityStore};
use crate::registry::{CrudEntity, Subsystem, Toggleable};
use crate::services::RecordService;

/// Application service for auto-top-off controllers.
pub struct AtoService<S, D> {
    records: RecordService<Ato, S>,
    driver: D,
}

impl<S, D> AtoService<S, D>
where
    S: EntityStore<Ato>,
    D: ActuatorDriver,
{
    pub fn new(store: S, driver: D) -> Self {
        Self {
            records: RecordService::new(store),
            driver,
        }
    }

    #[must_use]
    pub fn records(&self) -> &RecordService<Ato, S> {
        &self.records
    }

    /// Enable or disable the controller. Disabling also switches its pump
    /// channel off so no top-off is left running.
    ///
    /// # Errors
    ///
    /// Returns [`ReefHubError::NotFound`] for an unknown controller, a storage
    /// error, or the driver's error when the pump cannot be stopped.
    #[tracing::instrument(skip(self))]
    pub async fn set_enabled(&self, id: EntityId, enable: bool) -> Result<Ato, ReefHubError> {
        let mut controller = self.records.get(id).await?;
        controller.enable = enable;
        let controller = self.records.save(controller).await?;
        if let (false, Some(pump)) = (enable, controller.pump) {
            self.driver.set_state(pump, false).await?;
        }
        tracing::info!(ato = %controller.name, enable, "ato toggled");
        Ok(controller)
    }
}

#[async_trait]
impl<S, D> Toggleable for AtoService<S, D>
where
    S: EntityStore<Ato>,
    D: ActuatorDriver,
{
    async fn on(&self, id: EntityId, state: bool) -> Result<(), ReefHubError> {
        self.set_enabled(id, state).await.map(|_| ())
    }
}

impl<S, D> Subsystem for AtoService<S, D>
where
    S: EntityStore<Ato>,
    D: ActuatorDriver,
{
    fn name(&self) -> &'static str {
        ato::KIND
    }

    fn crud(&self) -> &dyn CrudEntity {
        &self.records
    }

    fn toggleable(&self) -> Option<&dyn Toggleable> {
        Some(self)
    }
}
