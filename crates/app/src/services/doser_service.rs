//! Doser service — dosing pumps and their usage telemetry.

use std::time::Duration;

use async_trait::async_trait;

use reefhub_domain::doser::{self, DosingPump, Usage};
use reefhub_domain::error::ReefHubError;
use reefhub_domain::id::EntityId;

use crate::ports::{ActuatorDriver, Clock, EntityStore, UsageRecorder};
use crate::registry::{CrudEntity, Dosing, Subsystem, Toggleable};
use crate::services::RecordService;

/// Application service for dosing pumps.
///
/// Usage records are stamped with the injected clock.
pub struct DoserService<S, D, U, C> {
    records: RecordService<DosingPump, S>,
    driver: D,
    usage: U,
    clock: C,
}

impl<S, D, U, C> DoserService<S, D, U, C>
where
    S: EntityStore<DosingPump>,
    D: ActuatorDriver,
    U: UsageRecorder,
    C: Clock,
{
    pub fn new(store: S, driver: D, usage: U, clock: C) -> Self {
        Self {
            records: RecordService::new(store),
            driver,
            usage,
            clock,
        }
    }

    #[must_use]
    pub fn records(&self) -> &RecordService<DosingPump, S> {
        &self.records
    }

    /// Run pump `id` at `speed` for `duration`, then record its usage.
    ///
    /// A failure to record usage is logged and does not fail the dose.
    ///
    /// # Errors
    ///
    /// Returns [`ReefHubError::NotFound`] for an unknown pump, or the driver's
    /// error when the motor cannot run.
    #[tracing::instrument(skip(self))]
    pub async fn dose(
        &self,
        id: EntityId,
        speed: f64,
        duration: Duration,
    ) -> Result<Usage, ReefHubError> {
        let pump = self.records.get(id).await?;
        self.driver.dose(&pump, speed, duration).await?;
        let usage = Usage {
            time: self.clock.now(),
            amount: duration.as_secs_f64(),
        };
        if let Err(err) = self.usage.record(pump.id, usage.clone()).await {
            tracing::warn!(pump = %pump.name, error = %err, "failed to record dosing usage");
        }
        tracing::info!(pump = %pump.name, speed, seconds = usage.amount, "dose finished");
        Ok(usage)
    }

    /// Most recent usage records of pump `id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ReefHubError::NotFound`] for an unknown pump, or a storage error.
    pub async fn usage(&self, id: EntityId, limit: usize) -> Result<Vec<Usage>, ReefHubError> {
        self.records.get(id).await?;
        self.usage.history(id, limit).await
    }

    /// # Errors
    ///
    /// Returns [`ReefHubError::NotFound`] for an unknown pump, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn set_enabled(
        &self,
        id: EntityId,
        enable: bool,
    ) -> Result<DosingPump, ReefHubError> {
        let mut pump = self.records.get(id).await?;
        pump.enable = enable;
        self.records.save(pump).await
    }
}

#[async_trait]
impl<S, D, U, C> Toggleable for DoserService<S, D, U, C>
where
    S: EntityStore<DosingPump>,
    D: ActuatorDriver,
    U: UsageRecorder,
    C: Clock,
{
    async fn on(&self, id: EntityId, state: bool) -> Result<(), ReefHubError> {
        self.set_enabled(id, state).await.map(|_| ())
    }
}

#[async_trait]
impl<S, D, U, C> Dosing for DoserService<S, D, U, C>
where
    S: EntityStore<DosingPump>,
    D: ActuatorDriver,
    U: UsageRecorder,
    C: Clock,
{
    async fn dose(
        &self,
        id: EntityId,
        speed: f64,
        duration: Duration,
    ) -> Result<(), ReefHubError> {
        DoserService::dose(self, id, speed, duration)
            .await
            .map(|_| ())
    }

    async fn usage(&self, id: EntityId, limit: usize) -> Result<Vec<Usage>, ReefHubError> {
        DoserService::usage(self, id, limit).await
    }
}

impl<S, D, U, C> Subsystem for DoserService<S, D, U, C>
where
    S: EntityStore<DosingPump>,
    D: ActuatorDriver,
    U: UsageRecorder,
    C: Clock,
{
    fn name(&self) -> &'static str {
        doser::KIND
    }

    fn crud(&self) -> &dyn CrudEntity {
        &self.records
    }

    fn toggleable(&self) -> Option<&dyn Toggleable> {
        Some(self)
    }

    fn doser(&self) -> Option<&dyn Dosing> {
        Some(self)
    }
}
