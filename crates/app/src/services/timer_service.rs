//! Timer service — job CRUD, schedule evaluation and dispatch.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde_json::value::RawValue;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use reefhub_domain::equipment;
use reefhub_domain::error::ReefHubError;
use reefhub_domain::id::{EntityId, JobId};
use reefhub_domain::macros::Macro;
use reefhub_domain::record::parse_id;
use reefhub_domain::timer::{self, Job, Target};

use crate::ports::EntityStore;
use crate::registry::{CrudEntity, Subsystem, SubsystemRegistry};
use crate::services::{MacroService, RecordService};

/// Application service for timer jobs.
///
/// Each job fires at most once per matching second: the second of the last
/// fire is kept per job and a tick evaluated again within that second is
/// ignored.
pub struct TimerService<JS, MS> {
    records: RecordService<Job, JS>,
    macros: Arc<MacroService<MS>>,
    shutdown: CancellationToken,
    last_fired: Mutex<HashMap<JobId, i64>>,
}

impl<JS, MS> TimerService<JS, MS>
where
    JS: EntityStore<Job>,
    MS: EntityStore<Macro>,
{
    pub fn new(store: JS, macros: Arc<MacroService<MS>>, shutdown: CancellationToken) -> Self {
        Self {
            records: RecordService::new(store),
            macros,
            shutdown,
            last_fired: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn records(&self) -> &RecordService<Job, JS> {
        &self.records
    }

    /// Delete a job and forget when it last fired.
    ///
    /// # Errors
    ///
    /// Returns [`ReefHubError::NotFound`] for an unknown job, or a storage error.
    pub async fn delete(&self, id: JobId) -> Result<(), ReefHubError> {
        self.records.delete(id).await?;
        self.last_fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        Ok(())
    }

    /// Evaluate every job against `now` and dispatch the matching ones.
    ///
    /// Dispatch failures are logged and do not stop the evaluation of the
    /// remaining jobs. Returns the jobs that were dispatched.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the jobs cannot be listed.
    pub async fn tick(
        &self,
        registry: &Arc<SubsystemRegistry>,
        now: NaiveDateTime,
    ) -> Result<Vec<JobId>, ReefHubError> {
        let second = now.and_utc().timestamp();
        let mut fired = Vec::new();
        for job in self.records.list().await? {
            if !job.fires_at(&now) || !self.claim(job.id, second) {
                continue;
            }
            match self.dispatch(registry, &job).await {
                Ok(()) => {
                    tracing::info!(job_id = %job.id, job = %job.name, "timer job fired");
                    fired.push(job.id);
                }
                Err(err) => {
                    tracing::warn!(job_id = %job.id, job = %job.name, error = %err, "failed to dispatch timer job");
                }
            }
        }
        Ok(fired)
    }

    fn claim(&self, id: JobId, second: i64) -> bool {
        let mut last_fired = self
            .last_fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if last_fired.get(&id) == Some(&second) {
            return false;
        }
        last_fired.insert(id, second);
        true
    }

    /// Resolve the job's target and start it without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns [`ReefHubError::InvalidConfig`] for an undecodable target, and
    /// the resolution errors of the target ([`ReefHubError::NotFound`] for a
    /// deleted macro or outlet).
    #[tracing::instrument(skip(self, registry, job), fields(job_id = %job.id))]
    pub async fn dispatch(
        &self,
        registry: &Arc<SubsystemRegistry>,
        job: &Job,
    ) -> Result<(), ReefHubError> {
        match job.target()? {
            Target::Macro { id } => {
                self.macros.trigger(Arc::clone(registry), id, false).await?;
            }
            Target::Equipment { id, on, duration } => {
                registry.toggleable(equipment::KIND)?;
                let registry = Arc::clone(registry);
                let cancel = self.shutdown.child_token();
                let span = tracing::info_span!("timer_equipment", equipment_id = %id, on);
                tokio::spawn(
                    switch_equipment(registry, id, on, duration, cancel).instrument(span),
                );
            }
        }
        Ok(())
    }
}

async fn switch_equipment(
    registry: Arc<SubsystemRegistry>,
    id: EntityId,
    on: bool,
    duration: u64,
    cancel: CancellationToken,
) {
    if let Err(err) = registry.on(equipment::KIND, id, on).await {
        tracing::warn!(error = %err, "failed to switch equipment");
        return;
    }
    if duration == 0 {
        return;
    }
    tokio::select! {
        () = tokio::time::sleep(Duration::from_secs(duration)) => {
            if let Err(err) = registry.on(equipment::KIND, id, !on).await {
                tracing::warn!(error = %err, "failed to switch equipment back");
            }
        }
        () = cancel.cancelled() => {
            tracing::debug!("shutdown before equipment was switched back");
        }
    }
}

/// Registry view of the jobs. Deleting through it clears the fire ledger
/// like [`TimerService::delete`].
#[async_trait]
impl<JS, MS> CrudEntity for TimerService<JS, MS>
where
    JS: EntityStore<Job>,
    MS: EntityStore<Macro>,
{
    async fn list(&self) -> Result<Vec<Box<RawValue>>, ReefHubError> {
        CrudEntity::list(&self.records).await
    }

    async fn get(&self, id: &str) -> Result<Box<RawValue>, ReefHubError> {
        CrudEntity::get(&self.records, id).await
    }

    async fn create(&self, payload: &RawValue) -> Result<Box<RawValue>, ReefHubError> {
        CrudEntity::create(&self.records, payload).await
    }

    async fn update(&self, id: &str, payload: &RawValue) -> Result<Box<RawValue>, ReefHubError> {
        CrudEntity::update(&self.records, id, payload).await
    }

    async fn delete(&self, id: &str) -> Result<(), ReefHubError> {
        TimerService::delete(self, parse_id::<Job>(id)?).await
    }
}

impl<JS, MS> Subsystem for TimerService<JS, MS>
where
    JS: EntityStore<Job>,
    MS: EntityStore<Macro>,
{
    fn name(&self) -> &'static str {
        timer::KIND
    }

    fn crud(&self) -> &dyn CrudEntity {
        self
    }
}
