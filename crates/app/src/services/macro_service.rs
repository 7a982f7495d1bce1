//! Macro service — macro CRUD and run/revert triggering.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use reefhub_domain::error::ReefHubError;
use reefhub_domain::id::MacroId;
use reefhub_domain::macros::{self, Macro};

use crate::macro_engine::MacroEngine;
use crate::ports::EntityStore;
use crate::registry::{CrudEntity, Subsystem, SubsystemRegistry};
use crate::services::RecordService;

/// Application service for macros.
///
/// Runs are spawned on their own task with a child of the service's
/// shutdown token, so cancelling that token aborts every in-flight run.
pub struct MacroService<S> {
    records: RecordService<Macro, S>,
    engine: MacroEngine,
    shutdown: CancellationToken,
}

impl<S: EntityStore<Macro>> MacroService<S> {
    pub fn new(store: S, engine: MacroEngine, shutdown: CancellationToken) -> Self {
        Self {
            records: RecordService::new(store),
            engine,
            shutdown,
        }
    }

    #[must_use]
    pub fn records(&self) -> &RecordService<Macro, S> {
        &self.records
    }

    /// Start a run of macro `id` on a separate task.
    ///
    /// Lookup, reversibility and step decoding are checked before the task
    /// is spawned, so those errors reach the caller and nothing is executed.
    /// Failures during the run are logged and reported through the returned
    /// handle only.
    ///
    /// # Errors
    ///
    /// Returns [`ReefHubError::NotFound`], [`ReefHubError::NotReversible`] or
    /// the decoding error of a malformed step.
    #[tracing::instrument(skip(self, registry))]
    pub async fn trigger(
        &self,
        registry: Arc<SubsystemRegistry>,
        id: MacroId,
        reverse: bool,
    ) -> Result<JoinHandle<Result<(), ReefHubError>>, ReefHubError> {
        let m = self.records.get(id).await?;
        let plan = self.engine.plan(&m, reverse)?;
        let engine = self.engine.clone();
        let cancel = self.shutdown.child_token();
        let span = tracing::info_span!("macro_run", macro_id = %id, reverse);
        Ok(tokio::spawn(
            async move { engine.execute(&registry, &m, &plan, &cancel).await }.instrument(span),
        ))
    }

    /// Cancel every in-flight run.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl<S: EntityStore<Macro>> Subsystem for MacroService<S> {
    fn name(&self) -> &'static str {
        macros::KIND
    }

    fn crud(&self) -> &dyn CrudEntity {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{Clock, UsageRecorder};
    use crate::testing::{Fixture, SideEffect};
    use reefhub_domain::doser::DosingPump;
    use reefhub_domain::equipment::Equipment;
    use reefhub_domain::error::{NotFoundError, ValidationError};
    use reefhub_domain::id::EntityId;
    use reefhub_domain::macros::{DoserStep, GenericStep, Step, StepKind, WaitStep};
    use reefhub_domain::record::Record;
    use std::time::Duration;

    fn toggle(id: EntityId, on: bool) -> Step {
        Step::new(StepKind::Equipment, &GenericStep { id, on }).unwrap()
    }

    #[tokio::test]
    async fn should_run_macro_on_spawned_task() {
        let fx = Fixture::new();
        let heater = fx.add_equipment(Equipment::new("heater", 4)).await;
        let m = fx
            .macros
            .records()
            .create(
                Macro::builder()
                    .name("heat")
                    .step(toggle(heater.id, true))
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        let handle = fx
            .macros
            .trigger(Arc::clone(&fx.registry), m.id, false)
            .await
            .unwrap();
        handle.await.unwrap().unwrap();

        assert_eq!(fx.driver.relay_state(4), Some(true));
    }

    #[tokio::test]
    async fn should_refuse_revert_synchronously_when_not_reversible() {
        let fx = Fixture::new();
        let heater = fx.add_equipment(Equipment::new("heater", 4)).await;
        let m = fx
            .macros
            .records()
            .create(
                Macro::builder()
                    .name("heat")
                    .step(toggle(heater.id, true))
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        let result = fx.macros.trigger(Arc::clone(&fx.registry), m.id, true).await;

        assert!(matches!(result, Err(ReefHubError::NotReversible(_))));
        assert!(fx.driver.effects().is_empty());
    }

    #[tokio::test]
    async fn should_return_not_found_when_triggering_unknown_macro() {
        let fx = Fixture::new();
        let result = fx
            .macros
            .trigger(Arc::clone(&fx.registry), MacroId::new(), false)
            .await;
        assert!(matches!(
            result,
            Err(ReefHubError::NotFound(NotFoundError { entity: "macro", .. }))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn should_complete_both_runs_when_same_macro_is_triggered_twice() {
        let fx = Fixture::new();
        let skimmer = fx.add_equipment(Equipment::new("skimmer", 3)).await;
        let m = Macro::builder()
            .name("skimmer pause")
            .step(toggle(skimmer.id, false))
            .step(Step::new(StepKind::Wait, &WaitStep { duration: 60 }).unwrap())
            .step(toggle(skimmer.id, true))
            .build()
            .unwrap();
        let m = fx.macros.records().create(m).await.unwrap();

        let first = fx
            .macros
            .trigger(Arc::clone(&fx.registry), m.id, false)
            .await
            .unwrap();
        let second = fx
            .macros
            .trigger(Arc::clone(&fx.registry), m.id, false)
            .await
            .unwrap();

        assert!(first.await.unwrap().is_ok());
        assert!(second.await.unwrap().is_ok());
        let off = SideEffect::Relay { channel: 3, on: false };
        let on = SideEffect::Relay { channel: 3, on: true };
        assert_eq!(fx.driver.effects(), vec![off.clone(), off, on.clone(), on]);
        assert_eq!(fx.driver.relay_state(3), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn should_cancel_in_flight_runs_on_shutdown() {
        let fx = Fixture::new();
        let heater = fx.add_equipment(Equipment::new("heater", 4)).await;
        let m = Macro::builder()
            .name("later")
            .step(Step::new(StepKind::Wait, &WaitStep { duration: 600 }).unwrap())
            .step(toggle(heater.id, true))
            .build()
            .unwrap();
        let m = fx.macros.records().create(m).await.unwrap();

        let run = fx
            .macros
            .trigger(Arc::clone(&fx.registry), m.id, false)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        fx.macros.shutdown();

        assert!(matches!(run.await.unwrap(), Err(ReefHubError::Cancelled)));
        assert!(fx.driver.effects().is_empty());
    }

    #[tokio::test]
    async fn should_report_step_failure_through_run_handle() {
        let fx = Fixture::new();
        let m = Macro::builder()
            .name("ghost")
            .step(toggle(EntityId::new(), true))
            .build()
            .unwrap();
        let m = fx.macros.records().create(m).await.unwrap();

        let run = fx
            .macros
            .trigger(Arc::clone(&fx.registry), m.id(), false)
            .await
            .unwrap();

        assert!(matches!(run.await.unwrap(), Err(ReefHubError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_reject_macro_with_invalid_dose_before_any_step_runs() {
        let fx = Fixture::new();
        let heater = fx.add_equipment(Equipment::new("heater", 4)).await;
        let pump = fx.add_doser(DosingPump::new("alkalinity", "j1")).await;
        let m = Macro {
            id: MacroId::default(),
            name: "dose".to_string(),
            steps: vec![
                toggle(heater.id, true),
                Step::new(
                    StepKind::DirectDoser,
                    &DoserStep {
                        id: pump.id,
                        speed: 50.0,
                        duration: -1.0,
                    },
                )
                .unwrap(),
            ],
            reversible: false,
        };

        let result = fx.macros.records().create(m).await;

        assert!(matches!(
            result,
            Err(ReefHubError::Validation(ValidationError::InvalidField { field: "duration", .. }))
        ));
        assert!(fx.macros.records().list().await.unwrap().is_empty());
        assert!(fx.driver.effects().is_empty());
    }

    #[tokio::test]
    async fn should_stamp_dose_usage_with_service_clock() {
        let fx = Fixture::new();
        let pump = fx.add_doser(DosingPump::new("calcium", "j2")).await;
        let m = Macro::builder()
            .name("dose")
            .step(
                Step::new(
                    StepKind::DirectDoser,
                    &DoserStep {
                        id: pump.id,
                        speed: 100.0,
                        duration: 0.5,
                    },
                )
                .unwrap(),
            )
            .build()
            .unwrap();
        let m = fx.macros.records().create(m).await.unwrap();

        let run = fx
            .macros
            .trigger(Arc::clone(&fx.registry), m.id, false)
            .await
            .unwrap();
        run.await.unwrap().unwrap();

        let history = fx.usage.history(pump.id, 1).await.unwrap();
        assert_eq!(history[0].time, fx.clock.now());
    }
}
