//! Macro engine — sequential interpreter for macro steps.
//!
//! A run is planned up front: every step is decoded and validated before any
//! side effect happens, and for a revert the plan is the inverse of each step
//! in reverse order. The plan then executes strictly sequentially against the
//! [`SubsystemRegistry`]. The first failing step aborts the run; steps already
//! executed are not compensated.
//!
//! `wait` and `waittemp` suspend only the task running the macro and observe
//! the run's [`CancellationToken`].

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use reefhub_domain::doser;
use reefhub_domain::error::{NotReversibleError, ReefHubError, TimeoutError, ValidationError};
use reefhub_domain::macros::{Macro, StepAction, WaitTemperatureStep};
use reefhub_domain::temperature;

use crate::registry::{SubsystemRegistry, TemperatureReading};

/// One executable step of a run, with its position in the macro.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStep {
    pub index: usize,
    pub action: StepAction,
}

/// Interprets macros against the registry.
#[derive(Debug, Clone, Default)]
pub struct MacroEngine {
    waittemp_timeout: Option<Duration>,
}

impl MacroEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound every `waittemp` step that does not carry its own timeout.
    #[must_use]
    pub fn with_waittemp_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.waittemp_timeout = timeout;
        self
    }

    /// Decode `m` into the sequence of actions a run executes.
    ///
    /// # Errors
    ///
    /// Returns [`ReefHubError::NotReversible`] when reverting a macro that is
    /// not reversible, and [`ReefHubError::InvalidConfig`] or
    /// [`ReefHubError::Validation`] for a malformed step.
    pub fn plan(&self, m: &Macro, reverse: bool) -> Result<Vec<PlannedStep>, ReefHubError> {
        if reverse && !m.reversible {
            return Err(NotReversibleError {
                macro_id: m.id.to_string(),
            }
            .into());
        }
        let actions = m.actions()?;
        if !reverse {
            return Ok(actions
                .into_iter()
                .enumerate()
                .map(|(index, action)| PlannedStep { index, action })
                .collect());
        }
        Ok(actions
            .iter()
            .enumerate()
            .rev()
            .filter_map(|(index, action)| match action.inverse() {
                Some(action) => Some(PlannedStep { index, action }),
                None => {
                    tracing::debug!(macro_id = %m.id, step = index, %action, "no inverse, skipping step");
                    None
                }
            })
            .collect())
    }

    /// Plan and execute `m`.
    ///
    /// # Errors
    ///
    /// Returns any planning error, or the error of the first failing step.
    pub async fn run(
        &self,
        registry: &SubsystemRegistry,
        m: &Macro,
        reverse: bool,
        cancel: &CancellationToken,
    ) -> Result<(), ReefHubError> {
        let plan = self.plan(m, reverse)?;
        self.execute(registry, m, &plan, cancel).await
    }

    /// Execute a plan produced by [`plan`](Self::plan).
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing step, or
    /// [`ReefHubError::Cancelled`] when `cancel` fires.
    #[tracing::instrument(skip_all, fields(macro_id = %m.id, name = %m.name))]
    pub async fn execute(
        &self,
        registry: &SubsystemRegistry,
        m: &Macro,
        plan: &[PlannedStep],
        cancel: &CancellationToken,
    ) -> Result<(), ReefHubError> {
        tracing::info!(steps = plan.len(), "macro run started");
        for step in plan {
            if cancel.is_cancelled() {
                tracing::warn!(step = step.index, "macro run cancelled");
                return Err(ReefHubError::Cancelled);
            }
            tracing::debug!(step = step.index, action = %step.action, "executing step");
            if let Err(err) = self.step(registry, &step.action, cancel).await {
                tracing::error!(step = step.index, action = %step.action, error = %err, "macro step failed, aborting run");
                return Err(err);
            }
        }
        tracing::info!("macro run finished");
        Ok(())
    }

    async fn step(
        &self,
        registry: &SubsystemRegistry,
        action: &StepAction,
        cancel: &CancellationToken,
    ) -> Result<(), ReefHubError> {
        match action {
            StepAction::Wait { duration } => sleep(*duration, cancel).await,
            StepAction::WaitTemperature(step) => {
                let sensor = registry.sensor(temperature::KIND)?;
                self.wait_temperature(sensor, step, cancel).await
            }
            StepAction::DirectDose(step) => {
                let duration = Duration::try_from_secs_f64(step.duration).map_err(|_| {
                    ValidationError::InvalidField {
                        field: "duration",
                        value: step.duration.to_string(),
                    }
                })?;
                let pump = registry.doser(doser::KIND)?;
                tokio::select! {
                    result = pump.dose(step.id, step.speed, duration) => result,
                    () = cancel.cancelled() => Err(ReefHubError::Cancelled),
                }
            }
            StepAction::Toggle { subsystem, id, on } => registry.on(subsystem, *id, *on).await,
        }
    }

    async fn wait_temperature(
        &self,
        sensor: &dyn TemperatureReading,
        step: &WaitTemperatureStep,
        cancel: &CancellationToken,
    ) -> Result<(), ReefHubError> {
        let bound = step.timeout.map(Duration::from_secs).or(self.waittemp_timeout);
        let poll = poll_until_in_range(sensor, step);
        let bounded = async {
            match bound {
                Some(after) => tokio::time::timeout(after, poll)
                    .await
                    .map_err(|_| ReefHubError::from(TimeoutError { after }))?,
                None => poll.await,
            }
        };
        tokio::select! {
            result = bounded => result,
            () = cancel.cancelled() => Err(ReefHubError::Cancelled),
        }
    }
}

async fn poll_until_in_range(
    sensor: &dyn TemperatureReading,
    step: &WaitTemperatureStep,
) -> Result<(), ReefHubError> {
    let frequency = Duration::from_secs(step.frequency);
    loop {
        let reading = sensor.read(step.id).await?;
        if step.is_satisfied_by(reading) {
            tracing::debug!(reading, low = step.low, high = step.high, "temperature in range");
            return Ok(());
        }
        tracing::debug!(reading, low = step.low, high = step.high, "temperature out of range, polling again");
        tokio::time::sleep(frequency).await;
    }
}

async fn sleep(duration: Duration, cancel: &CancellationToken) -> Result<(), ReefHubError> {
    tokio::select! {
        () = tokio::time::sleep(duration) => Ok(()),
        () = cancel.cancelled() => Err(ReefHubError::Cancelled),
    }
}
