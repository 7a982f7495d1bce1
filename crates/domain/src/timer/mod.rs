//! Timer — persisted cron-like jobs.
//!
//! A [`Job`] carries six textual schedule fields and an opaque target
//! payload. [`Job::fires_at`] answers whether the job should run at a given
//! local instant; [`Job::target`] decodes what it runs.

mod field;
mod target;

pub use field::{FieldSpec, Schedule};
pub use target::{Target, TargetKind, TriggerEquipment, TriggerMacro};

use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{InvalidConfigError, ReefHubError, ValidationError};
use crate::id::JobId;
use crate::record::Record;

/// Subsystem name of the timer jobs collection.
pub const KIND: &str = "timer";

fn star() -> String {
    "*".to_string()
}

fn enabled() -> bool {
    true
}

/// A scheduled trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub id: JobId,
    pub name: String,
    #[serde(default = "enabled")]
    pub enable: bool,
    #[serde(default = "star")]
    pub month: String,
    #[serde(default = "star")]
    pub week: String,
    #[serde(default = "star")]
    pub day: String,
    #[serde(default = "star")]
    pub hour: String,
    #[serde(default = "star")]
    pub minute: String,
    #[serde(default = "star")]
    pub second: String,
    #[serde(rename = "type")]
    pub kind: TargetKind,
    pub target: Box<RawValue>,
}

impl PartialEq for Job {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.enable == other.enable
            && self.schedule_fields() == other.schedule_fields()
            && self.kind == other.kind
            && self.target.get() == other.target.get()
    }
}

impl Job {
    /// Create a builder for constructing a [`Job`].
    #[must_use]
    pub fn builder() -> JobBuilder {
        JobBuilder::default()
    }

    fn schedule_fields(&self) -> [&str; 6] {
        [
            &self.month,
            &self.week,
            &self.day,
            &self.hour,
            &self.minute,
            &self.second,
        ]
    }

    /// Parse the six schedule fields.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidField`] for the first malformed field.
    pub fn schedule(&self) -> Result<Schedule, ValidationError> {
        Schedule::parse(
            &self.month,
            &self.week,
            &self.day,
            &self.hour,
            &self.minute,
            &self.second,
        )
    }

    /// Whether the job is enabled and its schedule matches `at`.
    ///
    /// A job with a malformed schedule never fires.
    #[must_use]
    pub fn fires_at(&self, at: &NaiveDateTime) -> bool {
        self.enable && self.schedule().is_ok_and(|s| s.matches(at))
    }

    /// Decode the target payload according to the declared type.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidConfigError`] when the payload does not match its type.
    pub fn target(&self) -> Result<Target, InvalidConfigError> {
        match self.kind {
            TargetKind::Macro => {
                let t: TriggerMacro = self.payload()?;
                Ok(Target::Macro { id: t.id })
            }
            TargetKind::Equipment => {
                let t: TriggerEquipment = self.payload()?;
                Ok(Target::Equipment {
                    id: t.id,
                    on: t.on,
                    duration: t.duration,
                })
            }
        }
    }

    fn payload<C: DeserializeOwned>(&self) -> Result<C, InvalidConfigError> {
        serde_json::from_str(self.target.get()).map_err(|source| InvalidConfigError {
            kind: self.kind.as_str(),
            source,
        })
    }
}

impl Record for Job {
    type Id = JobId;
    const KIND: &'static str = KIND;

    fn id(&self) -> JobId {
        self.id
    }

    fn set_id(&mut self, id: JobId) {
        self.id = id;
    }

    fn name(&self) -> &str {
        &self.name
    }

    /// # Errors
    ///
    /// Returns [`ReefHubError::Validation`] for an empty name or a malformed
    /// schedule field, and [`ReefHubError::InvalidConfig`] for an
    /// undecodable target.
    fn validate(&self) -> Result<(), ReefHubError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        self.schedule()?;
        self.target()?;
        Ok(())
    }
}

/// Step-by-step builder for [`Job`]. Unset schedule fields default to `"*"`.
#[derive(Debug, Default)]
pub struct JobBuilder {
    id: Option<JobId>,
    name: Option<String>,
    enable: Option<bool>,
    month: Option<String>,
    week: Option<String>,
    day: Option<String>,
    hour: Option<String>,
    minute: Option<String>,
    second: Option<String>,
    target: Option<(TargetKind, Box<RawValue>)>,
}

impl JobBuilder {
    #[must_use]
    pub fn id(mut self, id: JobId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn enable(mut self, enable: bool) -> Self {
        self.enable = Some(enable);
        self
    }

    #[must_use]
    pub fn month(mut self, value: impl Into<String>) -> Self {
        self.month = Some(value.into());
        self
    }

    #[must_use]
    pub fn week(mut self, value: impl Into<String>) -> Self {
        self.week = Some(value.into());
        self
    }

    #[must_use]
    pub fn day(mut self, value: impl Into<String>) -> Self {
        self.day = Some(value.into());
        self
    }

    #[must_use]
    pub fn hour(mut self, value: impl Into<String>) -> Self {
        self.hour = Some(value.into());
        self
    }

    #[must_use]
    pub fn minute(mut self, value: impl Into<String>) -> Self {
        self.minute = Some(value.into());
        self
    }

    #[must_use]
    pub fn second(mut self, value: impl Into<String>) -> Self {
        self.second = Some(value.into());
        self
    }

    /// Set the target from its typed payload.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidConfigError`] if `payload` cannot be serialized.
    pub fn target<C: Serialize>(
        mut self,
        kind: TargetKind,
        payload: &C,
    ) -> Result<Self, InvalidConfigError> {
        let raw = serde_json::value::to_raw_value(payload).map_err(|source| {
            InvalidConfigError {
                kind: kind.as_str(),
                source,
            }
        })?;
        self.target = Some((kind, raw));
        Ok(self)
    }

    /// Consume the builder, validate, and return a [`Job`].
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Record::validate`]. A builder without a
    /// target yields [`ReefHubError::InvalidConfig`].
    pub fn build(self) -> Result<Job, ReefHubError> {
        let (kind, target) = match self.target {
            Some(target) => target,
            None => (
                TargetKind::Macro,
                serde_json::value::to_raw_value(&serde_json::Value::Null).map_err(|source| {
                    InvalidConfigError {
                        kind: TargetKind::Macro.as_str(),
                        source,
                    }
                })?,
            ),
        };
        let job = Job {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            enable: self.enable.unwrap_or(true),
            month: self.month.unwrap_or_else(star),
            week: self.week.unwrap_or_else(star),
            day: self.day.unwrap_or_else(star),
            hour: self.hour.unwrap_or_else(star),
            minute: self.minute.unwrap_or_else(star),
            second: self.second.unwrap_or_else(star),
            kind,
            target,
        };
        job.validate()?;
        Ok(job)
    }
}
