//! Step — one typed unit of macro behaviour.
//!
//! A step is persisted as a type tag plus an opaque JSON payload. The payload
//! is kept byte-for-byte as it was submitted and is only interpreted by
//! [`Step::decode`], which turns it into the closed [`StepAction`] sum type.

use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{InvalidConfigError, ValidationError};
use crate::id::EntityId;
use crate::{ato, equipment, temperature};

/// Declared type of a [`Step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKind {
    #[serde(rename = "wait")]
    Wait,
    #[serde(rename = "waittemp")]
    WaitTemperature,
    #[serde(rename = "directdoser")]
    DirectDoser,
    #[serde(rename = "ato")]
    Ato,
    #[serde(rename = "equipment")]
    Equipment,
    #[serde(rename = "temperature")]
    Temperature,
    #[serde(rename = "genericToggle", alias = "subsystem")]
    GenericToggle,
}

impl StepKind {
    /// The persisted tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wait => "wait",
            Self::WaitTemperature => "waittemp",
            Self::DirectDoser => "directdoser",
            Self::Ato => "ato",
            Self::Equipment => "equipment",
            Self::Temperature => "temperature",
            Self::GenericToggle => "genericToggle",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a `wait` step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitStep {
    /// Seconds to wait.
    pub duration: u64,
}

/// Payload of a `waittemp` step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitTemperatureStep {
    /// Temperature controller to watch.
    pub id: EntityId,
    /// Seconds between two readings.
    pub frequency: u64,
    pub low: f64,
    pub high: f64,
    /// Optional bound in seconds. Without it the poll runs until the range is reached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl WaitTemperatureStep {
    /// Whether `reading` lies within `[low, high]`.
    #[must_use]
    pub fn is_satisfied_by(&self, reading: f64) -> bool {
        (self.low..=self.high).contains(&reading)
    }
}

/// Highest motor speed a `directdoser` step may request, in percent.
pub const MAX_DOSE_SPEED: f64 = 100.0;

/// Payload of a `directdoser` step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoserStep {
    /// Dosing pump to run.
    pub id: EntityId,
    /// Motor speed, in percent of the driver's range.
    pub speed: f64,
    /// Seconds the motor runs.
    pub duration: f64,
}

/// Payload of the `ato`, `equipment` and `temperature` steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericStep {
    pub id: EntityId,
    pub on: bool,
}

/// Payload of a `genericToggle` step, naming the target subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericToggleStep {
    pub subsystem: String,
    pub id: EntityId,
    pub on: bool,
}

/// A persisted macro step: type tag plus raw payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub config: Box<RawValue>,
}

impl PartialEq for Step {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.config.get() == other.config.get()
    }
}

impl Step {
    /// Build a step by serializing `config`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidConfigError`] if `config` cannot be serialized.
    pub fn new<C: Serialize>(kind: StepKind, config: &C) -> Result<Self, InvalidConfigError> {
        let config = serde_json::value::to_raw_value(config).map_err(|source| {
            InvalidConfigError {
                kind: kind.as_str(),
                source,
            }
        })?;
        Ok(Self { kind, config })
    }

    /// Interpret the payload according to the declared type.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidConfigError`] when the payload does not match the
    /// shape of its declared type.
    pub fn decode(&self) -> Result<StepAction, InvalidConfigError> {
        let action = match self.kind {
            StepKind::Wait => {
                let step: WaitStep = self.payload()?;
                StepAction::Wait {
                    duration: Duration::from_secs(step.duration),
                }
            }
            StepKind::WaitTemperature => StepAction::WaitTemperature(self.payload()?),
            StepKind::DirectDoser => StepAction::DirectDose(self.payload()?),
            StepKind::Ato => self.fixed_toggle(ato::KIND)?,
            StepKind::Equipment => self.fixed_toggle(equipment::KIND)?,
            StepKind::Temperature => self.fixed_toggle(temperature::KIND)?,
            StepKind::GenericToggle => {
                let step: GenericToggleStep = self.payload()?;
                StepAction::Toggle {
                    subsystem: step.subsystem,
                    id: step.id,
                    on: step.on,
                }
            }
        };
        Ok(action)
    }

    fn fixed_toggle(&self, subsystem: &str) -> Result<StepAction, InvalidConfigError> {
        let step: GenericStep = self.payload()?;
        Ok(StepAction::Toggle {
            subsystem: subsystem.to_string(),
            id: step.id,
            on: step.on,
        })
    }

    fn payload<C: DeserializeOwned>(&self) -> Result<C, InvalidConfigError> {
        serde_json::from_str(self.config.get()).map_err(|source| InvalidConfigError {
            kind: self.kind.as_str(),
            source,
        })
    }
}

/// Decoded, executable form of a [`Step`].
#[derive(Debug, Clone, PartialEq)]
pub enum StepAction {
    /// Suspend the run for a fixed duration.
    Wait { duration: Duration },
    /// Poll a temperature controller until its reading is in range.
    WaitTemperature(WaitTemperatureStep),
    /// Run a dosing pump.
    DirectDose(DoserStep),
    /// Switch an entity of `subsystem` on or off.
    Toggle {
        subsystem: String,
        id: EntityId,
        on: bool,
    },
}

impl StepAction {
    /// Check invariants the payload shape alone cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ZeroFrequency`] or
    /// [`ValidationError::InvertedRange`] for a malformed `waittemp` step,
    /// and [`ValidationError::InvalidField`] for a `directdoser` step whose
    /// speed or duration the pump cannot run.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::WaitTemperature(step) => {
                if step.frequency == 0 {
                    return Err(ValidationError::ZeroFrequency);
                }
                if step.low > step.high {
                    return Err(ValidationError::InvertedRange {
                        low: step.low,
                        high: step.high,
                    });
                }
            }
            Self::DirectDose(step) => {
                if !(0.0..=MAX_DOSE_SPEED).contains(&step.speed) {
                    return Err(ValidationError::InvalidField {
                        field: "speed",
                        value: step.speed.to_string(),
                    });
                }
                if Duration::try_from_secs_f64(step.duration).is_err() {
                    return Err(ValidationError::InvalidField {
                        field: "duration",
                        value: step.duration.to_string(),
                    });
                }
            }
            Self::Wait { .. } | Self::Toggle { .. } => {}
        }
        Ok(())
    }

    /// The action executed when reverting a macro, or `None` when the step
    /// has no meaningful inverse and is skipped.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        match self {
            Self::Wait { .. } | Self::WaitTemperature(_) => Some(self.clone()),
            Self::DirectDose(_) => None,
            Self::Toggle { subsystem, id, on } => Some(Self::Toggle {
                subsystem: subsystem.clone(),
                id: *id,
                on: !on,
            }),
        }
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wait { duration } => write!(f, "wait({}s)", duration.as_secs()),
            Self::WaitTemperature(step) => {
                write!(f, "waittemp({}, {}..{})", step.id, step.low, step.high)
            }
            Self::DirectDose(step) => write!(f, "directdoser({}, {}s)", step.id, step.duration),
            Self::Toggle { subsystem, id, on } => {
                let state = if *on { "on" } else { "off" };
                write!(f, "{subsystem}({id}, {state})")
            }
        }
    }
}
