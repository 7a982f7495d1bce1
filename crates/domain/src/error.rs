//! Common error types used across the workspace.
//!
//! Each failure family is its own typed error and converts into
//! [`ReefHubError`] through `#[from]`.

use std::time::Duration;

/// Top-level error type shared by every layer.
#[derive(Debug, thiserror::Error)]
pub enum ReefHubError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("registry error")]
    Registry(#[from] RegistryError),

    #[error("macro is not reversible")]
    NotReversible(#[from] NotReversibleError),

    #[error("invalid configuration payload")]
    InvalidConfig(#[from] InvalidConfigError),

    #[error("actuator failure")]
    Actuator(#[from] ActuatorError),

    #[error("step timed out")]
    Timeout(#[from] TimeoutError),

    /// The run was aborted through its cancellation token.
    #[error("run cancelled")]
    Cancelled,

    /// Failure inside a storage adapter.
    #[error("storage error")]
    Storage(Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("a macro needs at least one step")]
    NoSteps,

    #[error("invalid field {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },

    #[error("invalid identifier {value:?}")]
    InvalidId { value: String },

    #[error("temperature range is inverted: low {low} > high {high}")]
    InvertedRange { low: f64, high: f64 },

    #[error("polling frequency must be greater than zero")]
    ZeroFrequency,
}

/// Lookup of an entity that does not exist.
#[derive(Debug, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Failures resolving a subsystem through the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown subsystem {name:?}")]
    UnknownSubsystem { name: String },

    #[error("subsystem {subsystem:?} does not support {capability}")]
    CapabilityMismatch {
        subsystem: String,
        capability: &'static str,
    },

    #[error("subsystem {name:?} is registered twice")]
    DuplicateSubsystem { name: String },
}

/// Revert requested on a macro that was not declared reversible.
#[derive(Debug, thiserror::Error)]
#[error("macro {macro_id} is not reversible")]
pub struct NotReversibleError {
    pub macro_id: String,
}

/// A step or job payload that does not decode for its declared type.
///
/// This is a definition defect: retrying will never succeed.
#[derive(Debug, thiserror::Error)]
#[error("payload for {kind:?} does not decode")]
pub struct InvalidConfigError {
    pub kind: &'static str,
    #[source]
    pub source: serde_json::Error,
}

/// Hardware driver failures.
#[derive(Debug, thiserror::Error)]
pub enum ActuatorError {
    #[error("channel {channel} is not available")]
    UnknownChannel { channel: u32 },

    #[error("sensor {sensor:?} is not available")]
    SensorUnavailable { sensor: String },

    #[error("hardware fault on {device}")]
    Fault {
        device: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// A bounded wait that expired before its condition held.
#[derive(Debug, thiserror::Error)]
#[error("condition not met after {after:?}")]
pub struct TimeoutError {
    pub after: Duration,
}
