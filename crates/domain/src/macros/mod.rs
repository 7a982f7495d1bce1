//! Macro — an ordered, named sequence of steps.
//!
//! A macro runs its steps in declared order. When it is marked
//! [`reversible`](Macro::reversible) it can also be reverted, which executes
//! the inverse of each step in reverse order.

mod step;

pub use step::{
    DoserStep, GenericStep, GenericToggleStep, MAX_DOSE_SPEED, Step, StepAction, StepKind,
    WaitStep, WaitTemperatureStep,
};

use serde::{Deserialize, Serialize};

use crate::error::{ReefHubError, ValidationError};
use crate::id::MacroId;
use crate::record::Record;

/// Subsystem name of the macros collection.
pub const KIND: &str = "macro";

/// A named sequence of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Macro {
    #[serde(default)]
    pub id: MacroId,
    pub name: String,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub reversible: bool,
}

impl Macro {
    /// Create a builder for constructing a [`Macro`].
    #[must_use]
    pub fn builder() -> MacroBuilder {
        MacroBuilder::default()
    }

    /// Decode every step in declared order.
    ///
    /// # Errors
    ///
    /// Returns the first decoding or validation failure.
    pub fn actions(&self) -> Result<Vec<StepAction>, ReefHubError> {
        self.steps
            .iter()
            .map(|step| {
                let action = step.decode()?;
                action.validate()?;
                Ok(action)
            })
            .collect()
    }
}

impl Record for Macro {
    type Id = MacroId;
    const KIND: &'static str = KIND;

    fn id(&self) -> MacroId {
        self.id
    }

    fn set_id(&mut self, id: MacroId) {
        self.id = id;
    }

    fn name(&self) -> &str {
        &self.name
    }

    /// # Errors
    ///
    /// Returns [`ReefHubError::Validation`] when:
    /// - `name` is empty ([`ValidationError::EmptyName`])
    /// - `steps` is empty ([`ValidationError::NoSteps`])
    ///
    /// and [`ReefHubError::InvalidConfig`] when a step payload does not
    /// match its declared type.
    fn validate(&self) -> Result<(), ReefHubError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.steps.is_empty() {
            return Err(ValidationError::NoSteps.into());
        }
        self.actions().map(|_| ())
    }
}

/// Step-by-step builder for [`Macro`].
#[derive(Debug, Default)]
pub struct MacroBuilder {
    id: Option<MacroId>,
    name: Option<String>,
    steps: Vec<Step>,
    reversible: bool,
}

impl MacroBuilder {
    #[must_use]
    pub fn id(mut self, id: MacroId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    #[must_use]
    pub fn reversible(mut self, reversible: bool) -> Self {
        self.reversible = reversible;
        self
    }

    /// Consume the builder, validate, and return a [`Macro`].
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Record::validate`].
    pub fn build(self) -> Result<Macro, ReefHubError> {
        let m = Macro {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            steps: self.steps,
            reversible: self.reversible,
        };
        m.validate()?;
        Ok(m)
    }
}
