//! Record — the shape shared by every persisted subsystem entity.

use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ReefHubError, ValidationError};

/// A persisted entity stored in a per-kind collection.
///
/// The identifier is assigned by the store on create and never changes
/// afterward.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Identifier type. `Default` produces a fresh identifier.
    type Id: Copy
        + Debug
        + Default
        + Eq
        + Hash
        + Display
        + FromStr<Err = uuid::Error>
        + Send
        + Sync
        + 'static;

    /// Collection name, also the subsystem name in the registry.
    const KIND: &'static str;

    fn id(&self) -> Self::Id;

    fn set_id(&mut self, id: Self::Id);

    fn name(&self) -> &str;

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// The default implementation returns [`ValidationError::EmptyName`]
    /// when the name is empty.
    fn validate(&self) -> Result<(), ReefHubError> {
        if self.name().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}

/// Parse a textual identifier for `T`.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidId`] when `value` is not a UUID.
pub fn parse_id<T: Record>(value: &str) -> Result<T::Id, ReefHubError> {
    value.parse().map_err(|_| {
        ValidationError::InvalidId {
            value: value.to_string(),
        }
        .into()
    })
}
