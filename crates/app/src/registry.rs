//! Subsystem registry — name → capability-bearing subsystem.
//!
//! Every controllable domain (dosing pumps, ATOs, equipment, temperature
//! controllers, macros, timers) registers one [`Subsystem`] at startup. The
//! registry is immutable once built. Callers resolve a subsystem by name and
//! ask for the capability they need; a subsystem that lacks it yields
//! [`RegistryError::CapabilityMismatch`] instead of a runtime cast failure.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::value::RawValue;

use reefhub_domain::doser::Usage;
use reefhub_domain::error::{ReefHubError, RegistryError};
use reefhub_domain::id::EntityId;

/// What a subsystem can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Crud,
    Toggle,
    Sensing,
    Dosing,
}

impl Capability {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Crud => "crud",
            Self::Toggle => "toggle",
            Self::Sensing => "sensing",
            Self::Dosing => "dosing",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CRUD over a subsystem's entities, in their JSON form.
///
/// Identifiers are passed as text and parsed by the subsystem, so callers
/// never need to know the concrete entity type.
#[async_trait]
pub trait CrudEntity: Send + Sync {
    async fn list(&self) -> Result<Vec<Box<RawValue>>, ReefHubError>;

    async fn get(&self, id: &str) -> Result<Box<RawValue>, ReefHubError>;

    async fn create(&self, payload: &RawValue) -> Result<Box<RawValue>, ReefHubError>;

    async fn update(&self, id: &str, payload: &RawValue) -> Result<Box<RawValue>, ReefHubError>;

    async fn delete(&self, id: &str) -> Result<(), ReefHubError>;
}

/// Simple on/off control of an entity.
#[async_trait]
pub trait Toggleable: Send + Sync {
    async fn on(&self, id: EntityId, state: bool) -> Result<(), ReefHubError>;
}

/// Temperature measurement, in the controller's configured unit.
#[async_trait]
pub trait TemperatureReading: Send + Sync {
    async fn read(&self, id: EntityId) -> Result<f64, ReefHubError>;
}

/// Running a pump for a fixed duration.
#[async_trait]
pub trait Dosing: Send + Sync {
    async fn dose(
        &self,
        id: EntityId,
        speed: f64,
        duration: Duration,
    ) -> Result<(), ReefHubError>;

    /// At most `limit` usage records of pump `id`, newest first.
    async fn usage(&self, id: EntityId, limit: usize) -> Result<Vec<Usage>, ReefHubError>;
}

/// A named domain of controllable entities.
///
/// CRUD is mandatory; the other capabilities are optional views.
pub trait Subsystem: Send + Sync {
    fn name(&self) -> &'static str;

    fn crud(&self) -> &dyn CrudEntity;

    fn toggleable(&self) -> Option<&dyn Toggleable> {
        None
    }

    fn sensor(&self) -> Option<&dyn TemperatureReading> {
        None
    }

    fn doser(&self) -> Option<&dyn Dosing> {
        None
    }

    fn capabilities(&self) -> Vec<Capability> {
        let mut capabilities = vec![Capability::Crud];
        if self.toggleable().is_some() {
            capabilities.push(Capability::Toggle);
        }
        if self.sensor().is_some() {
            capabilities.push(Capability::Sensing);
        }
        if self.doser().is_some() {
            capabilities.push(Capability::Dosing);
        }
        capabilities
    }

    fn supports(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

/// Name and capabilities of a registered subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubsystemInfo {
    pub name: &'static str,
    pub capabilities: Vec<Capability>,
}

/// Immutable lookup of the registered subsystems.
pub struct SubsystemRegistry {
    subsystems: BTreeMap<&'static str, Arc<dyn Subsystem>>,
}

impl fmt::Debug for SubsystemRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubsystemRegistry")
            .field("subsystems", &self.names())
            .finish()
    }
}

impl SubsystemRegistry {
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Look up a subsystem by name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownSubsystem`] when nothing is registered
    /// under `name`.
    pub fn get(&self, name: &str) -> Result<&dyn Subsystem, ReefHubError> {
        self.subsystems
            .get(name)
            .map(Arc::as_ref)
            .ok_or_else(|| {
                RegistryError::UnknownSubsystem {
                    name: name.to_string(),
                }
                .into()
            })
    }

    /// Look up a subsystem and check that it supports `capability`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownSubsystem`] or
    /// [`RegistryError::CapabilityMismatch`].
    pub fn resolve(
        &self,
        name: &str,
        capability: Capability,
    ) -> Result<&dyn Subsystem, ReefHubError> {
        let subsystem = self.get(name)?;
        if subsystem.supports(capability) {
            Ok(subsystem)
        } else {
            Err(mismatch(name, capability))
        }
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownSubsystem`] when `name` is not registered.
    pub fn crud(&self, name: &str) -> Result<&dyn CrudEntity, ReefHubError> {
        Ok(self.get(name)?.crud())
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownSubsystem`] or
    /// [`RegistryError::CapabilityMismatch`].
    pub fn toggleable(&self, name: &str) -> Result<&dyn Toggleable, ReefHubError> {
        self.get(name)?
            .toggleable()
            .ok_or_else(|| mismatch(name, Capability::Toggle))
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownSubsystem`] or
    /// [`RegistryError::CapabilityMismatch`].
    pub fn sensor(&self, name: &str) -> Result<&dyn TemperatureReading, ReefHubError> {
        self.get(name)?
            .sensor()
            .ok_or_else(|| mismatch(name, Capability::Sensing))
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownSubsystem`] or
    /// [`RegistryError::CapabilityMismatch`].
    pub fn doser(&self, name: &str) -> Result<&dyn Dosing, ReefHubError> {
        self.get(name)?
            .doser()
            .ok_or_else(|| mismatch(name, Capability::Dosing))
    }

    /// Switch entity `id` of subsystem `name` on or off.
    ///
    /// # Errors
    ///
    /// Returns a registry error when `name` cannot be toggled, or whatever
    /// the subsystem reports (typically [`ReefHubError::NotFound`] or
    /// [`ReefHubError::Actuator`]).
    #[tracing::instrument(skip(self))]
    pub async fn on(&self, name: &str, id: EntityId, state: bool) -> Result<(), ReefHubError> {
        self.toggleable(name)?.on(id, state).await
    }

    /// Registered subsystem names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.subsystems.keys().copied().collect()
    }

    #[must_use]
    pub fn describe(&self) -> Vec<SubsystemInfo> {
        self.subsystems
            .iter()
            .map(|(name, subsystem)| SubsystemInfo {
                name: *name,
                capabilities: subsystem.capabilities(),
            })
            .collect()
    }
}

fn mismatch(name: &str, capability: Capability) -> ReefHubError {
    RegistryError::CapabilityMismatch {
        subsystem: name.to_string(),
        capability: capability.as_str(),
    }
    .into()
}

/// Collects subsystems before freezing them into a [`SubsystemRegistry`].
#[derive(Default)]
pub struct RegistryBuilder {
    subsystems: Vec<Arc<dyn Subsystem>>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn register(mut self, subsystem: Arc<dyn Subsystem>) -> Self {
        self.subsystems.push(subsystem);
        self
    }

    /// Freeze the registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateSubsystem`] when two subsystems share
    /// a name.
    pub fn build(self) -> Result<SubsystemRegistry, ReefHubError> {
        let mut subsystems = BTreeMap::new();
        for subsystem in self.subsystems {
            let name = subsystem.name();
            if subsystems.insert(name, subsystem).is_some() {
                return Err(RegistryError::DuplicateSubsystem {
                    name: name.to_string(),
                }
                .into());
            }
        }
        tracing::debug!(subsystems = ?subsystems.keys().collect::<Vec<_>>(), "registry built");
        Ok(SubsystemRegistry { subsystems })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use reefhub_domain::equipment::Equipment;
    use reefhub_domain::error::NotFoundError;

    #[tokio::test]
    async fn should_list_registered_subsystems_sorted() {
        let fx = Fixture::new();
        assert_eq!(
            fx.registry.names(),
            vec!["ato", "doser", "equipment", "macro", "temperature", "timer"]
        );
    }

    #[tokio::test]
    async fn should_describe_capabilities_per_subsystem() {
        let fx = Fixture::new();
        let described = fx.registry.describe();
        let doser = described.iter().find(|info| info.name == "doser").unwrap();
        assert_eq!(
            doser.capabilities,
            vec![Capability::Crud, Capability::Toggle, Capability::Dosing]
        );
        let timer = described.iter().find(|info| info.name == "timer").unwrap();
        assert_eq!(timer.capabilities, vec![Capability::Crud]);
    }

    #[tokio::test]
    async fn should_fail_with_unknown_subsystem_when_name_is_not_registered() {
        let fx = Fixture::new();
        let result = fx.registry.on("lighting", EntityId::new(), true).await;
        assert!(matches!(
            result,
            Err(ReefHubError::Registry(RegistryError::UnknownSubsystem { name })) if name == "lighting"
        ));
    }

    #[tokio::test]
    async fn should_fail_with_capability_mismatch_when_subsystem_cannot_toggle() {
        let fx = Fixture::new();
        let result = fx.registry.on("timer", EntityId::new(), true).await;
        assert!(matches!(
            result,
            Err(ReefHubError::Registry(RegistryError::CapabilityMismatch { capability: "toggle", .. }))
        ));
        assert!(fx.registry.resolve("macro", Capability::Sensing).is_err());
        assert!(fx.registry.resolve("temperature", Capability::Sensing).is_ok());
    }

    #[tokio::test]
    async fn should_dispatch_on_to_equipment_relay() {
        let fx = Fixture::new();
        let heater = fx.add_equipment(Equipment::new("heater", 3)).await;

        fx.registry.on("equipment", heater.id, true).await.unwrap();

        assert_eq!(fx.driver.relay_state(3), Some(true));
    }

    #[tokio::test]
    async fn should_propagate_not_found_when_entity_is_missing() {
        let fx = Fixture::new();
        let result = fx.registry.on("equipment", EntityId::new(), true).await;
        assert!(matches!(
            result,
            Err(ReefHubError::NotFound(NotFoundError { entity: "equipment", .. }))
        ));
        assert!(fx.driver.effects().is_empty());
    }

    #[tokio::test]
    async fn should_reject_duplicate_subsystem_names() {
        let fx = Fixture::new();
        let result = SubsystemRegistry::builder()
            .register(fx.equipment.clone())
            .register(fx.equipment.clone())
            .build();
        assert!(matches!(
            result,
            Err(ReefHubError::Registry(RegistryError::DuplicateSubsystem { .. }))
        ));
    }

    #[tokio::test]
    async fn should_create_and_fetch_entities_through_raw_crud() {
        let fx = Fixture::new();
        let crud = fx.registry.crud("equipment").unwrap();
        let payload = RawValue::from_string(r#"{"name":"return pump","outlet":1}"#.to_string())
            .unwrap();

        let created = crud.create(&payload).await.unwrap();
        let created: Equipment = serde_json::from_str(created.get()).unwrap();
        let fetched = crud.get(&created.id.to_string()).await.unwrap();
        let fetched: Equipment = serde_json::from_str(fetched.get()).unwrap();

        assert_eq!(fetched, created);
        assert_eq!(crud.list().await.unwrap().len(), 1);
    }
}
