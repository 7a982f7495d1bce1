//! # reefhub-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `EntityStore` — CRUD for every persisted record kind
//!   - `UsageRecorder` — append-only dosing telemetry
//!   - `ActuatorDriver` — pump motors and relay channels
//!   - `TemperatureProbe` — raw sensor readings
//!   - `Clock` — wall-clock time for the scheduler
//! - Provide the **subsystem registry**: name → capability-bearing subsystem
//! - Provide one **service** per subsystem (dosers, ATOs, equipment,
//!   temperature controllers, macros, timers)
//! - Interpret macros in the **macro engine** and fire jobs from the **scheduler**
//!
//! ## Dependency rule
//! Depends on `reefhub-domain` only (plus `tokio` for tasks and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod macro_engine;
pub mod ports;
pub mod registry;
pub mod scheduler;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;
