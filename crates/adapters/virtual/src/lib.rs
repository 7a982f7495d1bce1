//! # reefhub-adapter-virtual
//!
//! Simulated hardware for running reefhub without a controller board.
//!
//! | Device | Port | Behaviour |
//! |--------|------|-----------|
//! | [`VirtualDriver`] | `ActuatorDriver` | Records doses and relay states; optional real-time dosing; faulty channels |
//! | [`VirtualProbe`] | `TemperatureProbe` | Per-sensor readings, 25.0 °C until set |
//!
//! ## Dependency rule
//!
//! Depends on `reefhub-app` (port traits) and `reefhub-domain` only.

mod driver;
mod probe;

pub use driver::{DoseRecord, VirtualDriver};
pub use probe::VirtualProbe;
