//! # reefhub-domain
//!
//! Pure domain model for the reefhub aquarium controller.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define the **subsystem entities** (dosing pumps, auto-top-off units,
//!   equipment outlets, temperature controllers)
//! - Define **Macros** (ordered, typed step sequences) and their step payloads
//! - Define **Jobs** (cron-like schedules) and the field matching rules
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod record;
pub mod time;

pub mod ato;
pub mod doser;
pub mod equipment;
pub mod macros;
pub mod temperature;
pub mod timer;
