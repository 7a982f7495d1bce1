//! Shared application state for axum handlers.

use std::sync::Arc;

use reefhub_app::ports::EntityStore;
use reefhub_app::registry::SubsystemRegistry;
use reefhub_app::services::{MacroService, TimerService};
use reefhub_domain::macros::Macro;
use reefhub_domain::timer::Job;

/// Application state shared across all axum handlers.
///
/// Generic over the macro and job stores to avoid dynamic dispatch.
/// `Clone` is implemented manually so the stores themselves do not need to
/// be `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<MS, JS> {
    /// Every registered subsystem, including macros and timers.
    pub registry: Arc<SubsystemRegistry>,
    /// Macro CRUD and run/revert triggering.
    pub macros: Arc<MacroService<MS>>,
    /// Timer job CRUD.
    pub timers: Arc<TimerService<JS, MS>>,
}

impl<MS, JS> Clone for AppState<MS, JS> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            macros: Arc::clone(&self.macros),
            timers: Arc::clone(&self.timers),
        }
    }
}

impl<MS, JS> AppState<MS, JS>
where
    MS: EntityStore<Macro> + 'static,
    JS: EntityStore<Job> + 'static,
{
    /// Create a new application state from services already shared with the
    /// registry and the scheduler.
    pub fn new(
        registry: Arc<SubsystemRegistry>,
        macros: Arc<MacroService<MS>>,
        timers: Arc<TimerService<JS, MS>>,
    ) -> Self {
        Self {
            registry,
            macros,
            timers,
        }
    }
}
