//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod macros;
#[allow(clippy::missing_errors_doc)]
pub mod subsystems;
#[allow(clippy::missing_errors_doc)]
pub mod timers;

use axum::Router;
use axum::routing::{get, post, put};
use serde::de::DeserializeOwned;

use reefhub_app::ports::EntityStore;
use reefhub_domain::error::{InvalidConfigError, ReefHubError};
use reefhub_domain::macros::Macro;
use reefhub_domain::timer::Job;

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<MS, JS>() -> Router<AppState<MS, JS>>
where
    MS: EntityStore<Macro> + 'static,
    JS: EntityStore<Job> + 'static,
{
    Router::new()
        // Macros
        .route(
            "/macros",
            get(macros::list::<MS, JS>).post(macros::create::<MS, JS>),
        )
        .route(
            "/macros/{id}",
            get(macros::get::<MS, JS>)
                .put(macros::update::<MS, JS>)
                .delete(macros::delete::<MS, JS>),
        )
        .route("/macros/{id}/run", post(macros::run::<MS, JS>))
        .route("/macros/{id}/revert", post(macros::revert::<MS, JS>))
        // Timers
        .route(
            "/timers",
            get(timers::list::<MS, JS>).post(timers::create::<MS, JS>),
        )
        .route(
            "/timers/{id}",
            get(timers::get::<MS, JS>)
                .put(timers::update::<MS, JS>)
                .delete(timers::delete::<MS, JS>),
        )
        // Subsystems
        .route("/subsystems", get(subsystems::list::<MS, JS>))
        .route(
            "/subsystems/{name}",
            get(subsystems::list_entities::<MS, JS>).post(subsystems::create_entity::<MS, JS>),
        )
        .route(
            "/subsystems/{name}/{id}",
            get(subsystems::get_entity::<MS, JS>)
                .put(subsystems::update_entity::<MS, JS>)
                .delete(subsystems::delete_entity::<MS, JS>),
        )
        .route(
            "/subsystems/{name}/{id}/state",
            put(subsystems::set_state::<MS, JS>),
        )
        .route(
            "/subsystems/{name}/{id}/usage",
            get(subsystems::usage::<MS, JS>),
        )
}

/// Decode a request body, reporting failures against `kind`.
///
/// Bodies are taken as raw bytes so that payloads carrying untyped step or
/// target configs keep their exact text.
pub(crate) fn decode_body<T: DeserializeOwned>(
    kind: &'static str,
    body: &[u8],
) -> Result<T, ReefHubError> {
    serde_json::from_slice(body).map_err(|source| InvalidConfigError { kind, source }.into())
}
