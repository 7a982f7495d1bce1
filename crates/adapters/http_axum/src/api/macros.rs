//! JSON REST handlers for macros.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use reefhub_app::ports::EntityStore;
use reefhub_domain::id::MacroId;
use reefhub_domain::macros::{self, Macro};
use reefhub_domain::record::parse_id;
use reefhub_domain::timer::Job;

use crate::api::decode_body;
use crate::error::ApiError;
use crate::state::AppState;

/// Body returned when a run has been started.
#[derive(Debug, Serialize)]
pub struct RunAccepted {
    pub macro_id: MacroId,
    pub reverse: bool,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Macro>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get and update endpoints.
pub enum GetResponse {
    Ok(Json<Macro>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Macro>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// Possible responses from the run and revert endpoints.
pub enum RunResponse {
    Accepted(Json<RunAccepted>),
}

impl IntoResponse for RunResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Accepted(json) => (StatusCode::ACCEPTED, json).into_response(),
        }
    }
}

/// `GET /api/macros` — list all macros.
pub async fn list<MS, JS>(
    State(state): State<AppState<MS, JS>>,
) -> Result<ListResponse, ApiError>
where
    MS: EntityStore<Macro> + 'static,
    JS: EntityStore<Job> + 'static,
{
    let all = state.macros.records().list().await?;
    Ok(ListResponse::Ok(Json(all)))
}

/// `GET /api/macros/:id` — get macro by ID.
pub async fn get<MS, JS>(
    State(state): State<AppState<MS, JS>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    MS: EntityStore<Macro> + 'static,
    JS: EntityStore<Job> + 'static,
{
    let id = parse_id::<Macro>(&id)?;
    let found = state.macros.records().get(id).await?;
    Ok(GetResponse::Ok(Json(found)))
}

/// `POST /api/macros` — create a new macro.
pub async fn create<MS, JS>(
    State(state): State<AppState<MS, JS>>,
    body: Bytes,
) -> Result<CreateResponse, ApiError>
where
    MS: EntityStore<Macro> + 'static,
    JS: EntityStore<Job> + 'static,
{
    let draft: Macro = decode_body(macros::KIND, &body)?;
    let created = state.macros.records().create(draft).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PUT /api/macros/:id` — replace an existing macro.
pub async fn update<MS, JS>(
    State(state): State<AppState<MS, JS>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<GetResponse, ApiError>
where
    MS: EntityStore<Macro> + 'static,
    JS: EntityStore<Job> + 'static,
{
    let id = parse_id::<Macro>(&id)?;
    let replacement: Macro = decode_body(macros::KIND, &body)?;
    let updated = state.macros.records().update(id, replacement).await?;
    Ok(GetResponse::Ok(Json(updated)))
}

/// `DELETE /api/macros/:id` — delete a macro.
pub async fn delete<MS, JS>(
    State(state): State<AppState<MS, JS>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    MS: EntityStore<Macro> + 'static,
    JS: EntityStore<Job> + 'static,
{
    let id = parse_id::<Macro>(&id)?;
    state.macros.records().delete(id).await?;
    Ok(DeleteResponse::NoContent)
}

/// `POST /api/macros/:id/run` — start a forward run.
pub async fn run<MS, JS>(
    State(state): State<AppState<MS, JS>>,
    Path(id): Path<String>,
) -> Result<RunResponse, ApiError>
where
    MS: EntityStore<Macro> + 'static,
    JS: EntityStore<Job> + 'static,
{
    start(&state, &id, false).await
}

/// `POST /api/macros/:id/revert` — start a revert run.
pub async fn revert<MS, JS>(
    State(state): State<AppState<MS, JS>>,
    Path(id): Path<String>,
) -> Result<RunResponse, ApiError>
where
    MS: EntityStore<Macro> + 'static,
    JS: EntityStore<Job> + 'static,
{
    start(&state, &id, true).await
}

async fn start<MS, JS>(
    state: &AppState<MS, JS>,
    id: &str,
    reverse: bool,
) -> Result<RunResponse, ApiError>
where
    MS: EntityStore<Macro> + 'static,
    JS: EntityStore<Job> + 'static,
{
    let macro_id = parse_id::<Macro>(id)?;
    // The run outlives the request; its outcome is only logged.
    let _run = state
        .macros
        .trigger(Arc::clone(&state.registry), macro_id, reverse)
        .await?;
    Ok(RunResponse::Accepted(Json(RunAccepted { macro_id, reverse })))
}
