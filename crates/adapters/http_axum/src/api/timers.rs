//! JSON REST handlers for timer jobs.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use reefhub_app::ports::EntityStore;
use reefhub_domain::macros::Macro;
use reefhub_domain::record::parse_id;
use reefhub_domain::timer::{self, Job};

use crate::api::decode_body;
use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Job>>),
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
    Ok(Json<Job>),
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
    Created(Json<Job>),
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

/// `GET /api/timers` — list all jobs.
pub async fn list<MS, JS>(
    State(state): State<AppState<MS, JS>>,
) -> Result<ListResponse, ApiError>
where
    MS: EntityStore<Macro> + 'static,
    JS: EntityStore<Job> + 'static,
{
    let jobs = state.timers.records().list().await?;
    Ok(ListResponse::Ok(Json(jobs)))
}

/// `GET /api/timers/:id` — get job by ID.
pub async fn get<MS, JS>(
    State(state): State<AppState<MS, JS>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    MS: EntityStore<Macro> + 'static,
    JS: EntityStore<Job> + 'static,
{
    let id = parse_id::<Job>(&id)?;
    let job = state.timers.records().get(id).await?;
    Ok(GetResponse::Ok(Json(job)))
}

/// `POST /api/timers` — create a new job.
pub async fn create<MS, JS>(
    State(state): State<AppState<MS, JS>>,
    body: Bytes,
) -> Result<CreateResponse, ApiError>
where
    MS: EntityStore<Macro> + 'static,
    JS: EntityStore<Job> + 'static,
{
    let draft: Job = decode_body(timer::KIND, &body)?;
    let created = state.timers.records().create(draft).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PUT /api/timers/:id` — replace an existing job.
pub async fn update<MS, JS>(
    State(state): State<AppState<MS, JS>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<GetResponse, ApiError>
where
    MS: EntityStore<Macro> + 'static,
    JS: EntityStore<Job> + 'static,
{
    let id = parse_id::<Job>(&id)?;
    let replacement: Job = decode_body(timer::KIND, &body)?;
    let updated = state.timers.records().update(id, replacement).await?;
    Ok(GetResponse::Ok(Json(updated)))
}

/// `DELETE /api/timers/:id` — delete a job.
pub async fn delete<MS, JS>(
    State(state): State<AppState<MS, JS>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    MS: EntityStore<Macro> + 'static,
    JS: EntityStore<Job> + 'static,
{
    let id = parse_id::<Job>(&id)?;
    state.timers.delete(id).await?;
    Ok(DeleteResponse::NoContent)
}
