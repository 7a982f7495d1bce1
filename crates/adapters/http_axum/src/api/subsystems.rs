//! JSON REST handlers routed through the subsystem registry.
//!
//! Entities are handled in their JSON form, so any registered subsystem is
//! reachable here without a dedicated route.

use std::str::FromStr;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::value::RawValue;

use reefhub_app::ports::EntityStore;
use reefhub_app::registry::SubsystemInfo;
use reefhub_domain::doser::Usage;
use reefhub_domain::error::{ReefHubError, ValidationError};
use reefhub_domain::id::EntityId;
use reefhub_domain::macros::Macro;
use reefhub_domain::timer::Job;

use crate::api::decode_body;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for switching an entity on or off.
#[derive(Deserialize)]
pub struct SetStateRequest {
    pub on: bool,
}

/// Query parameters of the usage endpoint.
#[derive(Deserialize)]
pub struct UsageQuery {
    #[serde(default = "default_usage_limit")]
    pub limit: usize,
}

fn default_usage_limit() -> usize {
    50
}

/// Possible responses from the subsystem list endpoint.
pub enum DescribeResponse {
    Ok(Json<Vec<SubsystemInfo>>),
}

impl IntoResponse for DescribeResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the entity endpoints.
pub enum EntityResponse {
    List(Json<Vec<Box<RawValue>>>),
    Ok(Json<Box<RawValue>>),
    Created(Json<Box<RawValue>>),
    NoContent,
}

impl IntoResponse for EntityResponse {
    fn into_response(self) -> Response {
        match self {
            Self::List(json) => json.into_response(),
            Self::Ok(json) => json.into_response(),
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/subsystems` — names and capabilities of every subsystem.
pub async fn list<MS, JS>(State(state): State<AppState<MS, JS>>) -> DescribeResponse
where
    MS: EntityStore<Macro> + 'static,
    JS: EntityStore<Job> + 'static,
{
    DescribeResponse::Ok(Json(state.registry.describe()))
}

/// `GET /api/subsystems/:name` — list the subsystem's entities.
pub async fn list_entities<MS, JS>(
    State(state): State<AppState<MS, JS>>,
    Path(name): Path<String>,
) -> Result<EntityResponse, ApiError>
where
    MS: EntityStore<Macro> + 'static,
    JS: EntityStore<Job> + 'static,
{
    let entities = state.registry.crud(&name)?.list().await?;
    Ok(EntityResponse::List(Json(entities)))
}

/// `POST /api/subsystems/:name` — create an entity.
pub async fn create_entity<MS, JS>(
    State(state): State<AppState<MS, JS>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<EntityResponse, ApiError>
where
    MS: EntityStore<Macro> + 'static,
    JS: EntityStore<Job> + 'static,
{
    let subsystem = state.registry.get(&name)?;
    let payload: Box<RawValue> = decode_body(subsystem.name(), &body)?;
    let created = subsystem.crud().create(&payload).await?;
    Ok(EntityResponse::Created(Json(created)))
}

/// `GET /api/subsystems/:name/:id` — get one entity.
pub async fn get_entity<MS, JS>(
    State(state): State<AppState<MS, JS>>,
    Path((name, id)): Path<(String, String)>,
) -> Result<EntityResponse, ApiError>
where
    MS: EntityStore<Macro> + 'static,
    JS: EntityStore<Job> + 'static,
{
    let entity = state.registry.crud(&name)?.get(&id).await?;
    Ok(EntityResponse::Ok(Json(entity)))
}

/// `PUT /api/subsystems/:name/:id` — replace an entity.
pub async fn update_entity<MS, JS>(
    State(state): State<AppState<MS, JS>>,
    Path((name, id)): Path<(String, String)>,
    body: Bytes,
) -> Result<EntityResponse, ApiError>
where
    MS: EntityStore<Macro> + 'static,
    JS: EntityStore<Job> + 'static,
{
    let subsystem = state.registry.get(&name)?;
    let payload: Box<RawValue> = decode_body(subsystem.name(), &body)?;
    let updated = subsystem.crud().update(&id, &payload).await?;
    Ok(EntityResponse::Ok(Json(updated)))
}

/// `DELETE /api/subsystems/:name/:id` — delete an entity.
pub async fn delete_entity<MS, JS>(
    State(state): State<AppState<MS, JS>>,
    Path((name, id)): Path<(String, String)>,
) -> Result<EntityResponse, ApiError>
where
    MS: EntityStore<Macro> + 'static,
    JS: EntityStore<Job> + 'static,
{
    state.registry.crud(&name)?.delete(&id).await?;
    Ok(EntityResponse::NoContent)
}

/// Possible responses from the usage endpoint.
pub enum UsageResponse {
    Ok(Json<Vec<Usage>>),
}

impl IntoResponse for UsageResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/subsystems/:name/:id/usage` — recent usage of a dosing pump,
/// newest first.
pub async fn usage<MS, JS>(
    State(state): State<AppState<MS, JS>>,
    Path((name, id)): Path<(String, String)>,
    Query(query): Query<UsageQuery>,
) -> Result<UsageResponse, ApiError>
where
    MS: EntityStore<Macro> + 'static,
    JS: EntityStore<Job> + 'static,
{
    let entity_id = parse_entity_id(id)?;
    let history = state
        .registry
        .doser(&name)?
        .usage(entity_id, query.limit)
        .await?;
    Ok(UsageResponse::Ok(Json(history)))
}

/// `PUT /api/subsystems/:name/:id/state` — switch an entity on or off.
pub async fn set_state<MS, JS>(
    State(state): State<AppState<MS, JS>>,
    Path((name, id)): Path<(String, String)>,
    Json(req): Json<SetStateRequest>,
) -> Result<EntityResponse, ApiError>
where
    MS: EntityStore<Macro> + 'static,
    JS: EntityStore<Job> + 'static,
{
    let entity_id = parse_entity_id(id)?;
    state.registry.on(&name, entity_id, req.on).await?;
    Ok(EntityResponse::NoContent)
}

fn parse_entity_id(id: String) -> Result<EntityId, ReefHubError> {
    EntityId::from_str(&id).map_err(|_| ValidationError::InvalidId { value: id }.into())
}
