use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{AccessLogEntry, Building, NewVehicle, Vehicle, VehiclePatch};
use crate::registry::{AccessLedger, TenantRegistry, VehicleRegistry};
use crate::{verify, AppState};

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Deserialize)]
pub struct CreateBuildingRequest {
    pub name: String,
    pub address: Option<String>,
}

/// The only response shape that carries an API token. `Building` itself
/// never serializes its token.
#[derive(Serialize)]
pub struct BuildingTokenResponse {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub api_token: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Building> for BuildingTokenResponse {
    fn from(b: Building) -> Self {
        Self {
            id: b.id,
            name: b.name,
            address: b.address,
            api_token: b.api_token,
            is_active: b.is_active,
            created_at: b.created_at,
        }
    }
}

#[derive(Deserialize)]
pub struct RegisterVehicleRequest {
    pub license_plate: String,
    #[serde(flatten)]
    pub attrs: NewVehicle,
}

#[derive(Deserialize)]
pub struct ListVehiclesParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub active_only: Option<bool>,
}

#[derive(Deserialize)]
pub struct ListLogsParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub authorized_only: Option<bool>,
}

#[derive(Deserialize)]
pub struct PlateLogsParams {
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub image_base64: String,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub license_plate: Option<String>,
    pub is_authorized: bool,
    pub confidence: i32,
    pub owner_name: Option<String>,
    pub apartment: Option<String>,
    pub message: String,
}

// ── Admin handlers ───────────────────────────────────────────

/// POST /admin/buildings: create a building and mint its API token.
pub async fn create_building(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateBuildingRequest>,
) -> Result<(StatusCode, Json<BuildingTokenResponse>), AppError> {
    let building = state
        .db
        .create_building(&payload.name, payload.address.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(building.into())))
}

/// GET /admin/buildings: all buildings, inactive included, tokens omitted.
pub async fn list_buildings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Building>>, AppError> {
    Ok(Json(state.db.list_buildings().await?))
}

/// POST /admin/buildings/:id/rotate-token: replace the API token.
/// The old token stops authenticating immediately.
pub async fn rotate_building_token(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BuildingTokenResponse>, AppError> {
    let building = state.db.rotate_token(id).await?;
    Ok(Json(building.into()))
}

// ── Tenant handlers ──────────────────────────────────────────

/// POST /api/v1/verify: recognize a plate and decide authorization.
pub async fn verify_image(
    State(state): State<Arc<AppState>>,
    Extension(building): Extension<Building>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, AppError> {
    let image = BASE64
        .decode(payload.image_base64.as_bytes())
        .map_err(|_| AppError::Validation("image_base64 is not valid base64".into()))?;

    let outcome = verify::verify(
        state.alpr.as_ref(),
        &state.db,
        &state.db,
        &building,
        &image,
    )
    .await?;

    let message = if outcome.license_plate.is_none() {
        "No license plate detected in the image"
    } else if outcome.is_authorized {
        "Vehicle authorized"
    } else {
        "Vehicle not authorized for this building"
    };

    Ok(Json(VerifyResponse {
        license_plate: outcome.license_plate,
        is_authorized: outcome.is_authorized,
        confidence: outcome.confidence,
        owner_name: outcome.owner_name,
        apartment: outcome.apartment,
        message: message.to_string(),
    }))
}

/// POST /api/v1/vehicles: register a vehicle for this building.
pub async fn register_vehicle(
    State(state): State<Arc<AppState>>,
    Extension(building): Extension<Building>,
    Json(payload): Json<RegisterVehicleRequest>,
) -> Result<(StatusCode, Json<Vehicle>), AppError> {
    let vehicle = state
        .db
        .register(building.id, &payload.license_plate, payload.attrs)
        .await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// GET /api/v1/vehicles: page over this building's vehicles.
pub async fn list_vehicles(
    State(state): State<Arc<AppState>>,
    Extension(building): Extension<Building>,
    Query(params): Query<ListVehiclesParams>,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    // Both registries expose a `list`; qualify which one we mean.
    let vehicles = VehicleRegistry::list(
        &state.db,
        building.id,
        params.skip.unwrap_or(0),
        params.limit.unwrap_or(100),
        params.active_only.unwrap_or(true),
    )
    .await?;
    Ok(Json(vehicles))
}

/// GET /api/v1/vehicles/:plate
pub async fn get_vehicle(
    State(state): State<Arc<AppState>>,
    Extension(building): Extension<Building>,
    Path(plate): Path<String>,
) -> Result<Json<Vehicle>, AppError> {
    let vehicle = state
        .db
        .get(building.id, &plate)
        .await?
        .ok_or(AppError::NotFound("vehicle"))?;
    Ok(Json(vehicle))
}

/// PUT /api/v1/vehicles/:plate: partial update of an active vehicle.
pub async fn update_vehicle(
    State(state): State<Arc<AppState>>,
    Extension(building): Extension<Building>,
    Path(plate): Path<String>,
    Json(patch): Json<VehiclePatch>,
) -> Result<Json<Vehicle>, AppError> {
    if patch.is_empty() {
        return Err(AppError::Validation("at least one field must be provided".into()));
    }
    let vehicle = state.db.update(building.id, &plate, patch).await?;
    Ok(Json(vehicle))
}

/// DELETE /api/v1/vehicles/:plate: soft deactivation.
pub async fn deactivate_vehicle(
    State(state): State<Arc<AppState>>,
    Extension(building): Extension<Building>,
    Path(plate): Path<String>,
) -> Result<Json<Vehicle>, AppError> {
    let vehicle = state.db.deactivate(building.id, &plate).await?;
    Ok(Json(vehicle))
}

/// GET /api/v1/logs: newest-first access log for this building.
pub async fn list_access_logs(
    State(state): State<Arc<AppState>>,
    Extension(building): Extension<Building>,
    Query(params): Query<ListLogsParams>,
) -> Result<Json<Vec<AccessLogEntry>>, AppError> {
    let logs = AccessLedger::list(
        &state.db,
        building.id,
        params.skip.unwrap_or(0),
        params.limit.unwrap_or(100),
        params.authorized_only,
    )
    .await?;
    Ok(Json(logs))
}

/// GET /api/v1/logs/:plate: log entries for one plate, newest first.
pub async fn get_vehicle_logs(
    State(state): State<Arc<AppState>>,
    Extension(building): Extension<Building>,
    Path(plate): Path<String>,
    Query(params): Query<PlateLogsParams>,
) -> Result<Json<Vec<AccessLogEntry>>, AppError> {
    let logs = state
        .db
        .list_for_plate(building.id, &plate, params.limit.unwrap_or(50))
        .await?;
    Ok(Json(logs))
}
