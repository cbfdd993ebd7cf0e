use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    error::AppError,
    state::AppState,
    vehicles::{
        dto::{
            CreateVehicleRequest, UpdateVehicleRequest, UpdateVehicleResponse, VehicleDetails,
            VehicleFilter, VehicleList,
        },
        service,
    },
};

pub fn vehicle_routes() -> Router<AppState> {
    Router::new()
        .route("/vehicles", post(create_vehicle))
        .route("/vehicles", get(list_vehicles))
        .route("/vehicles/:id", get(get_vehicle))
        .route("/vehicles/:id", put(update_vehicle))
        .route("/vehicles/:id", delete(delete_vehicle))
}

#[instrument(skip(state, user, payload))]
pub async fn create_vehicle(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateVehicleRequest>,
) -> Result<(StatusCode, Json<VehicleDetails>), AppError> {
    let vehicle = service::create_vehicle(&state, user.id, &payload).await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

#[instrument(skip(state, user))]
pub async fn list_vehicles(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filter): Query<VehicleFilter>,
) -> Result<Json<VehicleList>, AppError> {
    let list = service::list_vehicles(&state, user.id, &filter).await?;
    Ok(Json(list))
}

#[instrument(skip(state, user))]
pub async fn get_vehicle(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<VehicleDetails>, AppError> {
    let vehicle = service::get_vehicle(&state, user.id, id).await?;
    Ok(Json(vehicle))
}

#[instrument(skip(state, user, payload))]
pub async fn update_vehicle(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVehicleRequest>,
) -> Result<Json<UpdateVehicleResponse>, AppError> {
    let outcome = service::update_vehicle(&state, user.id, id, &payload).await?;
    Ok(Json(outcome))
}

#[instrument(skip(state, user))]
pub async fn delete_vehicle(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    service::delete_vehicle(&state, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
