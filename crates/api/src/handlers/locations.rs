//! Handlers for `/locations`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use signage_core::error::CoreError;
use signage_core::screen::validate_name;
use signage_core::DbId;
use signage_db::models::location::{CreateLocation, UpdateLocation};
use signage_db::repositories::LocationRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::params::ActiveFilter;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/locations
pub async fn list_locations(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ActiveFilter>,
) -> AppResult<impl IntoResponse> {
    let locations = LocationRepo::list(&state.pool, params.include_inactive).await?;
    Ok(Json(DataResponse { data: locations }))
}

/// POST /api/v1/locations
pub async fn create_location(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateLocation>,
) -> AppResult<impl IntoResponse> {
    validate_name("Location", &input.name)?;

    let location = LocationRepo::create(&state.pool, &input).await?;
    tracing::info!(
        location_id = location.id,
        name = %location.name,
        user_id = auth.user_id,
        "Location created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: location })))
}

/// GET /api/v1/locations/{id}
pub async fn get_location(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let location = LocationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Location",
            id,
        }))?;
    Ok(Json(DataResponse { data: location }))
}

/// PUT /api/v1/locations/{id}
pub async fn update_location(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateLocation>,
) -> AppResult<impl IntoResponse> {
    if let Some(name) = &input.name {
        validate_name("Location", name)?;
    }

    let location = LocationRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Location",
            id,
        }))?;
    tracing::info!(location_id = id, user_id = auth.user_id, "Location updated");

    Ok(Json(DataResponse { data: location }))
}

/// DELETE /api/v1/locations/{id}
///
/// Fails with 409 while screens or products still belong to the location.
pub async fn delete_location(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !LocationRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Location",
            id,
        }));
    }
    tracing::info!(location_id = id, user_id = auth.user_id, "Location deleted");
    Ok(StatusCode::NO_CONTENT)
}
