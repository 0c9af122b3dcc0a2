//! Handlers for `/templates`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use signage_core::error::CoreError;
use signage_core::screen::validate_name;
use signage_core::DbId;
use signage_db::models::template::{CreateTemplate, UpdateTemplate, VALID_ORIENTATIONS};
use signage_db::repositories::{ScreenRepo, TemplateRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::screens::notify_screens_updated;
use crate::middleware::auth::AuthUser;
use crate::params::ActiveFilter;
use crate::response::DataResponse;
use crate::state::AppState;

fn validate_template_fields(
    orientation: Option<&str>,
    layout: Option<&serde_json::Value>,
) -> Result<(), CoreError> {
    if let Some(orientation) = orientation {
        if !VALID_ORIENTATIONS.contains(&orientation) {
            return Err(CoreError::Validation(format!(
                "Invalid orientation '{orientation}'. Must be one of: {}",
                VALID_ORIENTATIONS.join(", ")
            )));
        }
    }
    if layout.is_some_and(|l| !l.is_object()) {
        return Err(CoreError::Validation(
            "Template layout must be a JSON object".into(),
        ));
    }
    Ok(())
}

/// GET /api/v1/templates
pub async fn list_templates(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ActiveFilter>,
) -> AppResult<impl IntoResponse> {
    let templates = TemplateRepo::list(&state.pool, params.include_inactive).await?;
    Ok(Json(DataResponse { data: templates }))
}

/// POST /api/v1/templates
pub async fn create_template(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateTemplate>,
) -> AppResult<impl IntoResponse> {
    validate_name("Template", &input.name)?;
    validate_template_fields(input.orientation.as_deref(), input.layout.as_ref())?;

    let template = TemplateRepo::create(&state.pool, &input).await?;
    tracing::info!(template_id = template.id, user_id = auth.user_id, "Template created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: template })))
}

/// GET /api/v1/templates/{id}
pub async fn get_template(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let template = TemplateRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Template",
            id,
        }))?;
    Ok(Json(DataResponse { data: template }))
}

/// PUT /api/v1/templates/{id}
pub async fn update_template(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTemplate>,
) -> AppResult<impl IntoResponse> {
    if let Some(name) = &input.name {
        validate_name("Template", name)?;
    }
    validate_template_fields(input.orientation.as_deref(), input.layout.as_ref())?;

    let template = TemplateRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Template",
            id,
        }))?;

    let screen_ids = ScreenRepo::ids_using_template(&state.pool, id).await?;
    tracing::info!(
        template_id = id,
        affected_screens = screen_ids.len(),
        user_id = auth.user_id,
        "Template updated",
    );
    notify_screens_updated(&state, &screen_ids, auth.user_id, "template_updated");

    Ok(Json(DataResponse { data: template }))
}

/// DELETE /api/v1/templates/{id}
///
/// Fails with 409 while a screen uses the template.
pub async fn delete_template(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !TemplateRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Template",
            id,
        }));
    }
    tracing::info!(template_id = id, user_id = auth.user_id, "Template deleted");
    Ok(StatusCode::NO_CONTENT)
}
