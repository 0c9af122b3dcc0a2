//! Handlers for `/generations`: AI image and video generation requests.
//!
//! Creating a generation returns immediately with the `pending` record;
//! the runner drives it to completion in the background and progress is
//! pushed over the WebSocket as `generation.*` events.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use signage_core::error::CoreError;
use signage_core::generation::{GenerationKind, GenerationStatus};
use signage_core::screen::validate_name;
use signage_core::storage::{extension_for_content_type, is_image_content_type, static_asset_key};
use signage_core::DbId;
use signage_db::models::generation::{
    CreateGeneration, Generation, GenerationFile, GenerationListQuery, NewGeneration,
};
use signage_db::models::static_asset::CreateStaticAsset;
use signage_db::repositories::{GenerationFileRepo, GenerationRepo};
use signage_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::handlers::static_assets::{insert_stored_asset, with_url};
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, WithUrl};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// A generation with its stored output files.
#[derive(Debug, Serialize)]
pub struct GenerationDetail {
    #[serde(flatten)]
    pub generation: Generation,
    pub files: Vec<WithUrl<GenerationFile>>,
}

/// Request body for `POST /generations/{id}/promote`.
#[derive(Debug, Deserialize)]
pub struct PromoteRequest {
    /// Output file to promote; defaults to the first image output.
    pub file_id: Option<DbId>,
    /// Asset name; defaults to `Generation <id>`.
    pub name: Option<String>,
}

async fn find_generation(pool: &DbPool, id: DbId) -> AppResult<Generation> {
    GenerationRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Generation",
            id,
        }))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/generations
pub async fn list_generations(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<GenerationListQuery>,
) -> AppResult<impl IntoResponse> {
    if let Some(status) = &params.status {
        GenerationStatus::parse(status)?;
    }
    if let Some(kind) = &params.kind {
        GenerationKind::parse(kind)?;
    }
    let generations = GenerationRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: generations }))
}

/// POST /api/v1/generations
///
/// Validates the request, stores a `pending` record and starts it.
pub async fn create_generation(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateGeneration>,
) -> AppResult<impl IntoResponse> {
    let new = NewGeneration {
        kind: input.kind,
        model: input.model,
        prompt: input.prompt,
        image_url: input.image_url,
        parameters: input
            .parameters
            .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
        created_by: auth.user_id,
        retry_of_id: None,
    };
    let generation = state.runner.launch(&new).await?;

    tracing::info!(
        generation_id = generation.id,
        user_id = auth.user_id,
        "Generation requested",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: generation })))
}

/// GET /api/v1/generations/{id}
pub async fn get_generation(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let generation = find_generation(&state.pool, id).await?;
    let files = GenerationFileRepo::list_by_generation(&state.pool, id)
        .await?
        .into_iter()
        .map(|file| {
            let url = state.storage().public_url(&file.storage_key);
            WithUrl { item: file, url }
        })
        .collect();

    Ok(Json(DataResponse {
        data: GenerationDetail { generation, files },
    }))
}

/// DELETE /api/v1/generations/{id}
///
/// Only finished generations can be deleted; their stored files go too.
/// Static assets promoted from it are kept.
pub async fn delete_generation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let generation = find_generation(&state.pool, id).await?;
    if !GenerationStatus::parse(&generation.status)?.is_terminal() {
        return Err(CoreError::Conflict(format!(
            "Generation {id} is still {}; cancel it first",
            generation.status
        ))
        .into());
    }

    let files = GenerationFileRepo::list_by_generation(&state.pool, id).await?;
    if !GenerationRepo::delete_finished(&state.pool, id).await? {
        return Err(CoreError::Conflict(format!("Generation {id} changed while deleting")).into());
    }

    for file in &files {
        if let Err(e) = state.storage().delete(&file.storage_key).await {
            tracing::warn!(
                generation_id = id,
                storage_key = %file.storage_key,
                error = %e,
                "Failed to remove generation file",
            );
        }
    }

    tracing::info!(
        generation_id = id,
        files = files.len(),
        user_id = auth.user_id,
        "Generation deleted",
    );
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/generations/{id}/cancel
pub async fn cancel_generation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let generation = state.runner.cancel(id).await?;
    tracing::info!(generation_id = id, user_id = auth.user_id, "Generation cancel requested");
    Ok(Json(DataResponse { data: generation }))
}

/// POST /api/v1/generations/{id}/retry
///
/// Starts a new generation with the same inputs as a failed one.
pub async fn retry_generation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let original = find_generation(&state.pool, id).await?;
    if GenerationStatus::parse(&original.status)? != GenerationStatus::Failed {
        return Err(CoreError::Conflict(format!(
            "Only failed generations can be retried; generation {id} is {}",
            original.status
        ))
        .into());
    }

    let new = NewGeneration {
        kind: original.kind,
        model: original.model,
        prompt: original.prompt,
        image_url: original.image_url,
        parameters: original.parameters,
        created_by: auth.user_id,
        retry_of_id: Some(id),
    };
    let generation = state.runner.launch(&new).await?;

    tracing::info!(
        generation_id = generation.id,
        retry_of_id = id,
        user_id = auth.user_id,
        "Generation retried",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: generation })))
}

/// POST /api/v1/generations/{id}/promote
///
/// Copies an image output of a completed generation into a new static
/// asset.
pub async fn promote_generation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<PromoteRequest>,
) -> AppResult<impl IntoResponse> {
    let generation = find_generation(&state.pool, id).await?;
    if GenerationStatus::parse(&generation.status)? != GenerationStatus::Completed {
        return Err(CoreError::Conflict(format!(
            "Generation {id} is {}; only completed generations can be promoted",
            generation.status
        ))
        .into());
    }

    let file = match input.file_id {
        Some(file_id) => GenerationFileRepo::find_by_id(&state.pool, file_id)
            .await?
            .filter(|f| f.generation_id == id)
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "GenerationFile",
                id: file_id,
            }))?,
        None => GenerationFileRepo::list_by_generation(&state.pool, id)
            .await?
            .into_iter()
            .find(|f| is_image_content_type(&f.content_type))
            .ok_or_else(|| {
                CoreError::Validation(format!("Generation {id} has no image output"))
            })?,
    };
    if !is_image_content_type(&file.content_type) {
        return Err(CoreError::Validation(format!(
            "File {} is {}, only images can become static assets",
            file.id, file.content_type
        ))
        .into());
    }

    let name = input
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| format!("Generation {id}"));
    validate_name("Static asset", &name)?;

    let storage_key = static_asset_key(extension_for_content_type(&file.content_type));
    let size = state.storage().copy(&file.storage_key, &storage_key).await?;

    let asset = insert_stored_asset(
        &state,
        &CreateStaticAsset {
            name,
            storage_key,
            content_type: file.content_type,
            size_bytes: size as i64,
            width: file.width,
            height: file.height,
            sha256: file.sha256,
            source_generation_id: Some(id),
            created_by: auth.user_id,
        },
    )
    .await?;

    tracing::info!(
        generation_id = id,
        file_id = file.id,
        asset_id = asset.id,
        user_id = auth.user_id,
        "Generation output promoted to static asset",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: with_url(state.storage(), asset),
        }),
    ))
}
