//! Handlers for `/static-assets`: uploaded images shown on static screens.
//!
//! The file is written to storage before the row is inserted; if the insert
//! fails the file is removed again.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use signage_core::error::CoreError;
use signage_core::screen::validate_name;
use signage_core::storage::{
    content_type_from_path, extension_for_content_type, fingerprint, static_asset_key,
    validate_upload,
};
use signage_core::DbId;
use signage_db::models::static_asset::{CreateStaticAsset, StaticAsset, UpdateStaticAsset};
use signage_db::repositories::StaticAssetRepo;
use signage_events::names::{ENTITY_STATIC_ASSET, STATIC_ASSET_CREATED, STATIC_ASSET_DELETED};
use signage_events::SignageEvent;
use signage_pipeline::media::image_dimensions;
use signage_pipeline::FileStorage;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::params::PageParams;
use crate::response::{DataResponse, WithUrl};
use crate::state::AppState;

/// Name used when the upload carries neither a `name` field nor a file name.
const DEFAULT_ASSET_NAME: &str = "Untitled";

pub(crate) fn with_url(storage: &FileStorage, asset: StaticAsset) -> WithUrl<StaticAsset> {
    let url = storage.public_url(&asset.storage_key);
    WithUrl { item: asset, url }
}

/// Insert the row for a file already written under `input.storage_key`,
/// removing the file if the insert fails.
pub(crate) async fn insert_stored_asset(
    state: &AppState,
    input: &CreateStaticAsset,
) -> AppResult<StaticAsset> {
    match StaticAssetRepo::create(&state.pool, input).await {
        Ok(asset) => {
            state.event_bus.publish(
                SignageEvent::new(STATIC_ASSET_CREATED)
                    .with_source(ENTITY_STATIC_ASSET, asset.id)
                    .with_actor(input.created_by),
            );
            Ok(asset)
        }
        Err(e) => {
            if let Err(cleanup) = state.storage().delete(&input.storage_key).await {
                tracing::warn!(
                    storage_key = %input.storage_key,
                    error = %cleanup,
                    "Failed to remove orphaned asset file",
                );
            }
            Err(e.into())
        }
    }
}

/// GET /api/v1/static-assets
pub async fn list_static_assets(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> AppResult<impl IntoResponse> {
    let assets = StaticAssetRepo::list(&state.pool, params.limit, params.offset).await?;
    let data: Vec<_> = assets
        .into_iter()
        .map(|asset| with_url(state.storage(), asset))
        .collect();
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/static-assets
///
/// Multipart form with a required `file` field and an optional `name`.
/// The content type comes from the part header, falling back to the file
/// extension.
pub async fn upload_static_asset(
    auth: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut file: Option<(Option<String>, Option<String>, Vec<u8>)> = None;
    let mut name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "file" => {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file = Some((filename, content_type, data.to_vec()));
            }
            "name" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                name = Some(text);
            }
            _ => {}
        }
    }

    let (filename, declared_type, data) =
        file.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;

    let content_type = declared_type
        .filter(|ct| ct != "application/octet-stream")
        .or_else(|| {
            filename
                .as_deref()
                .and_then(content_type_from_path)
                .map(String::from)
        })
        .unwrap_or_default();
    validate_upload(&content_type, data.len() as u64, state.config.max_upload_bytes)?;

    let name = name
        .filter(|n| !n.trim().is_empty())
        .or_else(|| {
            filename
                .as_deref()
                .map(|f| f.rsplit_once('.').map_or(f, |(stem, _)| stem).to_string())
                .filter(|stem| !stem.trim().is_empty())
        })
        .unwrap_or_else(|| DEFAULT_ASSET_NAME.to_string());
    validate_name("Static asset", &name)?;

    let (width, height) = image_dimensions(&data).unzip();
    let storage_key = static_asset_key(extension_for_content_type(&content_type));
    state.storage().put(&storage_key, &data).await?;

    let input = CreateStaticAsset {
        name,
        storage_key,
        content_type,
        size_bytes: data.len() as i64,
        width,
        height,
        sha256: fingerprint(&data),
        source_generation_id: None,
        created_by: auth.user_id,
    };
    let asset = insert_stored_asset(&state, &input).await?;

    tracing::info!(
        asset_id = asset.id,
        size_bytes = asset.size_bytes,
        user_id = auth.user_id,
        "Static asset uploaded",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: with_url(state.storage(), asset),
        }),
    ))
}

/// GET /api/v1/static-assets/{id}
pub async fn get_static_asset(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let asset = StaticAssetRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "StaticAsset",
            id,
        }))?;
    Ok(Json(DataResponse {
        data: with_url(state.storage(), asset),
    }))
}

/// PUT /api/v1/static-assets/{id}
///
/// Only the name can change; the stored file is immutable.
pub async fn rename_static_asset(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateStaticAsset>,
) -> AppResult<impl IntoResponse> {
    validate_name("Static asset", &input.name)?;

    let asset = StaticAssetRepo::rename(&state.pool, id, &input.name)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "StaticAsset",
            id,
        }))?;
    tracing::info!(asset_id = id, user_id = auth.user_id, "Static asset renamed");

    Ok(Json(DataResponse {
        data: with_url(state.storage(), asset),
    }))
}

/// DELETE /api/v1/static-assets/{id}
///
/// Fails with 409 while a screen displays the asset.
pub async fn delete_static_asset(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if StaticAssetRepo::is_in_use(&state.pool, id).await? {
        return Err(CoreError::Conflict(format!(
            "Static asset {id} is shown on a screen"
        ))
        .into());
    }

    let asset = StaticAssetRepo::delete(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "StaticAsset",
            id,
        }))?;

    if let Err(e) = state.storage().delete(&asset.storage_key).await {
        tracing::warn!(
            asset_id = id,
            storage_key = %asset.storage_key,
            error = %e,
            "Failed to remove asset file",
        );
    }

    tracing::info!(asset_id = id, user_id = auth.user_id, "Static asset deleted");
    state.event_bus.publish(
        SignageEvent::new(STATIC_ASSET_DELETED)
            .with_source(ENTITY_STATIC_ASSET, id)
            .with_actor(auth.user_id),
    );

    Ok(StatusCode::NO_CONTENT)
}
