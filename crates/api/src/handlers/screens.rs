//! Handlers for `/screens`, including the resolved display payload that
//! players fetch.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::json;
use signage_core::error::CoreError;
use signage_core::screen::{validate_name, ScreenConfig, ScreenConfigPatch, ScreenMode};
use signage_core::DbId;
use signage_db::models::product::Product;
use signage_db::models::screen::{
    CreateScreen, ScreenChanges, ScreenListQuery, ScreenWithProducts, UpdateScreen,
};
use signage_db::models::static_asset::StaticAsset;
use signage_db::models::template::Template;
use signage_db::repositories::{
    LocationRepo, ProductRepo, ScreenRepo, StaticAssetRepo, TemplateRepo,
};
use signage_db::DbPool;
use signage_events::names::{ENTITY_SCREEN, SCREEN_DELETED, SCREEN_UPDATED};
use signage_events::SignageEvent;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, WithUrl};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// What a player should render, resolved from the screen configuration.
#[derive(Debug, Serialize)]
pub struct ScreenDisplay {
    pub screen_id: DbId,
    pub name: String,
    pub is_active: bool,
    #[serde(flatten)]
    pub content: DisplayContent,
}

#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum DisplayContent {
    /// Template plus the active products in display order.
    Dynamic {
        template: Template,
        products: Vec<Product>,
    },
    Static { asset: WithUrl<StaticAsset> },
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Publish `screen.updated` for each id. Used when a template or product a
/// screen depends on changes.
pub(crate) fn notify_screens_updated(
    state: &AppState,
    screen_ids: &[DbId],
    user_id: DbId,
    reason: &str,
) {
    for &screen_id in screen_ids {
        state.event_bus.publish(
            SignageEvent::new(SCREEN_UPDATED)
                .with_source(ENTITY_SCREEN, screen_id)
                .with_actor(user_id)
                .with_payload(json!({ "reason": reason })),
        );
    }
}

fn publish_screen(state: &AppState, event_type: &str, screen_id: DbId, user_id: DbId) {
    state.event_bus.publish(
        SignageEvent::new(event_type)
            .with_source(ENTITY_SCREEN, screen_id)
            .with_actor(user_id),
    );
}

/// Reject configurations that point at rows which do not exist.
async fn check_references(
    pool: &DbPool,
    location_id: Option<DbId>,
    config: &ScreenConfig,
) -> AppResult<()> {
    if let Some(location_id) = location_id {
        if LocationRepo::find_by_id(pool, location_id).await?.is_none() {
            return Err(CoreError::Validation(format!("Location {location_id} does not exist")).into());
        }
    }
    if let Some(template_id) = config.template_id {
        if TemplateRepo::find_by_id(pool, template_id).await?.is_none() {
            return Err(CoreError::Validation(format!("Template {template_id} does not exist")).into());
        }
    }
    if let Some(asset_id) = config.static_asset_id {
        if StaticAssetRepo::find_by_id(pool, asset_id).await?.is_none() {
            return Err(
                CoreError::Validation(format!("Static asset {asset_id} does not exist")).into(),
            );
        }
    }
    let missing = ProductRepo::missing_ids(pool, &config.product_ids).await?;
    if !missing.is_empty() {
        let ids: Vec<String> = missing.iter().map(ToString::to_string).collect();
        return Err(CoreError::Validation(format!(
            "Unknown product ids: {}",
            ids.join(", ")
        ))
        .into());
    }
    Ok(())
}

async fn find_screen(pool: &DbPool, id: DbId) -> AppResult<ScreenWithProducts> {
    ScreenRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Screen",
            id,
        }))
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/screens
pub async fn list_screens(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ScreenListQuery>,
) -> AppResult<impl IntoResponse> {
    if let Some(mode) = &params.mode {
        ScreenMode::parse(mode)?;
    }
    let screens = ScreenRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: screens }))
}

/// POST /api/v1/screens
pub async fn create_screen(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateScreen>,
) -> AppResult<impl IntoResponse> {
    validate_name("Screen", &input.name)?;
    let config = ScreenConfig {
        mode: ScreenMode::parse(&input.mode)?,
        template_id: input.template_id,
        static_asset_id: input.static_asset_id,
        product_ids: input.product_ids,
    };
    config.validate()?;
    check_references(&state.pool, input.location_id, &config).await?;

    let screen = ScreenRepo::create(
        &state.pool,
        input.location_id,
        &input.name,
        &config,
        input.is_active,
    )
    .await?;

    tracing::info!(
        screen_id = screen.screen.id,
        mode = %config.mode,
        user_id = auth.user_id,
        "Screen created",
    );
    publish_screen(&state, SCREEN_UPDATED, screen.screen.id, auth.user_id);

    Ok((StatusCode::CREATED, Json(DataResponse { data: screen })))
}

/// GET /api/v1/screens/{id}
pub async fn get_screen(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let screen = find_screen(&state.pool, id).await?;
    Ok(Json(DataResponse { data: screen }))
}

/// PUT /api/v1/screens/{id}
///
/// Switching `mode` clears the configuration of the previous mode.
pub async fn update_screen(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateScreen>,
) -> AppResult<impl IntoResponse> {
    if let Some(name) = &input.name {
        validate_name("Screen", name)?;
    }
    let current = find_screen(&state.pool, id).await?;

    let current_config = ScreenConfig {
        mode: ScreenMode::parse(&current.screen.mode)?,
        template_id: current.screen.template_id,
        static_asset_id: current.screen.static_asset_id,
        product_ids: current.product_ids,
    };
    let patch = ScreenConfigPatch {
        mode: input.mode.as_deref().map(ScreenMode::parse).transpose()?,
        template_id: input.template_id,
        static_asset_id: input.static_asset_id,
        product_ids: input.product_ids,
    };
    let config = current_config.apply_patch(patch)?;
    check_references(&state.pool, input.location_id, &config).await?;

    let changes = ScreenChanges {
        location_id: input.location_id,
        name: input.name,
        is_active: input.is_active,
        config,
    };
    let screen = ScreenRepo::update(&state.pool, id, &changes)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Screen",
            id,
        }))?;

    tracing::info!(screen_id = id, user_id = auth.user_id, "Screen updated");
    publish_screen(&state, SCREEN_UPDATED, id, auth.user_id);

    Ok(Json(DataResponse { data: screen }))
}

/// DELETE /api/v1/screens/{id}
pub async fn delete_screen(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !ScreenRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Screen",
            id,
        }));
    }
    tracing::info!(screen_id = id, user_id = auth.user_id, "Screen deleted");
    publish_screen(&state, SCREEN_DELETED, id, auth.user_id);
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

/// GET /api/v1/screens/{id}/display
///
/// Inactive products are left out of a dynamic screen's list.
pub async fn get_screen_display(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let screen = find_screen(&state.pool, id).await?;

    let content = match ScreenMode::parse(&screen.screen.mode)? {
        ScreenMode::Dynamic => {
            let template_id = screen.screen.template_id.ok_or_else(|| {
                CoreError::Internal(format!("Dynamic screen {id} has no template"))
            })?;
            let template = TemplateRepo::find_by_id(&state.pool, template_id)
                .await?
                .ok_or(AppError::Core(CoreError::NotFound {
                    entity: "Template",
                    id: template_id,
                }))?;
            let products = ProductRepo::list_by_ids(&state.pool, &screen.product_ids)
                .await?
                .into_iter()
                .filter(|p| p.is_active)
                .collect();
            DisplayContent::Dynamic { template, products }
        }
        ScreenMode::Static => {
            let asset_id = screen.screen.static_asset_id.ok_or_else(|| {
                CoreError::Internal(format!("Static screen {id} has no asset"))
            })?;
            let asset = StaticAssetRepo::find_by_id(&state.pool, asset_id)
                .await?
                .ok_or(AppError::Core(CoreError::NotFound {
                    entity: "StaticAsset",
                    id: asset_id,
                }))?;
            let url = state.storage().public_url(&asset.storage_key);
            DisplayContent::Static {
                asset: WithUrl { item: asset, url },
            }
        }
    };

    Ok(Json(DataResponse {
        data: ScreenDisplay {
            screen_id: screen.screen.id,
            name: screen.screen.name,
            is_active: screen.screen.is_active,
            content,
        },
    }))
}
