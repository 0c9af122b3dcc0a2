//! Handlers for `/products`.
//!
//! Changing or deleting a product publishes `screen.updated` for every
//! screen that lists it.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use signage_core::error::CoreError;
use signage_core::product::{validate_currency, validate_price_cents};
use signage_core::screen::validate_name;
use signage_core::DbId;
use signage_db::models::product::{CreateProduct, ProductListQuery, UpdateProduct};
use signage_db::repositories::{ProductRepo, ScreenRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::screens::notify_screens_updated;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

fn validate_pricing(price_cents: Option<i64>, currency: Option<&str>) -> Result<(), CoreError> {
    if let Some(price) = price_cents {
        validate_price_cents(price)?;
    }
    if let Some(currency) = currency {
        validate_currency(currency)?;
    }
    Ok(())
}

/// GET /api/v1/products
pub async fn list_products(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ProductListQuery>,
) -> AppResult<impl IntoResponse> {
    let products = ProductRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: products }))
}

/// POST /api/v1/products
pub async fn create_product(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateProduct>,
) -> AppResult<impl IntoResponse> {
    validate_name("Product", &input.name)?;
    validate_pricing(input.price_cents, input.currency.as_deref())?;

    let product = ProductRepo::create(&state.pool, &input).await?;
    tracing::info!(product_id = product.id, user_id = auth.user_id, "Product created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: product })))
}

/// GET /api/v1/products/{id}
pub async fn get_product(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let product = ProductRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id,
        }))?;
    Ok(Json(DataResponse { data: product }))
}

/// PUT /api/v1/products/{id}
pub async fn update_product(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProduct>,
) -> AppResult<impl IntoResponse> {
    if let Some(name) = &input.name {
        validate_name("Product", name)?;
    }
    validate_pricing(input.price_cents, input.currency.as_deref())?;

    let product = ProductRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id,
        }))?;

    let screen_ids = ScreenRepo::ids_showing_product(&state.pool, id).await?;
    tracing::info!(
        product_id = id,
        affected_screens = screen_ids.len(),
        user_id = auth.user_id,
        "Product updated",
    );
    notify_screens_updated(&state, &screen_ids, auth.user_id, "product_updated");

    Ok(Json(DataResponse { data: product }))
}

/// DELETE /api/v1/products/{id}
///
/// The product is also removed from every screen list that contains it.
pub async fn delete_product(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let screen_ids = ScreenRepo::ids_showing_product(&state.pool, id).await?;
    if !ProductRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id,
        }));
    }
    tracing::info!(product_id = id, user_id = auth.user_id, "Product deleted");
    notify_screens_updated(&state, &screen_ids, auth.user_id, "product_deleted");
    Ok(StatusCode::NO_CONTENT)
}
