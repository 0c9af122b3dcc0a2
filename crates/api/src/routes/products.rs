use axum::routing::get;
use axum::Router;

use crate::handlers::products;
use crate::state::AppState;

/// Product routes mounted at `/products`.
///
/// ```text
/// GET    /          -> list_products (?location_id, category, include_inactive, limit, offset)
/// POST   /          -> create_product
/// GET    /{id}      -> get_product
/// PUT    /{id}      -> update_product
/// DELETE /{id}      -> delete_product
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
}
