use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;

use crate::handlers::static_assets;
use crate::state::AppState;

/// Room for multipart boundaries and the `name` field on top of the file.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Static asset routes mounted at `/static-assets`.
///
/// ```text
/// GET    /          -> list_static_assets (?limit, offset)
/// POST   /          -> upload_static_asset (multipart: file, name?)
/// GET    /{id}      -> get_static_asset
/// PUT    /{id}      -> rename_static_asset
/// DELETE /{id}      -> delete_static_asset
/// ```
///
/// The request body limit is raised to `max_upload_bytes` so oversized
/// files reach the handler's own size check.
pub fn router(max_upload_bytes: u64) -> Router<AppState> {
    let body_limit = usize::try_from(max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route(
            "/",
            get(static_assets::list_static_assets)
                .post(static_assets::upload_static_asset)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(
            "/{id}",
            get(static_assets::get_static_asset)
                .put(static_assets::rename_static_asset)
                .delete(static_assets::delete_static_asset),
        )
}
