pub mod generations;
pub mod health;
pub mod locations;
pub mod products;
pub mod screens;
pub mod static_assets;
pub mod templates;

use axum::routing::get;
use axum::Router;

use crate::config::ServerConfig;
use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                   WebSocket (?screen_id= for players)
///
/// /locations                            list, create
/// /locations/{id}                       get, update, delete
///
/// /products                             list, create
/// /products/{id}                        get, update, delete
///
/// /templates                            list, create
/// /templates/{id}                       get, update, delete
///
/// /static-assets                        list, upload (multipart)
/// /static-assets/{id}                   get, rename, delete
///
/// /screens                              list, create
/// /screens/{id}                         get, update, delete
/// /screens/{id}/display                 resolved content for a player
///
/// /generations                          list, create
/// /generations/{id}                     get (with files), delete
/// /generations/{id}/cancel              cancel (POST)
/// /generations/{id}/retry               retry a failed generation (POST)
/// /generations/{id}/promote             copy an output into a static asset (POST)
/// ```
pub fn api_routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        // WebSocket (admin clients and players).
        .route("/ws", get(ws::ws_handler))
        .nest("/locations", locations::router())
        .nest("/products", products::router())
        .nest("/templates", templates::router())
        .nest(
            "/static-assets",
            static_assets::router(config.max_upload_bytes),
        )
        .nest("/screens", screens::router())
        .nest("/generations", generations::router())
}
