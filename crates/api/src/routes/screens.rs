use axum::routing::get;
use axum::Router;

use crate::handlers::screens;
use crate::state::AppState;

/// Screen routes mounted at `/screens`.
///
/// ```text
/// GET    /              -> list_screens (?location_id, mode)
/// POST   /              -> create_screen
/// GET    /{id}          -> get_screen
/// PUT    /{id}          -> update_screen
/// DELETE /{id}          -> delete_screen
/// GET    /{id}/display  -> get_screen_display
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(screens::list_screens).post(screens::create_screen))
        .route(
            "/{id}",
            get(screens::get_screen)
                .put(screens::update_screen)
                .delete(screens::delete_screen),
        )
        .route("/{id}/display", get(screens::get_screen_display))
}
