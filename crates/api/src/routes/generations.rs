use axum::routing::{get, post};
use axum::Router;

use crate::handlers::generations;
use crate::state::AppState;

/// Generation routes mounted at `/generations`.
///
/// ```text
/// GET    /               -> list_generations (?status, kind, created_by, limit, offset)
/// POST   /               -> create_generation
/// GET    /{id}           -> get_generation
/// DELETE /{id}           -> delete_generation
/// POST   /{id}/cancel    -> cancel_generation
/// POST   /{id}/retry     -> retry_generation
/// POST   /{id}/promote   -> promote_generation
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(generations::list_generations).post(generations::create_generation),
        )
        .route(
            "/{id}",
            get(generations::get_generation).delete(generations::delete_generation),
        )
        .route("/{id}/cancel", post(generations::cancel_generation))
        .route("/{id}/retry", post(generations::retry_generation))
        .route("/{id}/promote", post(generations::promote_generation))
}
