//! Request user extractor.
//!
//! There is no login yet: every request acts as the user configured by
//! `STUB_USER_ID`. Handlers still take [`AuthUser`] so attribution
//! (`created_by`, event actors) flows through one place.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use signage_core::DbId;

use crate::error::AppError;
use crate::state::AppState;

/// The user a request acts as.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: DbId,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(AuthUser {
            user_id: state.config.stub_user_id,
        })
    }
}
