//! Screen entity model and DTOs.
//!
//! The product list of a dynamic screen lives in `screen_products`
//! (ordered by `position`) and is returned alongside the row as
//! [`ScreenWithProducts`].

use serde::{Deserialize, Serialize};
use signage_core::screen::ScreenConfig;
use signage_core::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `screens` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Screen {
    pub id: DbId,
    pub location_id: Option<DbId>,
    pub name: String,
    pub mode: String,
    pub template_id: Option<DbId>,
    pub static_asset_id: Option<DbId>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A screen together with its ordered product ids.
#[derive(Debug, Clone, Serialize)]
pub struct ScreenWithProducts {
    #[serde(flatten)]
    pub screen: Screen,
    pub product_ids: Vec<DbId>,
}

/// DTO for creating a new screen.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateScreen {
    pub location_id: Option<DbId>,
    pub name: String,
    pub mode: String,
    pub template_id: Option<DbId>,
    pub static_asset_id: Option<DbId>,
    #[serde(default)]
    pub product_ids: Vec<DbId>,
    pub is_active: Option<bool>,
}

/// DTO for updating an existing screen. All fields optional.
///
/// Switching `mode` clears the half of the configuration that belongs to
/// the other mode (see [`ScreenConfig::apply_patch`]).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateScreen {
    pub location_id: Option<DbId>,
    pub name: Option<String>,
    pub mode: Option<String>,
    pub template_id: Option<DbId>,
    pub static_asset_id: Option<DbId>,
    pub product_ids: Option<Vec<DbId>>,
    pub is_active: Option<bool>,
}

/// Filters for listing screens.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScreenListQuery {
    pub location_id: Option<DbId>,
    pub mode: Option<String>,
}

/// Fully resolved values written by `ScreenRepo::update`.
#[derive(Debug, Clone)]
pub struct ScreenChanges {
    pub location_id: Option<DbId>,
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub config: ScreenConfig,
}
