//! Template entity model and DTOs.
//!
//! A template describes how a dynamic screen lays out its product list.
//! The `layout` document is opaque to the backend beyond being a JSON
//! object; the player interprets it.

use serde::{Deserialize, Serialize};
use signage_core::{DbId, Timestamp};
use sqlx::FromRow;

/// Landscape orientation (default).
pub const ORIENTATION_LANDSCAPE: &str = "landscape";
/// Portrait orientation.
pub const ORIENTATION_PORTRAIT: &str = "portrait";

/// All valid template orientations.
pub const VALID_ORIENTATIONS: &[&str] = &[ORIENTATION_LANDSCAPE, ORIENTATION_PORTRAIT];

/// A row from the `templates` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Template {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub orientation: String,
    pub layout: serde_json::Value,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new template.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTemplate {
    pub name: String,
    pub description: Option<String>,
    pub orientation: Option<String>,
    pub layout: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

/// DTO for updating an existing template. All fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTemplate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub orientation: Option<String>,
    pub layout: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}
