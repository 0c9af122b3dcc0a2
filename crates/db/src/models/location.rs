//! Location entity model and DTOs.
//!
//! A location is a physical venue that owns screens and products.

use serde::{Deserialize, Serialize};
use signage_core::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `locations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Location {
    pub id: DbId,
    pub name: String,
    pub address: Option<String>,
    pub timezone: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new location.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLocation {
    pub name: String,
    pub address: Option<String>,
    pub timezone: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// DTO for updating an existing location. All fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLocation {
    pub name: Option<String>,
    pub address: Option<String>,
    pub timezone: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}
