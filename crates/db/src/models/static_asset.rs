//! Static asset entity model and DTOs.
//!
//! Static assets are uploaded (or promoted from a generation) images shown
//! as-is on `static` screens.

use serde::{Deserialize, Serialize};
use signage_core::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `static_assets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StaticAsset {
    pub id: DbId,
    pub name: String,
    pub storage_key: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub sha256: String,
    pub source_generation_id: Option<DbId>,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert DTO, built by the upload and promote handlers after the file
/// has been written to storage.
#[derive(Debug, Clone)]
pub struct CreateStaticAsset {
    pub name: String,
    pub storage_key: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub sha256: String,
    pub source_generation_id: Option<DbId>,
    pub created_by: DbId,
}

/// DTO for renaming an asset. The stored file is immutable.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStaticAsset {
    pub name: String,
}
