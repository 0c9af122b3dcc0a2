//! Generation records and their downloaded output files.

use serde::{Deserialize, Serialize};
use signage_core::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `generations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Generation {
    pub id: DbId,
    pub kind: String,
    pub model: String,
    pub prompt: String,
    pub image_url: Option<String>,
    pub parameters: serde_json::Value,
    pub status: String,
    pub request_id: Option<String>,
    pub result: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub created_by: DbId,
    pub retry_of_id: Option<DbId>,
    pub submitted_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `generation_files` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GenerationFile {
    pub id: DbId,
    pub generation_id: DbId,
    pub position: i32,
    pub source_url: String,
    pub storage_key: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub sha256: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Request body for starting a generation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGeneration {
    pub kind: String,
    pub model: String,
    pub prompt: String,
    pub image_url: Option<String>,
    pub parameters: Option<serde_json::Value>,
}

/// Insert DTO for `GenerationRepo::create`.
#[derive(Debug, Clone)]
pub struct NewGeneration {
    pub kind: String,
    pub model: String,
    pub prompt: String,
    pub image_url: Option<String>,
    pub parameters: serde_json::Value,
    pub created_by: DbId,
    pub retry_of_id: Option<DbId>,
}

/// Insert DTO for `GenerationFileRepo::create`.
#[derive(Debug, Clone)]
pub struct CreateGenerationFile {
    pub generation_id: DbId,
    pub position: i32,
    pub source_url: String,
    pub storage_key: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub sha256: String,
}

/// Filters for listing generations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationListQuery {
    pub status: Option<String>,
    pub kind: Option<String>,
    pub created_by: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
