//! Repository for the `generation_files` table.

use signage_core::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::generation::{CreateGenerationFile, GenerationFile};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, generation_id, position, source_url, storage_key, content_type, \
    size_bytes, width, height, sha256, created_at, updated_at";

/// Provides access to the downloaded output files of generations.
pub struct GenerationFileRepo;

impl GenerationFileRepo {
    /// Record one stored output file. Accepts a pool or an open transaction.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        input: &CreateGenerationFile,
    ) -> Result<GenerationFile, sqlx::Error> {
        let query = format!(
            "INSERT INTO generation_files \
                (generation_id, position, source_url, storage_key, content_type, \
                 size_bytes, width, height, sha256) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GenerationFile>(&query)
            .bind(input.generation_id)
            .bind(input.position)
            .bind(&input.source_url)
            .bind(&input.storage_key)
            .bind(&input.content_type)
            .bind(input.size_bytes)
            .bind(input.width)
            .bind(input.height)
            .bind(&input.sha256)
            .fetch_one(executor)
            .await
    }

    /// Find a file by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<GenerationFile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM generation_files WHERE id = $1");
        sqlx::query_as::<_, GenerationFile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List the files of a generation in output order.
    pub async fn list_by_generation(
        pool: &PgPool,
        generation_id: DbId,
    ) -> Result<Vec<GenerationFile>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM generation_files \
             WHERE generation_id = $1 ORDER BY position"
        );
        sqlx::query_as::<_, GenerationFile>(&query)
            .bind(generation_id)
            .fetch_all(pool)
            .await
    }

    /// Remove every file row of a generation, returning the removed rows.
    pub async fn delete_by_generation(
        pool: &PgPool,
        generation_id: DbId,
    ) -> Result<Vec<GenerationFile>, sqlx::Error> {
        let query = format!(
            "DELETE FROM generation_files WHERE generation_id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GenerationFile>(&query)
            .bind(generation_id)
            .fetch_all(pool)
            .await
    }
}
