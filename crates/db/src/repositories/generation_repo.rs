//! Repository for the `generations` table.
//!
//! Status literals come from `signage_core::generation`. Every status
//! update is guarded so a terminal record (`completed` / `failed`) is never
//! rewritten; a guarded update that matches nothing returns `None`.

use signage_core::generation::{
    STATUS_COMPLETED, STATUS_FAILED, STATUS_PENDING, STATUS_PROCESSING,
};
use signage_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use signage_core::DbId;
use sqlx::PgPool;

use crate::models::generation::{
    CreateGenerationFile, Generation, GenerationFile, GenerationListQuery, NewGeneration,
};
use crate::repositories::GenerationFileRepo;

/// Column list for `generations` queries.
const COLUMNS: &str = "\
    id, kind, model, prompt, image_url, parameters, status, request_id, \
    result, error_message, created_by, retry_of_id, submitted_at, completed_at, \
    created_at, updated_at";

/// Provides CRUD and status transitions for generation records.
pub struct GenerationRepo;

impl GenerationRepo {
    /// Insert a new `pending` generation.
    pub async fn create(pool: &PgPool, input: &NewGeneration) -> Result<Generation, sqlx::Error> {
        let query = format!(
            "INSERT INTO generations \
                (kind, model, prompt, image_url, parameters, status, created_by, retry_of_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Generation>(&query)
            .bind(&input.kind)
            .bind(&input.model)
            .bind(&input.prompt)
            .bind(&input.image_url)
            .bind(&input.parameters)
            .bind(STATUS_PENDING)
            .bind(input.created_by)
            .bind(input.retry_of_id)
            .fetch_one(pool)
            .await
    }

    /// Find a generation by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Generation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM generations WHERE id = $1");
        sqlx::query_as::<_, Generation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List generations, newest first, with optional filters.
    pub async fn list(
        pool: &PgPool,
        params: &GenerationListQuery,
    ) -> Result<Vec<Generation>, sqlx::Error> {
        let limit = clamp_limit(params.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
        let offset = clamp_offset(params.offset);
        let query = format!(
            "SELECT {COLUMNS} FROM generations \
             WHERE ($1::TEXT IS NULL OR status = $1) \
               AND ($2::TEXT IS NULL OR kind = $2) \
               AND ($3::BIGINT IS NULL OR created_by = $3) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, Generation>(&query)
            .bind(&params.status)
            .bind(&params.kind)
            .bind(params.created_by)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// All records that were not finished: `pending` or `processing`.
    pub async fn list_in_flight(pool: &PgPool) -> Result<Vec<Generation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM generations \
             WHERE status IN ($1, $2) \
             ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, Generation>(&query)
            .bind(STATUS_PENDING)
            .bind(STATUS_PROCESSING)
            .fetch_all(pool)
            .await
    }

    /// Move a pending record to `processing` for a synchronous run. No
    /// request id is recorded, so the run cannot be resumed.
    pub async fn mark_running(pool: &PgPool, id: DbId) -> Result<Option<Generation>, sqlx::Error> {
        let query = format!(
            "UPDATE generations SET status = $2, submitted_at = NOW() \
             WHERE id = $1 AND status = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Generation>(&query)
            .bind(id)
            .bind(STATUS_PROCESSING)
            .bind(STATUS_PENDING)
            .fetch_optional(pool)
            .await
    }

    /// Move a pending record to `processing` with the remote request id.
    pub async fn mark_processing(
        pool: &PgPool,
        id: DbId,
        request_id: &str,
    ) -> Result<Option<Generation>, sqlx::Error> {
        let query = format!(
            "UPDATE generations \
             SET status = $2, request_id = $3, submitted_at = COALESCE(submitted_at, NOW()) \
             WHERE id = $1 AND status = $4 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Generation>(&query)
            .bind(id)
            .bind(STATUS_PROCESSING)
            .bind(request_id)
            .bind(STATUS_PENDING)
            .fetch_optional(pool)
            .await
    }

    /// Mark a non-terminal record as completed with the raw API result.
    pub async fn mark_completed(
        pool: &PgPool,
        id: DbId,
        result: &serde_json::Value,
    ) -> Result<Option<Generation>, sqlx::Error> {
        let query = mark_completed_query();
        sqlx::query_as::<_, Generation>(&query)
            .bind(id)
            .bind(STATUS_COMPLETED)
            .bind(result)
            .bind(STATUS_PENDING)
            .bind(STATUS_PROCESSING)
            .fetch_optional(pool)
            .await
    }

    /// Record the output files and mark the record completed in one
    /// transaction.
    ///
    /// Returns `None` and writes nothing when the record is already
    /// terminal or gone.
    pub async fn complete_with_files(
        pool: &PgPool,
        id: DbId,
        result: &serde_json::Value,
        files: &[CreateGenerationFile],
    ) -> Result<Option<(Generation, Vec<GenerationFile>)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = mark_completed_query();
        let Some(generation) = sqlx::query_as::<_, Generation>(&query)
            .bind(id)
            .bind(STATUS_COMPLETED)
            .bind(result)
            .bind(STATUS_PENDING)
            .bind(STATUS_PROCESSING)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let mut stored = Vec::with_capacity(files.len());
        for file in files {
            stored.push(GenerationFileRepo::create(&mut *tx, file).await?);
        }
        tx.commit().await?;
        Ok(Some((generation, stored)))
    }

    /// Mark a non-terminal record as failed with a message.
    pub async fn mark_failed(
        pool: &PgPool,
        id: DbId,
        error_message: &str,
    ) -> Result<Option<Generation>, sqlx::Error> {
        let query = format!(
            "UPDATE generations \
             SET status = $2, error_message = $3, completed_at = NOW() \
             WHERE id = $1 AND status IN ($4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Generation>(&query)
            .bind(id)
            .bind(STATUS_FAILED)
            .bind(error_message)
            .bind(STATUS_PENDING)
            .bind(STATUS_PROCESSING)
            .fetch_optional(pool)
            .await
    }

    /// Delete a finished generation (its files rows cascade).
    ///
    /// Records still in flight are left alone and `false` is returned.
    pub async fn delete_finished(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM generations WHERE id = $1 AND status IN ($2, $3)")
            .bind(id)
            .bind(STATUS_COMPLETED)
            .bind(STATUS_FAILED)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Guarded `completed` update shared by the plain and transactional paths.
fn mark_completed_query() -> String {
    format!(
        "UPDATE generations \
         SET status = $2, result = $3, error_message = NULL, completed_at = NOW() \
         WHERE id = $1 AND status IN ($4, $5) \
         RETURNING {COLUMNS}"
    )
}
