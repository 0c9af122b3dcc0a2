//! Repository for the `static_assets` table.

use signage_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use signage_core::DbId;
use sqlx::PgPool;

use crate::models::static_asset::{CreateStaticAsset, StaticAsset};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, storage_key, content_type, size_bytes, width, height, sha256, \
    source_generation_id, created_by, created_at, updated_at";

/// Provides CRUD operations for static assets.
pub struct StaticAssetRepo;

impl StaticAssetRepo {
    /// Insert a new asset row. The file must already be in storage.
    pub async fn create(
        pool: &PgPool,
        input: &CreateStaticAsset,
    ) -> Result<StaticAsset, sqlx::Error> {
        let query = format!(
            "INSERT INTO static_assets \
                (name, storage_key, content_type, size_bytes, width, height, sha256, \
                 source_generation_id, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StaticAsset>(&query)
            .bind(input.name.trim())
            .bind(&input.storage_key)
            .bind(&input.content_type)
            .bind(input.size_bytes)
            .bind(input.width)
            .bind(input.height)
            .bind(&input.sha256)
            .bind(input.source_generation_id)
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    /// Find an asset by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<StaticAsset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM static_assets WHERE id = $1");
        sqlx::query_as::<_, StaticAsset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List assets, newest first.
    pub async fn list(
        pool: &PgPool,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<StaticAsset>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM static_assets \
             ORDER BY created_at DESC, id DESC \
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, StaticAsset>(&query)
            .bind(clamp_limit(limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT))
            .bind(clamp_offset(offset))
            .fetch_all(pool)
            .await
    }

    /// Rename an asset. Returns `None` if it does not exist.
    pub async fn rename(
        pool: &PgPool,
        id: DbId,
        name: &str,
    ) -> Result<Option<StaticAsset>, sqlx::Error> {
        let query = format!(
            "UPDATE static_assets SET name = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StaticAsset>(&query)
            .bind(id)
            .bind(name.trim())
            .fetch_optional(pool)
            .await
    }

    /// Whether any screen currently displays this asset.
    pub async fn is_in_use(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM screens WHERE static_asset_id = $1)",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Delete an asset row, returning it so the caller can remove the file.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<StaticAsset>, sqlx::Error> {
        let query = format!("DELETE FROM static_assets WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, StaticAsset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
