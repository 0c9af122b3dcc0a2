//! Repository for the `templates` table.

use signage_core::DbId;
use sqlx::PgPool;

use crate::models::template::{CreateTemplate, Template, UpdateTemplate, ORIENTATION_LANDSCAPE};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, name, description, orientation, layout, is_active, created_at, updated_at";

/// Provides CRUD operations for screen templates.
pub struct TemplateRepo;

impl TemplateRepo {
    /// Insert a new template, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateTemplate) -> Result<Template, sqlx::Error> {
        let query = format!(
            "INSERT INTO templates (name, description, orientation, layout, is_active) \
             VALUES ($1, $2, $3, COALESCE($4, '{{}}'::jsonb), COALESCE($5, true)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Template>(&query)
            .bind(input.name.trim())
            .bind(&input.description)
            .bind(input.orientation.as_deref().unwrap_or(ORIENTATION_LANDSCAPE))
            .bind(&input.layout)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    /// Find a template by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Template>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM templates WHERE id = $1");
        sqlx::query_as::<_, Template>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List templates ordered by name, optionally including inactive ones.
    pub async fn list(pool: &PgPool, include_inactive: bool) -> Result<Vec<Template>, sqlx::Error> {
        let query = if include_inactive {
            format!("SELECT {COLUMNS} FROM templates ORDER BY name")
        } else {
            format!("SELECT {COLUMNS} FROM templates WHERE is_active = true ORDER BY name")
        };
        sqlx::query_as::<_, Template>(&query).fetch_all(pool).await
    }

    /// Update a template. Only non-`None` fields are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTemplate,
    ) -> Result<Option<Template>, sqlx::Error> {
        let query = format!(
            "UPDATE templates SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                orientation = COALESCE($4, orientation), \
                layout = COALESCE($5, layout), \
                is_active = COALESCE($6, is_active) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Template>(&query)
            .bind(id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(&input.description)
            .bind(&input.orientation)
            .bind(&input.layout)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Delete a template. Fails with a foreign-key violation while a screen
    /// uses it.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM templates WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
