//! Repository for the `screens` table and its ordered `screen_products`.
//!
//! Writes touching both tables run in one transaction so a screen is never
//! observed with a half-replaced product list.

use signage_core::screen::ScreenConfig;
use signage_core::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::screen::{Screen, ScreenChanges, ScreenListQuery, ScreenWithProducts};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, location_id, name, mode, template_id, static_asset_id, is_active, \
    created_at, updated_at";

/// Provides CRUD operations for screens.
pub struct ScreenRepo;

impl ScreenRepo {
    /// Insert a screen and its product list.
    pub async fn create(
        pool: &PgPool,
        location_id: Option<DbId>,
        name: &str,
        config: &ScreenConfig,
        is_active: Option<bool>,
    ) -> Result<ScreenWithProducts, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO screens (location_id, name, mode, template_id, static_asset_id, is_active) \
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, true)) \
             RETURNING {COLUMNS}"
        );
        let screen = sqlx::query_as::<_, Screen>(&query)
            .bind(location_id)
            .bind(name.trim())
            .bind(config.mode.as_str())
            .bind(config.template_id)
            .bind(config.static_asset_id)
            .bind(is_active)
            .fetch_one(&mut *tx)
            .await?;

        replace_products(&mut tx, screen.id, &config.product_ids).await?;
        tx.commit().await?;

        Ok(ScreenWithProducts {
            screen,
            product_ids: config.product_ids.clone(),
        })
    }

    /// Find a screen (with product ids) by its internal ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ScreenWithProducts>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM screens WHERE id = $1");
        let Some(screen) = sqlx::query_as::<_, Screen>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
        else {
            return Ok(None);
        };
        let product_ids = Self::product_ids(pool, id).await?;
        Ok(Some(ScreenWithProducts {
            screen,
            product_ids,
        }))
    }

    /// List screens ordered by name, with optional location / mode filters.
    pub async fn list(
        pool: &PgPool,
        params: &ScreenListQuery,
    ) -> Result<Vec<ScreenWithProducts>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM screens \
             WHERE ($1::BIGINT IS NULL OR location_id = $1) \
               AND ($2::TEXT IS NULL OR mode = $2) \
             ORDER BY name, id"
        );
        let screens = sqlx::query_as::<_, Screen>(&query)
            .bind(params.location_id)
            .bind(&params.mode)
            .fetch_all(pool)
            .await?;

        let ids: Vec<DbId> = screens.iter().map(|s| s.id).collect();
        let links: Vec<(DbId, DbId)> = sqlx::query_as(
            "SELECT screen_id, product_id FROM screen_products \
             WHERE screen_id = ANY($1) ORDER BY screen_id, position",
        )
        .bind(&ids)
        .fetch_all(pool)
        .await?;

        Ok(screens
            .into_iter()
            .map(|screen| {
                let product_ids = links
                    .iter()
                    .filter(|(screen_id, _)| *screen_id == screen.id)
                    .map(|(_, product_id)| *product_id)
                    .collect();
                ScreenWithProducts {
                    screen,
                    product_ids,
                }
            })
            .collect())
    }

    /// Ordered product ids of a screen.
    pub async fn product_ids(pool: &PgPool, screen_id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT product_id FROM screen_products WHERE screen_id = $1 ORDER BY position",
        )
        .bind(screen_id)
        .fetch_all(pool)
        .await
    }

    /// Apply resolved changes: plain fields are COALESCE-patched, the
    /// mode configuration and product list are written as given.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        changes: &ScreenChanges,
    ) -> Result<Option<ScreenWithProducts>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE screens SET \
                location_id = COALESCE($2, location_id), \
                name = COALESCE($3, name), \
                is_active = COALESCE($4, is_active), \
                mode = $5, \
                template_id = $6, \
                static_asset_id = $7 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let Some(screen) = sqlx::query_as::<_, Screen>(&query)
            .bind(id)
            .bind(changes.location_id)
            .bind(changes.name.as_deref().map(str::trim))
            .bind(changes.is_active)
            .bind(changes.config.mode.as_str())
            .bind(changes.config.template_id)
            .bind(changes.config.static_asset_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        replace_products(&mut tx, id, &changes.config.product_ids).await?;
        tx.commit().await?;

        Ok(Some(ScreenWithProducts {
            screen,
            product_ids: changes.config.product_ids.clone(),
        }))
    }

    /// Ids of screens whose dynamic layout uses `template_id`.
    pub async fn ids_using_template(
        pool: &PgPool,
        template_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>("SELECT id FROM screens WHERE template_id = $1 ORDER BY id")
            .bind(template_id)
            .fetch_all(pool)
            .await
    }

    /// Ids of screens whose product list contains `product_id`.
    pub async fn ids_showing_product(
        pool: &PgPool,
        product_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT screen_id FROM screen_products WHERE product_id = $1 ORDER BY screen_id",
        )
        .bind(product_id)
        .fetch_all(pool)
        .await
    }

    /// Delete a screen; its product links cascade.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM screens WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Replace the ordered product list of a screen inside `tx`.
async fn replace_products(
    tx: &mut Transaction<'_, Postgres>,
    screen_id: DbId,
    product_ids: &[DbId],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM screen_products WHERE screen_id = $1")
        .bind(screen_id)
        .execute(&mut **tx)
        .await?;

    if product_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        "INSERT INTO screen_products (screen_id, product_id, position) \
         SELECT $1, product_id, (ordinality - 1)::INTEGER \
         FROM UNNEST($2::BIGINT[]) WITH ORDINALITY AS t(product_id, ordinality)",
    )
    .bind(screen_id)
    .bind(product_ids)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
