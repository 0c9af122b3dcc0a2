//! Repository for the `products` table.

use signage_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use signage_core::product::DEFAULT_CURRENCY;
use signage_core::DbId;
use sqlx::PgPool;

use crate::models::product::{CreateProduct, Product, ProductListQuery, UpdateProduct};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, location_id, name, description, category, price_cents, currency, \
    image_url, sort_order, is_active, created_at, updated_at";

/// Provides CRUD operations for products.
pub struct ProductRepo;

impl ProductRepo {
    /// Insert a new product, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateProduct) -> Result<Product, sqlx::Error> {
        let query = format!(
            "INSERT INTO products \
                (location_id, name, description, category, price_cents, currency, \
                 image_url, sort_order, is_active) \
             VALUES ($1, $2, $3, $4, COALESCE($5, 0), $6, $7, COALESCE($8, 0), COALESCE($9, true)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(input.location_id)
            .bind(input.name.trim())
            .bind(&input.description)
            .bind(&input.category)
            .bind(input.price_cents)
            .bind(input.currency.as_deref().unwrap_or(DEFAULT_CURRENCY))
            .bind(&input.image_url)
            .bind(input.sort_order)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    /// Find a product by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE id = $1");
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List products with optional location / category filters.
    ///
    /// Ordered by sort_order, then name.
    pub async fn list(pool: &PgPool, params: &ProductListQuery) -> Result<Vec<Product>, sqlx::Error> {
        let limit = clamp_limit(params.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
        let offset = clamp_offset(params.offset);
        let query = format!(
            "SELECT {COLUMNS} FROM products \
             WHERE ($1::BIGINT IS NULL OR location_id = $1) \
               AND ($2::TEXT IS NULL OR category = $2) \
               AND ($3 OR is_active = true) \
             ORDER BY sort_order, name, id \
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(params.location_id)
            .bind(&params.category)
            .bind(params.include_inactive)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Fetch the given products, preserving the order of `ids`.
    ///
    /// Ids with no matching row are skipped.
    pub async fn list_by_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<Product>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {COLUMNS} FROM products \
             WHERE id = ANY($1) \
             ORDER BY array_position($1, id)"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Return the subset of `ids` that do not exist.
    pub async fn missing_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<DbId>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_scalar::<_, DbId>(
            "SELECT requested.id FROM UNNEST($1::BIGINT[]) AS requested(id) \
             WHERE NOT EXISTS (SELECT 1 FROM products p WHERE p.id = requested.id)",
        )
        .bind(ids)
        .fetch_all(pool)
        .await
    }

    /// Update a product. Only non-`None` fields are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProduct,
    ) -> Result<Option<Product>, sqlx::Error> {
        let query = format!(
            "UPDATE products SET \
                location_id = COALESCE($2, location_id), \
                name = COALESCE($3, name), \
                description = COALESCE($4, description), \
                category = COALESCE($5, category), \
                price_cents = COALESCE($6, price_cents), \
                currency = COALESCE($7, currency), \
                image_url = COALESCE($8, image_url), \
                sort_order = COALESCE($9, sort_order), \
                is_active = COALESCE($10, is_active) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(input.location_id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(&input.description)
            .bind(&input.category)
            .bind(input.price_cents)
            .bind(&input.currency)
            .bind(&input.image_url)
            .bind(input.sort_order)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Delete a product. It is removed from every screen's product list
    /// via `ON DELETE CASCADE` on `screen_products`.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
