//! Product entity model and DTOs.

use serde::{Deserialize, Serialize};
use signage_core::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `products` table. Prices are in minor units.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: DbId,
    pub location_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price_cents: i64,
    pub currency: String,
    pub image_url: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new product.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProduct {
    pub location_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price_cents: Option<i64>,
    pub currency: Option<String>,
    pub image_url: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// DTO for updating an existing product. All fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProduct {
    pub location_id: Option<DbId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price_cents: Option<i64>,
    pub currency: Option<String>,
    pub image_url: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// Filters for listing products.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductListQuery {
    pub location_id: Option<DbId>,
    pub category: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
