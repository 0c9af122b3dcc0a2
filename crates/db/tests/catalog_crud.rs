//! Repository tests for locations, products, templates and static assets.

use assert_matches::assert_matches;
use serde_json::json;
use signage_db::models::location::{CreateLocation, UpdateLocation};
use signage_db::models::product::{CreateProduct, ProductListQuery, UpdateProduct};
use signage_db::models::static_asset::CreateStaticAsset;
use signage_db::models::template::{CreateTemplate, UpdateTemplate};
use signage_db::repositories::{LocationRepo, ProductRepo, StaticAssetRepo, TemplateRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_location(name: &str) -> CreateLocation {
    CreateLocation {
        name: name.to_string(),
        address: None,
        timezone: None,
        description: None,
        is_active: None,
    }
}

fn new_product(name: &str, location_id: Option<i64>) -> CreateProduct {
    CreateProduct {
        location_id,
        name: name.to_string(),
        description: None,
        category: None,
        price_cents: Some(500),
        currency: None,
        image_url: None,
        sort_order: None,
        is_active: None,
    }
}

fn new_asset(key: &str) -> CreateStaticAsset {
    CreateStaticAsset {
        name: "Poster".to_string(),
        storage_key: key.to_string(),
        content_type: "image/png".to_string(),
        size_bytes: 42,
        width: Some(10),
        height: Some(20),
        sha256: "ab".repeat(32),
        source_generation_id: None,
        created_by: 1,
    }
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_location_update_keeps_unset_fields(pool: PgPool) {
    let mut input = new_location("  Harbor  ");
    input.address = Some("1 Pier Rd".into());
    let location = LocationRepo::create(&pool, &input).await.unwrap();
    assert_eq!(location.name, "Harbor");
    assert!(location.is_active);

    let updated = LocationRepo::update(
        &pool,
        location.id,
        &UpdateLocation {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.address.as_deref(), Some("1 Pier Rd"));
    assert!(!updated.is_active);
    assert!(updated.updated_at >= location.updated_at);

    assert!(LocationRepo::list(&pool, false).await.unwrap().is_empty());
    assert_eq!(LocationRepo::list(&pool, true).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_location_with_products_cannot_be_deleted(pool: PgPool) {
    let location = LocationRepo::create(&pool, &new_location("Mall")).await.unwrap();
    ProductRepo::create(&pool, &new_product("Bagel", Some(location.id)))
        .await
        .unwrap();

    let err = LocationRepo::delete(&pool, location.id).await.unwrap_err();
    assert_matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_missing_location_returns_none(pool: PgPool) {
    let result = LocationRepo::update(&pool, 9999, &UpdateLocation::default())
        .await
        .unwrap();
    assert!(result.is_none());
    assert!(!LocationRepo::delete(&pool, 9999).await.unwrap());
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_product_list_filters(pool: PgPool) {
    let location = LocationRepo::create(&pool, &new_location("Cafe")).await.unwrap();
    let mut coffee = new_product("Mocha", Some(location.id));
    coffee.category = Some("coffee".into());
    ProductRepo::create(&pool, &coffee).await.unwrap();
    ProductRepo::create(&pool, &new_product("Scone", None))
        .await
        .unwrap();
    let mut hidden = new_product("Old", Some(location.id));
    hidden.is_active = Some(false);
    ProductRepo::create(&pool, &hidden).await.unwrap();

    let by_location = ProductRepo::list(
        &pool,
        &ProductListQuery {
            location_id: Some(location.id),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(by_location.len(), 1);
    assert_eq!(by_location[0].name, "Mocha");

    let all = ProductRepo::list(
        &pool,
        &ProductListQuery {
            include_inactive: true,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(all.len(), 3);

    let paged = ProductRepo::list(
        &pool,
        &ProductListQuery {
            include_inactive: true,
            limit: Some(2),
            offset: Some(2),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(paged.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_product_lookup_by_ids(pool: PgPool) {
    let a = ProductRepo::create(&pool, &new_product("A", None)).await.unwrap();
    let b = ProductRepo::create(&pool, &new_product("B", None)).await.unwrap();

    let ordered = ProductRepo::list_by_ids(&pool, &[b.id, a.id]).await.unwrap();
    let names: Vec<_> = ordered.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["B", "A"]);

    let missing = ProductRepo::missing_ids(&pool, &[a.id, 777, b.id, 888])
        .await
        .unwrap();
    assert_eq!(missing, vec![777, 888]);
    assert!(ProductRepo::missing_ids(&pool, &[]).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_product_price_check_constraint(pool: PgPool) {
    let product = ProductRepo::create(&pool, &new_product("Soup", None))
        .await
        .unwrap();
    assert_eq!(product.currency, "USD");

    let err = ProductRepo::update(
        &pool,
        product.id,
        &UpdateProduct {
            price_cents: Some(-1),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23514"));
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_template_layout_round_trip(pool: PgPool) {
    let template = TemplateRepo::create(
        &pool,
        &CreateTemplate {
            name: "Grid".into(),
            description: None,
            orientation: None,
            layout: Some(json!({"columns": 4, "show_prices": true})),
            is_active: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(template.orientation, "landscape");
    assert_eq!(template.layout["columns"], 4);

    let updated = TemplateRepo::update(
        &pool,
        template.id,
        &UpdateTemplate {
            orientation: Some("portrait".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.orientation, "portrait");
    assert_eq!(updated.layout, template.layout);
}

// ---------------------------------------------------------------------------
// Static assets
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_static_asset_rename_and_delete(pool: PgPool) {
    let asset = StaticAssetRepo::create(&pool, &new_asset("static-assets/a.png"))
        .await
        .unwrap();

    let renamed = StaticAssetRepo::rename(&pool, asset.id, " Menu ")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(renamed.name, "Menu");
    assert_eq!(renamed.storage_key, asset.storage_key);
    assert!(!StaticAssetRepo::is_in_use(&pool, asset.id).await.unwrap());

    let deleted = StaticAssetRepo::delete(&pool, asset.id).await.unwrap().unwrap();
    assert_eq!(deleted.storage_key, "static-assets/a.png");
    assert!(StaticAssetRepo::find_by_id(&pool, asset.id)
        .await
        .unwrap()
        .is_none());
    assert!(StaticAssetRepo::delete(&pool, asset.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_static_asset_storage_key_is_unique(pool: PgPool) {
    StaticAssetRepo::create(&pool, &new_asset("static-assets/dup.png"))
        .await
        .unwrap();
    let err = StaticAssetRepo::create(&pool, &new_asset("static-assets/dup.png"))
        .await
        .unwrap_err();
    assert_matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"));
}
