//! Repository tests for screens and their ordered product lists.

use assert_matches::assert_matches;
use serde_json::json;
use signage_core::screen::{ScreenConfig, ScreenMode};
use signage_db::models::product::CreateProduct;
use signage_db::models::screen::{ScreenChanges, ScreenListQuery};
use signage_db::models::static_asset::CreateStaticAsset;
use signage_db::models::template::CreateTemplate;
use signage_db::repositories::{ProductRepo, ScreenRepo, StaticAssetRepo, TemplateRepo};
use sqlx::PgPool;

async fn template(pool: &PgPool) -> i64 {
    TemplateRepo::create(
        pool,
        &CreateTemplate {
            name: "Menu".into(),
            description: None,
            orientation: None,
            layout: Some(json!({})),
            is_active: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn product(pool: &PgPool, name: &str) -> i64 {
    ProductRepo::create(
        pool,
        &CreateProduct {
            location_id: None,
            name: name.into(),
            description: None,
            category: None,
            price_cents: None,
            currency: None,
            image_url: None,
            sort_order: None,
            is_active: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn asset(pool: &PgPool) -> i64 {
    StaticAssetRepo::create(
        pool,
        &CreateStaticAsset {
            name: "Poster".into(),
            storage_key: format!("static-assets/{}.png", next_key()),
            content_type: "image/png".into(),
            size_bytes: 1,
            width: None,
            height: None,
            sha256: "00".repeat(32),
            source_generation_id: None,
            created_by: 1,
        },
    )
    .await
    .unwrap()
    .id
}

fn next_key() -> String {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    format!("asset-{}", NEXT.fetch_add(1, Ordering::SeqCst))
}

fn dynamic(template_id: i64, product_ids: Vec<i64>) -> ScreenConfig {
    ScreenConfig {
        mode: ScreenMode::Dynamic,
        template_id: Some(template_id),
        static_asset_id: None,
        product_ids,
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_product_order_is_preserved(pool: PgPool) {
    let template_id = template(&pool).await;
    let a = product(&pool, "A").await;
    let b = product(&pool, "B").await;
    let c = product(&pool, "C").await;

    let screen = ScreenRepo::create(&pool, None, "Lobby", &dynamic(template_id, vec![c, a, b]), None)
        .await
        .unwrap();
    assert_eq!(screen.product_ids, vec![c, a, b]);
    assert!(screen.screen.is_active);

    let found = ScreenRepo::find_by_id(&pool, screen.screen.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.product_ids, vec![c, a, b]);

    let changes = ScreenChanges {
        location_id: None,
        name: None,
        is_active: None,
        config: dynamic(template_id, vec![b, c]),
    };
    let updated = ScreenRepo::update(&pool, screen.screen.id, &changes)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.product_ids, vec![b, c]);
    assert_eq!(
        ScreenRepo::product_ids(&pool, screen.screen.id).await.unwrap(),
        vec![b, c]
    );
    assert_eq!(updated.screen.name, "Lobby");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_switch_to_static_clears_products(pool: PgPool) {
    let template_id = template(&pool).await;
    let asset_id = asset(&pool).await;
    let a = product(&pool, "A").await;
    let screen = ScreenRepo::create(&pool, None, "Window", &dynamic(template_id, vec![a]), None)
        .await
        .unwrap();

    let changes = ScreenChanges {
        location_id: None,
        name: Some("Front window".into()),
        is_active: Some(false),
        config: ScreenConfig {
            mode: ScreenMode::Static,
            template_id: None,
            static_asset_id: Some(asset_id),
            product_ids: vec![],
        },
    };
    let updated = ScreenRepo::update(&pool, screen.screen.id, &changes)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.screen.mode, "static");
    assert_eq!(updated.screen.template_id, None);
    assert_eq!(updated.screen.static_asset_id, Some(asset_id));
    assert!(!updated.screen.is_active);
    assert!(updated.product_ids.is_empty());
    assert!(StaticAssetRepo::is_in_use(&pool, asset_id).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_mode_check_constraint(pool: PgPool) {
    let config = ScreenConfig {
        mode: ScreenMode::Static,
        template_id: None,
        static_asset_id: None,
        product_ids: vec![],
    };
    let err = ScreenRepo::create(&pool, None, "Broken", &config, None)
        .await
        .unwrap_err();
    assert_matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23514"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_dependency_lookups(pool: PgPool) {
    let t1 = template(&pool).await;
    let t2 = template(&pool).await;
    let a = product(&pool, "A").await;
    let b = product(&pool, "B").await;

    let s1 = ScreenRepo::create(&pool, None, "One", &dynamic(t1, vec![a]), None)
        .await
        .unwrap();
    let s2 = ScreenRepo::create(&pool, None, "Two", &dynamic(t2, vec![a, b]), None)
        .await
        .unwrap();

    assert_eq!(
        ScreenRepo::ids_using_template(&pool, t1).await.unwrap(),
        vec![s1.screen.id]
    );
    assert_eq!(
        ScreenRepo::ids_showing_product(&pool, a).await.unwrap(),
        vec![s1.screen.id, s2.screen.id]
    );
    assert_eq!(
        ScreenRepo::ids_showing_product(&pool, b).await.unwrap(),
        vec![s2.screen.id]
    );

    // Deleting a product cascades out of screen lists.
    assert!(ProductRepo::delete(&pool, a).await.unwrap());
    assert_eq!(
        ScreenRepo::product_ids(&pool, s2.screen.id).await.unwrap(),
        vec![b]
    );

    // A template in use cannot be deleted.
    let err = TemplateRepo::delete(&pool, t1).await.unwrap_err();
    assert_matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_filters_by_mode(pool: PgPool) {
    let template_id = template(&pool).await;
    let asset_id = asset(&pool).await;
    ScreenRepo::create(&pool, None, "B dynamic", &dynamic(template_id, vec![]), None)
        .await
        .unwrap();
    ScreenRepo::create(
        &pool,
        None,
        "A static",
        &ScreenConfig {
            mode: ScreenMode::Static,
            template_id: None,
            static_asset_id: Some(asset_id),
            product_ids: vec![],
        },
        None,
    )
    .await
    .unwrap();

    let all = ScreenRepo::list(&pool, &ScreenListQuery::default())
        .await
        .unwrap();
    let names: Vec<_> = all.iter().map(|s| s.screen.name.as_str()).collect();
    assert_eq!(names, vec!["A static", "B dynamic"]);

    let dynamic_only = ScreenRepo::list(
        &pool,
        &ScreenListQuery {
            location_id: None,
            mode: Some("dynamic".into()),
        },
    )
    .await
    .unwrap();
    assert_eq!(dynamic_only.len(), 1);
    assert_eq!(dynamic_only[0].screen.name, "B dynamic");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_screen(pool: PgPool) {
    let template_id = template(&pool).await;
    let a = product(&pool, "A").await;
    let screen = ScreenRepo::create(&pool, None, "Gone", &dynamic(template_id, vec![a]), None)
        .await
        .unwrap();

    assert!(ScreenRepo::delete(&pool, screen.screen.id).await.unwrap());
    assert!(!ScreenRepo::delete(&pool, screen.screen.id).await.unwrap());
    assert!(ScreenRepo::ids_showing_product(&pool, a).await.unwrap().is_empty());
}
