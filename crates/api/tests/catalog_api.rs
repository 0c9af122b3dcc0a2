//! HTTP-level tests for locations, products and templates.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete, get, post_json, put_json};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn location_crud_round_trip(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/api/v1/locations",
        json!({"name": "Downtown", "timezone": "Europe/Berlin"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["data"]["id"].as_i64().unwrap();
    assert_eq!(created["data"]["name"], "Downtown");
    assert_eq!(created["data"]["is_active"], true);

    let response = put_json(
        app.clone(),
        &format!("/api/v1/locations/{id}"),
        json!({"name": "Uptown"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["data"]["name"], "Uptown");
    assert_eq!(updated["data"]["timezone"], "Europe/Berlin");

    let response = get(app.clone(), "/api/v1/locations").await;
    let list = body_json(response).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);

    let response = delete(app.clone(), &format!("/api/v1/locations/{id}")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(app, &format!("/api/v1/locations/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn location_blank_name_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(app, "/api/v1/locations", json!({"name": "   "})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn inactive_locations_are_hidden_by_default(pool: PgPool) {
    let app = common::build_test_app(pool);
    post_json(app.clone(), "/api/v1/locations", json!({"name": "Open"})).await;
    post_json(
        app.clone(),
        "/api/v1/locations",
        json!({"name": "Closed", "is_active": false}),
    )
    .await;

    let list = body_json(get(app.clone(), "/api/v1/locations").await).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);

    let list = body_json(get(app, "/api/v1/locations?include_inactive=true").await).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn deleting_location_with_products_conflicts(pool: PgPool) {
    let app = common::build_test_app(pool);
    let location = body_json(
        post_json(app.clone(), "/api/v1/locations", json!({"name": "Cafe"})).await,
    )
    .await;
    let location_id = location["data"]["id"].as_i64().unwrap();
    post_json(
        app.clone(),
        "/api/v1/products",
        json!({"name": "Latte", "location_id": location_id, "price_cents": 450}),
    )
    .await;

    let response = delete(app, &format!("/api/v1/locations/{location_id}")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn product_defaults_and_update(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/api/v1/products",
        json!({"name": "Espresso", "price_cents": 250, "category": "coffee"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["data"]["id"].as_i64().unwrap();
    assert_eq!(created["data"]["currency"], "USD");
    assert_eq!(created["data"]["price_cents"], 250);

    let response = put_json(
        app.clone(),
        &format!("/api/v1/products/{id}"),
        json!({"price_cents": 300, "currency": "EUR"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["data"]["price_cents"], 300);
    assert_eq!(updated["data"]["currency"], "EUR");
    assert_eq!(updated["data"]["name"], "Espresso");

    let list = body_json(get(app, "/api/v1/products?category=coffee").await).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn product_pricing_is_validated(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/api/v1/products",
        json!({"name": "Refund", "price_cents": -5}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(
        app,
        "/api/v1/products",
        json!({"name": "Tea", "currency": "usd"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_product_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    assert_eq!(
        get(app.clone(), "/api/v1/products/999").await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        put_json(app.clone(), "/api/v1/products/999", json!({"name": "x"}))
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        delete(app, "/api/v1/products/999").await.status(),
        StatusCode::NOT_FOUND
    );
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn template_create_with_layout(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/api/v1/templates",
        json!({"name": "Menu board", "orientation": "portrait", "layout": {"columns": 2}}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["data"]["orientation"], "portrait");
    assert_eq!(created["data"]["layout"]["columns"], 2);

    let response = post_json(app, "/api/v1/templates", json!({"name": "Plain"})).await;
    let plain = body_json(response).await;
    assert_eq!(plain["data"]["orientation"], "landscape");
    assert_eq!(plain["data"]["layout"], json!({}));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn template_rejects_bad_orientation_and_layout(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/api/v1/templates",
        json!({"name": "Sideways", "orientation": "diagonal"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(
        app,
        "/api/v1/templates",
        json!({"name": "List", "layout": [1, 2, 3]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
