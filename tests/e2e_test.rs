use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{DateTime, Duration, Utc};
use http_body_util::BodyExt;
use library_lending::api::{handlers::AppState, router::create_router};
use library_lending::domain::NotificationKind;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

mod common;

use common::{TestContext, seed_book, seed_member, setup};

// ============================================================================
// E2Eテスト用のヘルパー関数
// ============================================================================

/// インメモリアダプタの上に実際のAPIルーターを組み立てる
fn build_app(ctx: &TestContext) -> Router {
    let app_state = Arc::new(AppState {
        service_deps: ctx.deps.clone(),
    });
    create_router(app_state)
}

/// JSONボディつきのPOSTリクエストを送る
async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// GETリクエストを送る
async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

// ============================================================================
// E2Eテスト: 正常系フロー
// ============================================================================

#[tokio::test]
async fn test_e2e_full_loan_flow() {
    let mut ctx = setup();
    let app = build_app(&ctx);

    // Book(total=1, available=1)
    let book_id = seed_book(&ctx, "Spring Snow", 1);
    let member_a = seed_member(&ctx, "Aiko", "aiko@example.com");
    let member_b = seed_member(&ctx, "Botan", "botan@example.com");

    // 1. 貸出成功 → available=0
    let (status, created) = post_json(
        &app,
        &format!("/books/{}/loan", book_id.value()),
        json!({ "member_id": member_a.value(), "duration_days": 14 }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["book_id"], json!(book_id.value().to_string()));
    assert_eq!(created["member_id"], json!(member_a.value().to_string()));
    assert_eq!(ctx.loan_store.available_copies(book_id), Some(0));

    // loan_created通知が会員の宛先と書籍タイトルつきで積まれている
    let requests = ctx.drain_notifications();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].kind, NotificationKind::LoanCreated);
    assert_eq!(requests[0].recipient, "aiko@example.com");
    assert!(requests[0].body.contains("Spring Snow"));

    // 2. 同じ書籍への2件目の貸出は在庫切れ
    let (status, error) = post_json(
        &app,
        &format!("/books/{}/loan", book_id.value()),
        json!({ "member_id": member_b.value() }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["error"], json!("OUT_OF_STOCK"));

    // 3. 返却成功 → available=1、貸出はreturnedになる
    let (status, returned) = post_json(
        &app,
        &format!("/books/{}/return", book_id.value()),
        json!({ "member_id": member_a.value() }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ctx.loan_store.available_copies(book_id), Some(1));

    let loan_id = returned["loan_id"].as_str().unwrap();
    let (status, loan) = get(&app, &format!("/loans/{loan_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loan["status"], json!("returned"));
    assert!(!loan["returned_at"].is_null());
}

#[tokio::test]
async fn test_e2e_extend_due_date_flow() {
    let ctx = setup();
    let app = build_app(&ctx);

    let book_id = seed_book(&ctx, "Runaway Horses", 1);
    let member_id = seed_member(&ctx, "Aiko", "aiko@example.com");

    let (status, created) = post_json(
        &app,
        &format!("/books/{}/loan", book_id.value()),
        json!({ "member_id": member_id.value() }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let loan_id = created["loan_id"].as_str().unwrap().to_string();
    let due_date: DateTime<Utc> =
        serde_json::from_value(created["due_date"].clone()).unwrap();

    // 7日間の延長
    let (status, extended) = post_json(
        &app,
        &format!("/loans/{loan_id}/extend"),
        json!({ "additional_days": 7 }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let new_due_date: DateTime<Utc> =
        serde_json::from_value(extended["new_due_date"].clone()).unwrap();
    assert_eq!(new_due_date, due_date + Duration::days(7));

    // 返却後の延長は拒否される
    post_json(
        &app,
        &format!("/books/{}/return", book_id.value()),
        json!({ "member_id": member_id.value() }),
    )
    .await;

    let (status, error) = post_json(
        &app,
        &format!("/loans/{loan_id}/extend"),
        json!({ "additional_days": 7 }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["error"], json!("ALREADY_RETURNED"));
}

// ============================================================================
// E2Eテスト: エラー応答
// ============================================================================

#[tokio::test]
async fn test_e2e_loan_fails_for_unknown_member() {
    let ctx = setup();
    let app = build_app(&ctx);
    let book_id = seed_book(&ctx, "Spring Snow", 1);

    let (status, error) = post_json(
        &app,
        &format!("/books/{}/loan", book_id.value()),
        json!({ "member_id": Uuid::new_v4() }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["error"], json!("MEMBER_NOT_FOUND"));
}

#[tokio::test]
async fn test_e2e_extend_rejects_non_positive_days() {
    let ctx = setup();
    let app = build_app(&ctx);

    let book_id = seed_book(&ctx, "Spring Snow", 1);
    let member_id = seed_member(&ctx, "Aiko", "aiko@example.com");

    let (_, created) = post_json(
        &app,
        &format!("/books/{}/loan", book_id.value()),
        json!({ "member_id": member_id.value() }),
    )
    .await;
    let loan_id = created["loan_id"].as_str().unwrap().to_string();

    let (status, error) = post_json(
        &app,
        &format!("/loans/{loan_id}/extend"),
        json!({ "additional_days": 0 }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["error"], json!("INVALID_DAYS"));
}

#[tokio::test]
async fn test_e2e_return_without_active_loan() {
    let ctx = setup();
    let app = build_app(&ctx);

    let book_id = seed_book(&ctx, "Spring Snow", 1);
    let member_id = seed_member(&ctx, "Aiko", "aiko@example.com");

    let (status, error) = post_json(
        &app,
        &format!("/books/{}/return", book_id.value()),
        json!({ "member_id": member_id.value() }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["error"], json!("NO_ACTIVE_LOAN"));
}

#[tokio::test]
async fn test_e2e_get_missing_loan_returns_404() {
    let ctx = setup();
    let app = build_app(&ctx);

    let (status, _) = get(&app, &format!("/loans/{}", Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_e2e_health_check() {
    let ctx = setup();
    let app = build_app(&ctx);

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"OK");
}
