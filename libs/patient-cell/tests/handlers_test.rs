// Router-level checks that never reach the database: the pool is lazy and every
// request here is rejected by authentication or validation first.

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use patient_cell::patient_routes;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn test_app() -> (Router, String) {
    let config = TestConfig::default();
    let pool = shared_database::connect_lazy(&config.to_app_config()).unwrap();
    let bearer = JwtTestUtils::bearer_header(&TestUser::default(), &config.jwt_secret);
    (patient_routes(config.to_arc(), pool), bearer)
}

fn json_request(method: Method, uri: &str, bearer: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(bearer) = bearer {
        builder = builder.header("Authorization", bearer);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn error_message(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    body["error"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn test_list_without_token_is_unauthorized() {
    let (app, _) = test_app();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let (app, _) = test_app();
    let config = TestConfig::default();
    let expired = JwtTestUtils::create_expired_token(&TestUser::default(), &config.jwt_secret);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header("Authorization", format!("Bearer {}", expired))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_message(response).await, "Token expired");
}

#[tokio::test]
async fn test_create_with_negative_age_is_bad_request() {
    let (app, bearer) = test_app();
    let body = json!({
        "cin": "AB123",
        "firstName": "Amina",
        "lastName": "Benali",
        "age": -3
    });

    let response = app
        .oneshot(json_request(Method::POST, "/", Some(&bearer), &body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(response).await, "age must not be negative");
}

#[tokio::test]
async fn test_create_with_missing_field_is_bad_request() {
    let (app, bearer) = test_app();
    let body = json!({ "cin": "AB123", "firstName": "Amina" });

    let response = app
        .oneshot(json_request(Method::POST, "/", Some(&bearer), &body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(error_message(response).await.contains("lastName"));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (app, bearer) = test_app();

    let response = app
        .oneshot(json_request(Method::PUT, "/AB123", Some(&bearer), "{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_update_is_bad_request() {
    let (app, bearer) = test_app();

    let response = app
        .oneshot(json_request(Method::PUT, "/AB123", Some(&bearer), "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(response).await, "No fields to update");
}
