//! Tests HTTP sobre un router reducido con las mismas convenciones de la API:
//! envelope {success, message, data}, Bearer token obligatorio en rutas
//! protegidas y errores de validación en JSON.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower::ServiceExt;
use validator::Validate;

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "car-rental-api",
    }))
}

#[derive(Deserialize, Validate)]
struct EchoRequest {
    #[validate(email)]
    email: String,
}

async fn echo(Json(request): Json<EchoRequest>) -> Response {
    if request.validate().is_err() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Validation Error",
                "message": "Invalid request data",
            })),
        )
            .into_response();
    }

    Json(json!({
        "success": true,
        "message": null,
        "data": { "email": request.email },
    }))
    .into_response()
}

async fn require_bearer(request: Request<Body>, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map_or(false, |h| h.starts_with("Bearer "));

    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "Unauthorized",
                "message": "Missing Authorization header",
            })),
        )
            .into_response();
    }

    next.run(request).await
}

fn test_app() -> Router {
    let protected = Router::new()
        .route("/me", get(|| async { Json(json!({ "success": true })) }))
        .route_layer(middleware::from_fn(require_bearer));

    Router::new()
        .route("/health", get(health))
        .route("/echo", post(echo))
        .merge(protected)
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "car-rental-api");
}

#[tokio::test]
async fn test_protected_route_rejects_missing_token() {
    let response = test_app()
        .oneshot(Request::builder().uri("/me").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn test_protected_route_accepts_bearer_token() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/me")
                .header(header::AUTHORIZATION, "Bearer some-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_validation_error_returns_bad_request() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "email": "not-an-email" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Validation Error");
}

#[tokio::test]
async fn test_valid_request_uses_response_envelope() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "email": "ayesha@example.com" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], "ayesha@example.com");
}
