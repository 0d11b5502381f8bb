//! Middleware behaviour on a small router

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware,
    routing::{get, post},
    Router,
};
use chirp_auth::{
    auth::{require_access_token, require_api_key, AuthContext},
    middleware::{count_requests, request_tracking_middleware, AppState},
    models::auth::LoginRequest,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

mod common;
use common::{create_test_app, register_user, API_KEY};

fn router(state: &AppState) -> Router {
    let protected = Router::new()
        .route(
            "/api/me",
            get(|ctx: AuthContext| async move { ctx.user_id.to_string() }),
        )
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            require_access_token,
        ));

    let webhooks = Router::new()
        .route("/api/webhooks", post(|| async { StatusCode::NO_CONTENT }))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            require_api_key,
        ));

    Router::new()
        .merge(protected)
        .merge(webhooks)
        .layer(middleware::from_fn_with_state(
            state.request_counter.clone(),
            count_requests,
        ))
        .layer(middleware::from_fn(request_tracking_middleware))
}

fn request(method: &str, uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_protected_route_with_valid_token() {
    let app = create_test_app();
    let user_id = register_user(&app, "walt@breakingbad.com", "04234").await;
    let login = app
        .state
        .auth_service
        .login(LoginRequest {
            email: "walt@breakingbad.com".to_string(),
            password: "04234".to_string(),
        })
        .await
        .unwrap();

    let response = router(&app.state)
        .oneshot(request(
            "GET",
            "/api/me",
            Some(&format!("Bearer {}", login.access_token)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes, user_id.to_string().as_bytes());
}

#[tokio::test]
async fn test_protected_route_without_header_is_bad_request() {
    let app = create_test_app();

    let response = router(&app.state)
        .oneshot(request("GET", "/api/me", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], 400);
}

#[tokio::test]
async fn test_protected_route_with_foreign_token_is_unauthorized() {
    let app = create_test_app();
    let foreign = chirp_auth::auth::issue_access_token(
        uuid::Uuid::new_v4(),
        "some-other-services-secret-32-chars!!",
        chrono::Duration::hours(1),
    )
    .unwrap();

    let response = router(&app.state)
        .oneshot(request(
            "GET",
            "/api/me",
            Some(&format!("Bearer {}", foreign)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"]["message"], "Unauthorized");
}

#[tokio::test]
async fn test_webhook_requires_api_key() {
    let app = create_test_app();
    let router = router(&app.state);

    let ok = router
        .clone()
        .oneshot(request(
            "POST",
            "/api/webhooks",
            Some(&format!("ApiKey {}", API_KEY)),
        ))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::NO_CONTENT);

    let wrong = router
        .clone()
        .oneshot(request("POST", "/api/webhooks", Some("ApiKey nope")))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let missing = router
        .oneshot(request("POST", "/api/webhooks", None))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_requests_are_counted_and_reset() {
    let app = create_test_app();
    let router = router(&app.state);

    for _ in 0..3 {
        router
            .clone()
            .oneshot(request("GET", "/api/me", None))
            .await
            .unwrap();
    }

    assert_eq!(app.state.request_counter.get(), 3);
    assert_eq!(app.state.request_counter.reset(), 3);
    assert_eq!(app.state.request_counter.get(), 0);
}
