// crates/backend-lib/tests/auth_flow.rs
//! End-to-end flows over the real router and a real (in-memory) store.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

use spendtrack_backend_lib::{
    config::{Settings, SigningSecret},
    router::create_router,
    store::SqliteStore,
    AppState,
};

fn test_settings() -> Settings {
    Settings {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        database_path: PathBuf::from(":memory:"),
        log_level: "debug".to_string(),
        token_ttl_secs: 3600,
        signing_secret: SigningSecret::new("integration-test-secret"),
    }
}

fn test_app() -> Router {
    let store = SqliteStore::open_in_memory().unwrap();
    let state = Arc::new(AppState::new(store, test_settings()));
    create_router(state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(uri: &str, method: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authed_request(uri: &str, method: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn register(app: &Router, username: &str, password: &str, budget: f64) -> StatusCode {
    let response = app
        .clone()
        .oneshot(json_request(
            "/api/auth/register",
            "POST",
            serde_json::json!({
                "username": username,
                "password": password,
                "budget": budget,
            }),
        ))
        .await
        .unwrap();
    response.status()
}

fn login_request(username: &str, password: &str, peer: SocketAddr) -> Request<Body> {
    Request::builder()
        .uri("/api/auth/token")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .extension(ConnectInfo(peer))
        .body(Body::from(format!("username={username}&password={password}")))
        .unwrap()
}

async fn login(app: &Router, username: &str, password: &str) -> (StatusCode, Option<String>) {
    let peer: SocketAddr = "198.51.100.1:40000".parse().unwrap();
    let response = app
        .clone()
        .oneshot(login_request(username, password, peer))
        .await
        .unwrap();
    let status = response.status();
    if status != StatusCode::OK {
        return (status, None);
    }
    let json = body_json(response).await;
    assert_eq!(json["token_type"], "bearer");
    let token = json["access_token"].as_str().unwrap().to_string();
    (status, Some(token))
}

#[tokio::test]
async fn test_register_login_and_me() {
    let app = test_app();

    assert_eq!(register(&app, "bob", "secret", 0.0).await, StatusCode::OK);

    // Duplicate registration collides
    assert_eq!(
        register(&app, "bob", "other", 50.0).await,
        StatusCode::CONFLICT
    );

    // Wrong password and unknown user both come back 401 with the same shape
    let (wrong_pw, _) = login(&app, "bob", "wrong").await;
    let (unknown, _) = login(&app, "nobody", "wrong").await;
    assert_eq!(wrong_pw, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, StatusCode::UNAUTHORIZED);

    let (status, token) = login(&app, "bob", "secret").await;
    assert_eq!(status, StatusCode::OK);
    let token = token.unwrap();

    let response = app
        .clone()
        .oneshot(authed_request("/api/auth/users/me", "GET", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let me = body_json(response).await;
    assert_eq!(me["username"], "bob");
    assert_eq!(me["budget"], 0.0);
    // The password hash never appears in the identity
    assert!(me.get("password_hash").is_none());
}

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/users/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get("www-authenticate").unwrap(),
        "Bearer"
    );

    let response = app
        .clone()
        .oneshot(authed_request("/api/expense", "GET", "tampered.token"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expense_crud_and_ownership() {
    let app = test_app();

    register(&app, "alice", "pw-alice", 100.0).await;
    register(&app, "mallory", "pw-mallory", 0.0).await;
    let (_, alice_token) = login(&app, "alice", "pw-alice").await;
    let (_, mallory_token) = login(&app, "mallory", "pw-mallory").await;
    let alice_token = alice_token.unwrap();
    let mallory_token = mallory_token.unwrap();

    // Alice records an expense
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/expense")
                .method("POST")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, format!("Bearer {alice_token}"))
                .body(Body::from(
                    serde_json::json!({"amount": 12.5, "description": "lunch"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    let expense_id = created["payload"]["id"].as_i64().unwrap();

    // She can read it back
    let response = app
        .clone()
        .oneshot(authed_request(
            &format!("/api/expense/{expense_id}"),
            "GET",
            &alice_token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["amount"], 12.5);

    // Mallory cannot read, update or delete it
    for method in ["GET", "DELETE"] {
        let response = app
            .clone()
            .oneshot(authed_request(
                &format!("/api/expense/{expense_id}"),
                method,
                &mallory_token,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/expense/{expense_id}"))
                .method("PUT")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, format!("Bearer {mallory_token}"))
                .body(Body::from(
                    serde_json::json!({"amount": 0.0, "description": "hijacked"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Mallory's own listing stays empty
    let response = app
        .clone()
        .oneshot(authed_request("/api/expense", "GET", &mallory_token))
        .await
        .unwrap();
    let listing = body_json(response).await;
    assert_eq!(listing.as_array().unwrap().len(), 0);

    // Alice updates and the fields actually change
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/expense/{expense_id}"))
                .method("PUT")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, format!("Bearer {alice_token}"))
                .body(Body::from(
                    serde_json::json!({"amount": 15.0, "description": "lunch + tip"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["payload"]["amount"], 15.0);
    assert_eq!(updated["payload"]["description"], "lunch + tip");

    // Alice deletes; a second read is gone
    let response = app
        .clone()
        .oneshot(authed_request(
            &format!("/api/expense/{expense_id}"),
            "DELETE",
            &alice_token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(authed_request(
            &format!("/api/expense/{expense_id}"),
            "GET",
            &alice_token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_routes_are_self_access_only() {
    let app = test_app();

    register(&app, "alice", "pw-alice", 0.0).await;
    register(&app, "mallory", "pw-mallory", 0.0).await;
    let (_, alice_token) = login(&app, "alice", "pw-alice").await;
    let (_, mallory_token) = login(&app, "mallory", "pw-mallory").await;
    let alice_token = alice_token.unwrap();
    let mallory_token = mallory_token.unwrap();

    let response = app
        .clone()
        .oneshot(authed_request("/api/auth/users/me", "GET", &alice_token))
        .await
        .unwrap();
    let alice_id = body_json(response).await["id"].as_i64().unwrap();

    // Mallory can neither view nor delete Alice
    for method in ["GET", "DELETE"] {
        let response = app
            .clone()
            .oneshot(authed_request(
                &format!("/api/auth/users/{alice_id}"),
                method,
                &mallory_token,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    // Alice can view herself
    let response = app
        .clone()
        .oneshot(authed_request(
            &format!("/api/auth/users/{alice_id}"),
            "GET",
            &alice_token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Alice deletes her own account; her still-unexpired token dies with it
    let response = app
        .clone()
        .oneshot(authed_request(
            &format!("/api/auth/users/{alice_id}"),
            "DELETE",
            &alice_token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(authed_request("/api/auth/users/me", "GET", &alice_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rate_limit_locks_out() {
    let app = test_app();
    register(&app, "alice", "pw-alice", 0.0).await;

    // Forwarded through the loopback reverse proxy, so x-real-ip is trusted
    let proxy: SocketAddr = "127.0.0.1:40000".parse().unwrap();
    let attempt = |password: &'static str| {
        let app = app.clone();
        async move {
            let mut request = login_request("alice", password, proxy);
            request
                .headers_mut()
                .insert("x-real-ip", "203.0.113.7".parse().unwrap());
            app.oneshot(request).await.unwrap()
        }
    };

    for _ in 0..5 {
        let response = attempt("wrong").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Locked out now, even with the right password
    let response = attempt("pw-alice").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_login_rate_limit_is_keyed_per_client() {
    let app = test_app();
    register(&app, "alice", "pw-alice", 0.0).await;

    let attacker: SocketAddr = "198.51.100.8:40000".parse().unwrap();
    let victim: SocketAddr = "198.51.100.9:40000".parse().unwrap();

    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(login_request("alice", "wrong", attacker))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // The attacker's address is locked out
    let response = app
        .clone()
        .oneshot(login_request("alice", "pw-alice", attacker))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // Alice, connecting from her own address, still gets in
    let response = app
        .clone()
        .oneshot(login_request("alice", "pw-alice", victim))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_forged_forwarding_header_does_not_move_the_bucket() {
    let app = test_app();
    register(&app, "alice", "pw-alice", 0.0).await;

    let attacker: SocketAddr = "198.51.100.8:40000".parse().unwrap();

    // x-real-ip from a non-loopback peer is ignored, so varying it does not
    // spread the failures across buckets
    for n in 0..5 {
        let mut request = login_request("alice", "wrong", attacker);
        request
            .headers_mut()
            .insert("x-real-ip", format!("203.0.113.{n}").parse().unwrap());
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = app
        .clone()
        .oneshot(login_request("alice", "pw-alice", attacker))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}
