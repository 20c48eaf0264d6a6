mod utils;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use serde_json::json;
use shoe_api::models::user::Role;
use utils::{TestApp, TEST_PASSWORD};

#[tokio::test]
async fn test_register_then_duplicate_username_conflicts() {
    let app = TestApp::new();

    let res = app
        .post_json(
            "/api/auth/register",
            json!({"username": "alice", "email": "a@x.com", "password": "pw123456"}),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["success"], true);
    assert_eq!(res.body["data"]["username"], "alice");
    assert_eq!(res.body["data"]["email"], "a@x.com");
    assert!(res.body["data"].get("password_hash").is_none());

    let res = app
        .post_json(
            "/api/auth/register",
            json!({"username": "alice", "email": "other@x.com", "password": "pw123456"}),
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.body["success"], false);
    assert_eq!(res.body["code"], "CONFLICT");

    // Email collisions conflict as well
    let res = app
        .post_json(
            "/api/auth/register",
            json!({"username": "alice2", "email": "a@x.com", "password": "pw123456"}),
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_registered_accounts_get_the_user_role() {
    let app = TestApp::new();
    let res = app
        .post_json(
            "/api/auth/register",
            json!({"username": "bob", "email": "b@x.com", "password": "pw123456", "role": "admin"}),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);

    let id = res.body["data"]["id"].as_i64().unwrap();
    assert_eq!(app.store.user(id).unwrap().role, Role::User);
}

#[tokio::test]
async fn test_register_rejects_missing_and_malformed_fields() {
    let app = TestApp::new();

    let res = app
        .post_json("/api/auth/register", json!({"username": "carol"}))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");

    let res = app
        .post_json(
            "/api/auth/register",
            json!({"username": "carol", "email": "not-an-email", "password": "pw123456"}),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["message"].as_str().unwrap().contains("email"));
}

#[tokio::test]
async fn test_login_then_list_keys_is_empty() {
    let app = TestApp::new();
    let alice = app.store.insert_user("alice", Role::User);

    let res = app
        .post_json(
            "/api/auth/login",
            json!({"username": "alice", "password": TEST_PASSWORD}),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["user"]["id"], alice.id);
    assert_eq!(res.body["data"]["user"]["role"], "user");
    let token = res.body["data"]["token"].as_str().unwrap().to_string();

    let res = app.authed(Method::GET, "/api/keys/list", &token, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"], json!([]));
}

#[tokio::test]
async fn test_token_identity_matches_issued_user() {
    let app = TestApp::new();
    let admin = app.store.insert_user("root", Role::Admin);

    let res = app
        .post_json(
            "/api/auth/login",
            json!({"username": "root", "password": TEST_PASSWORD}),
        )
        .await;
    let token = res.body["data"]["token"].as_str().unwrap();

    let identity = app.jwt.verify(token).unwrap();
    assert_eq!(identity.id, admin.id);
    assert_eq!(identity.role, Role::Admin);
    assert_eq!(identity.username, "root");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::new();
    app.store.insert_user("alice", Role::User);

    let wrong_password = app
        .post_json(
            "/api/auth/login",
            json!({"username": "alice", "password": "nope-nope"}),
        )
        .await;
    let unknown_user = app
        .post_json(
            "/api/auth/login",
            json!({"username": "mallory", "password": TEST_PASSWORD}),
        )
        .await;

    for res in [&wrong_password, &unknown_user] {
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.body["message"], "invalid username or password");
    }
}

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let app = TestApp::new();
    let res = app.get("/api/keys/list").await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["message"], "token not found");
    assert_eq!(res.body["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_garbage_and_expired_tokens_are_rejected() {
    let app = TestApp::new();
    let alice = app.store.insert_user("alice", Role::User);

    let res = app
        .authed(Method::GET, "/api/keys/list", "not-a-jwt", None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["message"], "token invalid or expired");

    let expired = app
        .jwt
        .issue_at(&alice, Utc::now() - Duration::hours(2))
        .unwrap();
    let res = app.authed(Method::GET, "/api/keys/list", &expired, None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["message"], "token invalid or expired");
}

#[tokio::test]
async fn test_non_admin_is_forbidden_from_admin_routes() {
    let app = TestApp::new();
    let alice = app.store.insert_user("alice", Role::User);
    let token = app.token_for(&alice);

    for (method, uri) in [
        (Method::GET, "/api/admin/api-keys"),
        (Method::GET, "/api/admin/stats"),
        (Method::GET, "/api/admin/logs"),
        (Method::GET, "/api/admin/users"),
        (Method::DELETE, "/api/admin/api-keys/inactive"),
        (Method::PUT, "/api/admin/api-keys/1/toggle"),
        (Method::DELETE, "/api/admin/users/1"),
    ] {
        let res = app.authed(method, uri, &token, None).await;
        assert_eq!(res.status, StatusCode::FORBIDDEN, "{}", uri);
        assert_eq!(res.body["code"], "FORBIDDEN");
        assert_eq!(res.body["message"], "access denied — admins only");
    }
}

#[tokio::test]
async fn test_admin_routes_require_a_token_first() {
    let app = TestApp::new();
    let res = app.get("/api/admin/stats").await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}
