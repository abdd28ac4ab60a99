// Router-level tests driving the full application against the in-memory
// store. No network, no Postgres: requests go through tower's oneshot.

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use technotes_api::auth::jwt::{AccessTokenClaims, TokenIssuer};
use technotes_api::auth::AuthConfig;
use technotes_api::build_app;
use technotes_api::storage::password::hash_password;
use technotes_api::storage::{CreateUserRow, StorageBackend, UpdateUser, UserRow};

fn test_config() -> AuthConfig {
    AuthConfig {
        access_secret: "test-access-secret".to_string(),
        refresh_secret: "test-refresh-secret".to_string(),
        access_token_lifetime: Duration::from_secs(900),
        refresh_token_lifetime: Duration::from_secs(7 * 24 * 60 * 60),
    }
}

fn test_app() -> (Router, Arc<StorageBackend>) {
    let db = Arc::new(StorageBackend::in_memory());
    let app = build_app(db.clone(), test_config());
    (app, db)
}

async fn seed_user(db: &StorageBackend, username: &str, password: &str, roles: &[&str]) -> UserRow {
    db.create_user(CreateUserRow {
        username: username.to_string(),
        password_hash: hash_password(password).unwrap(),
        roles: roles.iter().map(|r| r.to_string()).collect(),
    })
    .await
    .unwrap()
}

/// Fire one request at the router and collect (status, headers, json body).
async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    bearer: Option<&str>,
    cookie: Option<&str>,
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie.to_string());
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = body.collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (parts.status, parts.headers, json)
}

/// Pull the `jwt=...` pair out of a Set-Cookie header for replay.
fn refresh_cookie_pair(headers: &HeaderMap) -> String {
    let set_cookie = headers
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header missing")
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with("jwt="));
    set_cookie.split(';').next().unwrap().to_string()
}

async fn login(app: &Router, username: &str, password: &str) -> (String, String) {
    let (status, headers, body) = send(
        app,
        Method::POST,
        "/auth",
        Some(json!({"username": username, "password": password})),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let access_token = body["accessToken"].as_str().unwrap().to_string();
    (access_token, refresh_cookie_pair(&headers))
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _db) = test_app();
    let (status, _, body) = send(&app, Method::GET, "/health", None, None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage_mode"], "memory");
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let (app, _db) = test_app();
    let (status, _, body) = send(&app, Method::GET, "/nope", None, None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "404 Not Found");
}

#[tokio::test]
async fn test_login_success_sets_cookie_and_returns_token() {
    let (app, db) = test_app();
    seed_user(&db, "alice", "secret", &["Employee"]).await;

    let (status, headers, body) = send(
        &app,
        Method::POST,
        "/auth",
        Some(json!({"username": "alice", "password": "secret"})),
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);

    let set_cookie = headers
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with("jwt="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Secure"));
    assert!(set_cookie.contains("SameSite=None"));

    // Access token travels in the body only, never in a cookie
    let access_token = body["accessToken"].as_str().unwrap();
    assert!(!set_cookie.contains(access_token));

    let claims = TokenIssuer::new(test_config())
        .verify_access_token(access_token)
        .unwrap();
    assert_eq!(claims.sub, "alice");
    assert_eq!(claims.roles, vec!["Employee".to_string()]);
}

#[tokio::test]
async fn test_login_missing_fields_is_bad_request() {
    let (app, _db) = test_app();

    for body in [json!({}), json!({"username": "alice"}), json!({"password": "x"})] {
        let (status, _, resp) = send(&app, Method::POST, "/auth", Some(body), None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["message"], "Please provide username and password");
    }
}

#[tokio::test]
async fn test_login_rejections_are_indistinguishable() {
    let (app, db) = test_app();
    seed_user(&db, "alice", "secret", &["Employee"]).await;
    let bob = seed_user(&db, "bob", "secret", &["Employee"]).await;
    db.update_user(
        bob.id,
        UpdateUser {
            active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    // Unknown user, inactive user, and wrong password all answer the same
    let cases = [
        json!({"username": "nobody", "password": "secret"}),
        json!({"username": "bob", "password": "secret"}),
        json!({"username": "alice", "password": "wrong"}),
    ];
    for body in cases {
        let (status, _, resp) = send(&app, Method::POST, "/auth", Some(body), None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(resp["message"], "Unauthorized");
    }
}

#[tokio::test]
async fn test_protected_routes_require_bearer_token() {
    let (app, _db) = test_app();

    // No header at all
    let (status, _, resp) = send(&app, Method::GET, "/users", None, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp["message"], "Unauthorized");

    // Malformed header scheme
    let request = Request::builder()
        .method(Method::GET)
        .uri("/notes")
        .header(header::AUTHORIZATION, "Token abc")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Present but unverifiable token
    let (status, _, resp) =
        send(&app, Method::GET, "/users", None, Some("garbage"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(resp["message"], "Forbidden");
}

#[tokio::test]
async fn test_expired_access_token_is_forbidden() {
    let (app, db) = test_app();
    seed_user(&db, "alice", "secret", &["Employee"]).await;

    let now = chrono::Utc::now().timestamp();
    let claims = AccessTokenClaims {
        sub: "alice".to_string(),
        roles: vec!["Employee".to_string()],
        token_type: "access".to_string(),
        exp: now - 3600,
        iat: now - 7200,
    };
    let expired = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(test_config().access_secret.as_bytes()),
    )
    .unwrap();

    let (status, _, resp) = send(&app, Method::GET, "/users", None, Some(&expired), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(resp["message"], "Forbidden");
}

#[tokio::test]
async fn test_refresh_flow() {
    let (app, db) = test_app();
    let alice = seed_user(&db, "alice", "secret", &["Employee"]).await;
    let (_, cookie) = login(&app, "alice", "secret").await;

    // No cookie
    let (status, _, _) = send(&app, Method::GET, "/auth/refresh", None, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Unverifiable cookie
    let (status, _, resp) = send(
        &app,
        Method::GET,
        "/auth/refresh",
        None,
        None,
        Some("jwt=garbage"),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(resp["message"], "Forbidden");

    // Valid cookie mints a fresh access token
    let (status, _, body) = send(
        &app,
        Method::GET,
        "/auth/refresh",
        None,
        None,
        Some(&cookie),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["accessToken"].is_string());

    // Role changes propagate through refresh, not through old access tokens
    db.update_user(
        alice.id,
        UpdateUser {
            roles: Some(vec!["Manager".to_string()]),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let (status, _, body) = send(
        &app,
        Method::GET,
        "/auth/refresh",
        None,
        None,
        Some(&cookie),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let claims = TokenIssuer::new(test_config())
        .verify_access_token(body["accessToken"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.roles, vec!["Manager".to_string()]);

    // A deleted user cannot refresh even with a valid token
    db.delete_user(alice.id).await.unwrap();
    let (status, _, _) = send(
        &app,
        Method::GET,
        "/auth/refresh",
        None,
        None,
        Some(&cookie),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout() {
    let (app, db) = test_app();
    seed_user(&db, "alice", "secret", &["Employee"]).await;
    let (_, cookie) = login(&app, "alice", "secret").await;

    // Without a cookie logout is a no-content no-op
    let (status, _, body) = send(&app, Method::POST, "/auth/logout", None, None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    // With a cookie it clears it
    let (status, headers, body) = send(
        &app,
        Method::POST,
        "/auth/logout",
        None,
        None,
        Some(&cookie),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Cookie cleared");

    let set_cookie = headers
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with("jwt="));
    assert!(set_cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_users_crud() {
    let (app, db) = test_app();
    seed_user(&db, "boss", "secret", &["Admin"]).await;
    let (token, _) = login(&app, "boss", "secret").await;

    // Missing password
    let (status, _, _) = send(
        &app,
        Method::POST,
        "/users",
        Some(json!({"username": "dave"})),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Create with default role
    let (status, _, dave) = send(
        &app,
        Method::POST,
        "/users",
        Some(json!({"username": "dave", "password": "pw12345"})),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(dave["roles"], json!(["Employee"]));
    assert_eq!(dave["active"], json!(true));
    let dave_id = dave["id"].as_str().unwrap().to_string();

    // Duplicate username differing only in case
    let (status, _, resp) = send(
        &app,
        Method::POST,
        "/users",
        Some(json!({"username": "DAVE", "password": "pw12345"})),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(resp["message"], "Duplicate username");

    // Listing never leaks password material
    let (status, _, list) = send(&app, Method::GET, "/users", None, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = list["data"].as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert!(!list.to_string().to_lowercase().contains("password"));

    // Update requires the full field set
    let (status, _, _) = send(
        &app,
        Method::PATCH,
        "/users",
        Some(json!({"id": dave_id, "username": "david", "roles": ["Manager"]})),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, updated) = send(
        &app,
        Method::PATCH,
        "/users",
        Some(json!({
            "id": dave_id,
            "username": "david",
            "roles": ["Manager"],
            "active": false,
            "password": "new-password"
        })),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["username"], "david");
    assert_eq!(updated["roles"], json!(["Manager"]));
    assert_eq!(updated["active"], json!(false));

    // Unknown id
    let (status, _, _) = send(
        &app,
        Method::PATCH,
        "/users",
        Some(json!({
            "id": uuid::Uuid::nil(),
            "username": "ghost",
            "roles": ["Employee"],
            "active": true
        })),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Delete: missing id, unknown id, then success
    let (status, _, resp) = send(
        &app,
        Method::DELETE,
        "/users",
        Some(json!({})),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["message"], "User ID required");

    let (status, _, _) = send(
        &app,
        Method::DELETE,
        "/users",
        Some(json!({"id": uuid::Uuid::nil()})),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(
        &app,
        Method::DELETE,
        "/users",
        Some(json!({"id": dave_id})),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_notes_crud() {
    let (app, db) = test_app();
    let alice = seed_user(&db, "alice", "secret", &["Employee"]).await;
    let (token, _) = login(&app, "alice", "secret").await;

    // Missing text
    let (status, _, _) = send(
        &app,
        Method::POST,
        "/notes",
        Some(json!({"user": alice.id, "title": "Fix printer"})),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown owner
    let (status, _, resp) = send(
        &app,
        Method::POST,
        "/notes",
        Some(json!({"user": uuid::Uuid::nil(), "title": "Fix printer", "text": "jammed"})),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(resp["message"], "User not found");

    // Tickets count up from 500
    let (status, _, first) = send(
        &app,
        Method::POST,
        "/notes",
        Some(json!({"user": alice.id, "title": "Fix printer", "text": "jammed"})),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["ticket"], json!(500));
    assert_eq!(first["completed"], json!(false));
    assert_eq!(first["username"], "alice");
    let first_id = first["id"].as_str().unwrap().to_string();

    let (status, _, second) = send(
        &app,
        Method::POST,
        "/notes",
        Some(json!({"user": alice.id, "title": "Replace toner", "text": "empty"})),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["ticket"], json!(501));
    let second_id = second["id"].as_str().unwrap().to_string();

    // Duplicate title differing only in case
    let (status, _, resp) = send(
        &app,
        Method::POST,
        "/notes",
        Some(json!({"user": alice.id, "title": "FIX PRINTER", "text": "again"})),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(resp["message"], "Duplicate title");

    // List carries owner usernames
    let (status, _, list) = send(&app, Method::GET, "/notes", None, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let notes = list["data"].as_array().unwrap();
    assert_eq!(notes.len(), 2);
    assert!(notes.iter().all(|n| n["username"] == "alice"));

    // Update
    let (status, _, updated) = send(
        &app,
        Method::PATCH,
        "/notes",
        Some(json!({
            "id": first_id,
            "user": alice.id,
            "title": "Fix printer",
            "text": "cleared the jam",
            "completed": true
        })),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["completed"], json!(true));
    assert_eq!(updated["text"], "cleared the jam");

    // Renaming onto the other note's title collides
    let (status, _, _) = send(
        &app,
        Method::PATCH,
        "/notes",
        Some(json!({
            "id": first_id,
            "user": alice.id,
            "title": "replace TONER",
            "text": "x",
            "completed": true
        })),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Delete
    let (status, _, _) = send(
        &app,
        Method::DELETE,
        "/notes",
        Some(json!({})),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(
        &app,
        Method::DELETE,
        "/notes",
        Some(json!({"id": second_id})),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = send(
        &app,
        Method::DELETE,
        "/notes",
        Some(json!({"id": second_id})),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_user_with_notes_blocked() {
    let (app, db) = test_app();
    let alice = seed_user(&db, "alice", "secret", &["Manager"]).await;
    let (token, _) = login(&app, "alice", "secret").await;

    let (status, _, note) = send(
        &app,
        Method::POST,
        "/notes",
        Some(json!({"user": alice.id, "title": "Fix printer", "text": "jammed"})),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _, resp) = send(
        &app,
        Method::DELETE,
        "/users",
        Some(json!({"id": alice.id})),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["message"], "User has assigned notes");

    let (status, _, _) = send(
        &app,
        Method::DELETE,
        "/notes",
        Some(json!({"id": note["id"]})),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The token outlives its user; deletion succeeds with it
    let (status, _, _) = send(
        &app,
        Method::DELETE,
        "/users",
        Some(json!({"id": alice.id})),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
