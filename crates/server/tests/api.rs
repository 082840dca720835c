use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use db::{
    DBService,
    models::profile::{CreateProfile, UserRole},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use server::{AppState, ServerConfig, routes};
use services::services::auth::AuthService;
use tower::ServiceExt;
use uuid::Uuid;

struct TestApp {
    router: Router,
    admin_token: String,
    tech_token: String,
    _files: tempfile::TempDir,
}

async fn spawn_app() -> TestApp {
    let db = DBService::new_in_memory().await.unwrap();
    let files = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test-secret".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        files_dir: files.path().to_path_buf(),
        public_files_base: "/files".to_string(),
    };

    let hash = AuthService::hash_password("password123").unwrap();
    let admin = db::models::profile::Profile::create(
        &db.pool,
        Uuid::new_v4(),
        &CreateProfile {
            email: "admin@example.com".to_string(),
            name: "Admin".to_string(),
            role: UserRole::Admin,
        },
        &hash,
    )
    .await
    .unwrap();
    let tech = db::models::profile::Profile::create(
        &db.pool,
        Uuid::new_v4(),
        &CreateProfile {
            email: "tech@example.com".to_string(),
            name: "Tech".to_string(),
            role: UserRole::Technician,
        },
        &hash,
    )
    .await
    .unwrap();

    let state = AppState::new(db, &config);
    let admin_token = state.auth.issue_token(&admin).unwrap();
    let tech_token = state.auth.issue_token(&tech).unwrap();

    TestApp {
        router: routes::router(state),
        admin_token,
        tech_token,
        _files: files,
    }
}

fn get(path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(path: &str, token: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn put_json(path: &str, token: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn login_rejects_a_wrong_password() {
    let app = spawn_app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"email": "admin@example.com", "password": "nope"}).to_string(),
        ))
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_returns_a_usable_token() {
    let app = spawn_app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"email": "admin@example.com", "password": "password123"}).to_string(),
        ))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let token = body["data"]["token"].as_str().unwrap().to_string();
    assert!(body["data"]["profile"].get("password_hash").is_none());

    let me = app
        .router
        .oneshot(get("/api/auth/me", Some(&token)))
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);
    let me = body_json(me).await;
    assert_eq!(me["data"]["email"], "admin@example.com");
}

#[tokio::test]
async fn statuses_require_authentication() {
    let app = spawn_app().await;
    let response = app
        .router
        .clone()
        .oneshot(get("/api/work-order-statuses", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .router
        .oneshot(get("/api/work-order-statuses", Some(&app.tech_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let statuses = body["data"].as_array().unwrap();
    assert_eq!(statuses.len(), 6);
    assert_eq!(statuses[0]["key"], "new");
}

#[tokio::test]
async fn creating_users_is_admin_only() {
    let app = spawn_app().await;
    let payload = json!({
        "email": "new@example.com",
        "name": "New User",
        "password": "longenough",
        "role": "technician"
    });

    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/admin/users", &app.tech_token, &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/admin/users", &app.admin_token, &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Same email again is a validation failure, not a 500.
    let response = app
        .router
        .oneshot(post_json("/api/admin/users", &app.admin_token, &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn creating_a_work_order_normalizes_the_phone() {
    let app = spawn_app().await;
    let payload = json!({
        "client_name": "Dana",
        "phone": "(555) 010-2030",
        "address": "12 Elm St",
        "service": "Boiler",
        "description": null,
        "scheduled_start": null,
        "estimated_minutes": null,
        "assigned_to": null
    });
    let response = app
        .router
        .oneshot(post_json("/api/work-orders", &app.admin_token, &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["phone"], "5550102030");
    assert_eq!(body["data"]["status"], "new");
}

#[tokio::test]
async fn setting_tags_rejects_unknown_tag_ids() {
    let app = spawn_app().await;
    let payload = json!({
        "client_name": "Dana",
        "phone": "5550102030",
        "address": "12 Elm St",
        "service": null,
        "description": null,
        "scheduled_start": null,
        "estimated_minutes": null,
        "assigned_to": null
    });
    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/work-orders", &app.admin_token, &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let work_order_id = body_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .router
        .clone()
        .oneshot(put_json(
            &format!("/api/work-orders/{work_order_id}/tags"),
            &app.admin_token,
            &json!({ "tag_ids": [Uuid::new_v4()] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/api/tags",
            &app.admin_token,
            &json!({"name": "urgent", "color": "#ff0000"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let tag_id = body_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .router
        .oneshot(put_json(
            &format!("/api/work-orders/{work_order_id}/tags"),
            &app.admin_token,
            &json!({ "tag_ids": [tag_id] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["tags"][0]["name"], "urgent");
}

fn post_avatar(token: &str, bytes: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/profiles/me/avatar")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "image/png")
        .body(Body::from(bytes))
        .unwrap()
}

#[tokio::test]
async fn avatar_uploads_accept_bodies_beyond_the_default_limit() {
    let app = spawn_app().await;

    // 3 MiB clears axum's stock 2 MB body cap but sits under the avatar cap.
    let response = app
        .router
        .clone()
        .oneshot(post_avatar(&app.tech_token, vec![0u8; 3 * 1024 * 1024]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(
        body["data"]["avatar_url"]
            .as_str()
            .unwrap()
            .starts_with("/files/avatars/")
    );

    let response = app
        .router
        .oneshot(post_avatar(&app.tech_token, vec![0u8; 5 * 1024 * 1024 + 1]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn agenda_week_snaps_weekends_to_monday() {
    let app = spawn_app().await;
    let response = app
        .router
        .oneshot(get(
            "/api/agenda/week?date=2025-03-08",
            Some(&app.admin_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["monday"], "2025-03-03");
    assert_eq!(body["data"]["days"].as_array().unwrap().len(), 5);
}
