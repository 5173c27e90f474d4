#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use schoolyard::router::init_router;
use schoolyard::state::AppState;
use schoolyard_config::{CorsConfig, JwtConfig, SchoolConfig};
use schoolyard_core::hash_password;
use schoolyard_models::profile_rules::role_profile;
use schoolyard_models::{RoleEnum, UserId};
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "testpass123";

pub struct TestUser {
    pub id: UserId,
    pub email: String,
    pub password: String,
}

pub fn test_state(pool: PgPool) -> AppState {
    AppState {
        db: pool,
        jwt_config: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
        },
        cors_config: CorsConfig::from_origins("http://localhost:3000"),
        school_config: Arc::new(SchoolConfig {
            name: "Test School".to_string(),
            address: Some("1 Test Lane".to_string()),
            phone: None,
            email: Some("office@test-school.example".to_string()),
            description: None,
            attributes: None,
        }),
    }
}

pub fn setup_test_app(pool: PgPool) -> Router {
    init_router(test_state(pool))
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

/// Inserts a user holding `role` with the profile the role requires.
pub async fn create_test_user(pool: &PgPool, role: RoleEnum) -> TestUser {
    let email = generate_unique_email();
    let hashed = hash_password(TEST_PASSWORD).unwrap();

    let mut tx = pool.begin().await.unwrap();

    let id: UserId = sqlx::query_scalar(
        "INSERT INTO users (first_name, last_name, email, password, is_staff)
         VALUES ('Test', $1, $2, $3, $4)
         RETURNING id",
    )
    .bind(role.as_str())
    .bind(&email)
    .bind(&hashed)
    .bind(role.is_staff_role())
    .fetch_one(&mut *tx)
    .await
    .unwrap();

    sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
        .bind(id)
        .bind(role)
        .execute(&mut *tx)
        .await
        .unwrap();

    if let Some(profile) = role_profile(role) {
        sqlx::query("INSERT INTO profiles (user_id, profile_type) VALUES ($1, $2)")
            .bind(id)
            .bind(profile)
            .execute(&mut *tx)
            .await
            .unwrap();
    }

    tx.commit().await.unwrap();

    TestUser {
        id,
        email,
        password: TEST_PASSWORD.to_string(),
    }
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, body)
}

pub async fn get_auth_token(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["access_token"].as_str().unwrap().to_string()
}

/// Creates a user holding `role` and signs them in.
pub async fn login_as(app: &Router, pool: &PgPool, role: RoleEnum) -> (TestUser, String) {
    let user = create_test_user(pool, role).await;
    let token = get_auth_token(app, &user.email, &user.password).await;
    (user, token)
}

pub fn academic_year_body(name: &str, deployment_type: &str) -> Value {
    json!({
        "name": name,
        "start_date": "2026-09-01",
        "end_date": "2027-06-30",
        "deployment_type": deployment_type
    })
}

/// Creates a year through the API and returns its id.
pub async fn create_academic_year(app: &Router, token: &str, name: &str, deployment: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/academic-years",
        Some(token),
        Some(academic_year_body(name, deployment)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create year failed: {body}");
    body["id"].as_str().unwrap().to_string()
}

/// Marks every required setup step with a manual import method.
pub async fn complete_setup(app: &Router, token: &str, year_id: &str) {
    for step in [
        "BASIC_INFO",
        "IMPORT_GRADES",
        "IMPORT_STUDENTS",
        "ASSIGN_CLASSROOMS",
        "REVIEW",
    ] {
        let (status, body) = send(
            app,
            "POST",
            &format!("/api/academic-years/{year_id}/setup/steps/{step}"),
            Some(token),
            Some(json!({ "import_method": "MANUAL" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "marking {step} failed: {body}");
    }
}

pub async fn create_grade(app: &Router, token: &str, year_id: &str, name: &str, level: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        &format!("/api/academic-years/{year_id}/grades"),
        Some(token),
        Some(json!({ "name": name, "grade": level })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create grade failed: {body}");
    body["id"].as_str().unwrap().to_string()
}
