mod common;

use axum::http::StatusCode;
use axum::Router;
use common::{create_academic_year, login_as, send, setup_test_app};
use schoolyard_models::RoleEnum;
use serde_json::json;
use sqlx::PgPool;

async fn create_task(app: &Router, token: &str, year: &str, task_type: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        &format!("/api/academic-years/{year}/import-tasks"),
        Some(token),
        Some(json!({
            "task_type": task_type,
            "total_records": 200,
            "file_path": "uploads/students.csv"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["status"], "PENDING");
    body["id"].as_str().unwrap().to_string()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_import_lifecycle_marks_setup_step(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let (_, token) = login_as(&app, &pool, RoleEnum::Admin).await;
    let year = create_academic_year(&app, &token, "2026-2027", "FRESH_START").await;
    let task = create_task(&app, &token, &year, "STUDENTS").await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/import-tasks/{task}/started"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "IN_PROGRESS");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/import-tasks/{task}/progress"),
        Some(&token),
        Some(json!({
            "processed": 50,
            "success": 48,
            "errors": 2,
            "error_details": { "rows": [7, 19] }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["progress_percentage"], 25.0);
    assert_eq!(body["error_count"], 2);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/import-tasks/{task}/completed"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "COMPLETED");
    assert!(body["completed_at"].is_string());
    assert_eq!(body["error_details"], json!({ "rows": [7, 19] }));

    let (status, progress) = send(
        &app,
        "GET",
        &format!("/api/academic-years/{year}/setup"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["setup"]["import_students_completed"], true);
    assert_eq!(progress["setup"]["students_import_method"], "CSV");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_finished_task_rejects_reports(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let (_, token) = login_as(&app, &pool, RoleEnum::Admin).await;
    let year = create_academic_year(&app, &token, "2026-2027", "FRESH_START").await;
    let task = create_task(&app, &token, &year, "GRADES").await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/import-tasks/{task}/failed"),
        Some(&token),
        Some(json!({ "error_details": { "message": "bad header row" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "FAILED");
    assert_eq!(body["error_details"]["message"], "bad header row");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/import-tasks/{task}/completed"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Import task is already FAILED");

    let (status, progress) = send(
        &app,
        "GET",
        &format!("/api/academic-years/{year}/setup"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["setup"]["import_grades_completed"], false);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_and_get_import_tasks(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let (_, token) = login_as(&app, &pool, RoleEnum::Admin).await;
    let year = create_academic_year(&app, &token, "2026-2027", "FRESH_START").await;
    let task = create_task(&app, &token, &year, "CLASSROOMS").await;
    create_task(&app, &token, &year, "GRADES").await;

    let (status, tasks) = send(
        &app,
        "GET",
        &format!("/api/academic-years/{year}/import-tasks"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks.as_array().unwrap().len(), 2);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/import-tasks/{task}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task_type"], "CLASSROOMS");

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/import-tasks/{}", uuid::Uuid::new_v4()),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Import task not found");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_import_tasks_require_administrator(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let (_, admin) = login_as(&app, &pool, RoleEnum::Admin).await;
    let (_, teacher) = login_as(&app, &pool, RoleEnum::Teacher).await;
    let year = create_academic_year(&app, &admin, "2026-2027", "FRESH_START").await;
    let task = create_task(&app, &admin, &year, "GRADES").await;

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/import-tasks/{task}"),
        Some(&teacher),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
