mod common;

use axum::http::StatusCode;
use common::{create_test_user, login_as, send, setup_test_app};
use schoolyard_models::RoleEnum;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_link_and_list_children(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let (_, token) = login_as(&app, &pool, RoleEnum::Admin).await;
    let parent = create_test_user(&pool, RoleEnum::Parent).await;
    let student = create_test_user(&pool, RoleEnum::Student).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/parents/{}/children", parent.id),
        Some(&token),
        Some(json!({ "student_id": student.id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["id"], student.id.to_string());

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/parents/{}/children", parent.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let children = body.as_array().unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0]["roles"], json!(["Student"]));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_child_must_be_student(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let (_, token) = login_as(&app, &pool, RoleEnum::Admin).await;
    let parent = create_test_user(&pool, RoleEnum::Parent).await;
    let teacher = create_test_user(&pool, RoleEnum::Teacher).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/parents/{}/children", parent.id),
        Some(&token),
        Some(json!({ "student_id": teacher.id })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("must have STUDENT role"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_children_of_non_parent(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let (_, token) = login_as(&app, &pool, RoleEnum::Admin).await;
    let teacher = create_test_user(&pool, RoleEnum::Teacher).await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/parents/{}/children", teacher.id),
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User is not a parent");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_remove_child(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let (_, token) = login_as(&app, &pool, RoleEnum::Admin).await;
    let parent = create_test_user(&pool, RoleEnum::Parent).await;
    let student = create_test_user(&pool, RoleEnum::Student).await;

    send(
        &app,
        "POST",
        &format!("/api/parents/{}/children", parent.id),
        Some(&token),
        Some(json!({ "student_id": student.id })),
    )
    .await;

    let uri = format!("/api/parents/{}/children/{}", parent.id, student.id);
    let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Child is not linked to this parent");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_parents_routes_require_administrator(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let (parent, token) = login_as(&app, &pool, RoleEnum::Parent).await;

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/parents/{}/children", parent.id),
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}
