//! Integration tests for group management endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    create_test_app, delete_request_with_auth, get_request_with_auth, json_request_with_auth,
    parse_response_body, post_request_with_auth, seed_user,
};
use serde_json::json;
use tower::ServiceExt;

fn group_payload(name: &str) -> serde_json::Value {
    json!({
        "name": name,
        "contribution_amount": 100000,
        "frequency": "monthly",
        "member_count": 5,
        "start_date": "2025-09-01"
    })
}

// ============================================================================
// Create / Get / List
// ============================================================================

#[tokio::test]
async fn test_create_group_success() {
    let (app, stores) = create_test_app();
    let (user_id, token) = seed_user(&stores, "+6281111111111").await;

    let response = app
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/v1/groups",
            &token,
            group_payload("Arisan Kantor"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = parse_response_body(response).await;
    assert_eq!(body["name"], "Arisan Kantor");
    assert_eq!(body["status"], "active");
    assert_eq!(body["is_admin"], true);
    assert_eq!(body["current_members"], 1);
    assert_eq!(body["created_by"], user_id.to_string());
    assert_eq!(body["members"].as_array().unwrap().len(), 1);
    assert_eq!(body["members"][0]["is_admin"], true);
}

#[tokio::test]
async fn test_create_group_rejects_single_member_capacity() {
    let (app, stores) = create_test_app();
    let (_, token) = seed_user(&stores, "+6281111111111").await;

    let mut payload = group_payload("Arisan Kecil");
    payload["member_count"] = json!(1);

    let response = app
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/v1/groups",
            &token,
            payload,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_group_rejects_oversize_capacity() {
    let (app, stores) = create_test_app();
    let (_, token) = seed_user(&stores, "+6281111111111").await;

    let mut payload = group_payload("Arisan Raksasa");
    payload["member_count"] = json!(21);

    let response = app
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/v1/groups",
            &token,
            payload,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_group_accepts_boundary_capacities() {
    let (app, stores) = create_test_app();
    let (_, token) = seed_user(&stores, "+6281111111111").await;

    for count in [2, 20] {
        let mut payload = group_payload("Arisan Batas");
        payload["member_count"] = json!(count);

        let response = app
            .clone()
            .oneshot(json_request_with_auth(
                Method::POST,
                "/api/v1/groups",
                &token,
                payload,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}

#[tokio::test]
async fn test_create_group_rejects_zero_contribution() {
    let (app, stores) = create_test_app();
    let (_, token) = seed_user(&stores, "+6281111111111").await;

    let mut payload = group_payload("Arisan Gratis");
    payload["contribution_amount"] = json!(0);

    let response = app
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/v1/groups",
            &token,
            payload,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_group_as_member() {
    let (app, stores) = create_test_app();
    let (_, token) = seed_user(&stores, "+6281111111111").await;

    let response = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/v1/groups",
            &token,
            group_payload("Arisan RT"),
        ))
        .await
        .unwrap();
    let created = parse_response_body(response).await;
    let group_id = created["id"].as_str().unwrap();

    let response = app
        .oneshot(get_request_with_auth(
            &format!("/api/v1/groups/{group_id}"),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["id"], group_id);
    assert_eq!(body["name"], "Arisan RT");
}

#[tokio::test]
async fn test_get_group_as_outsider_is_forbidden() {
    let (app, stores) = create_test_app();
    let (_, admin_token) = seed_user(&stores, "+6281111111111").await;
    let (_, outsider_token) = seed_user(&stores, "+6282222222222").await;

    let response = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/v1/groups",
            &admin_token,
            group_payload("Arisan Tertutup"),
        ))
        .await
        .unwrap();
    let created = parse_response_body(response).await;
    let group_id = created["id"].as_str().unwrap();

    let response = app
        .oneshot(get_request_with_auth(
            &format!("/api/v1/groups/{group_id}"),
            &outsider_token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_get_unknown_group_is_not_found() {
    let (app, stores) = create_test_app();
    let (_, token) = seed_user(&stores, "+6281111111111").await;

    let response = app
        .oneshot(get_request_with_auth(
            &format!("/api/v1/groups/{}", uuid::Uuid::new_v4()),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_groups_only_shows_memberships() {
    let (app, stores) = create_test_app();
    let (_, token_a) = seed_user(&stores, "+6281111111111").await;
    let (_, token_b) = seed_user(&stores, "+6282222222222").await;

    for name in ["Arisan Satu", "Arisan Dua"] {
        let response = app
            .clone()
            .oneshot(json_request_with_auth(
                Method::POST,
                "/api/v1/groups",
                &token_a,
                group_payload(name),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(get_request_with_auth("/api/v1/groups", &token_a))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let response = app
        .oneshot(get_request_with_auth("/api/v1/groups", &token_b))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body["count"], 0);
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_update_group_name_and_status() {
    let (app, stores) = create_test_app();
    let (_, token) = seed_user(&stores, "+6281111111111").await;

    let response = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/v1/groups",
            &token,
            group_payload("Arisan Lama"),
        ))
        .await
        .unwrap();
    let created = parse_response_body(response).await;
    let group_id = created["id"].as_str().unwrap();

    let response = app
        .oneshot(json_request_with_auth(
            Method::PUT,
            &format!("/api/v1/groups/{group_id}"),
            &token,
            json!({ "name": "Arisan Baru", "status": "paused" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["name"], "Arisan Baru");
    assert_eq!(body["status"], "paused");
}

#[tokio::test]
async fn test_update_group_requires_admin() {
    let (app, stores) = create_test_app();
    let (_, admin_token) = seed_user(&stores, "+6281111111111").await;
    let (member_id, member_token) = seed_user(&stores, "+6282222222222").await;

    let response = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/v1/groups",
            &admin_token,
            group_payload("Arisan Kantor"),
        ))
        .await
        .unwrap();
    let created = parse_response_body(response).await;
    let group_id: uuid::Uuid = created["id"].as_str().unwrap().parse().unwrap();

    stores
        .groups
        .add_member(group_id, member_id, false)
        .await
        .unwrap();

    let response = app
        .oneshot(json_request_with_auth(
            Method::PUT,
            &format!("/api/v1/groups/{group_id}"),
            &member_token,
            json!({ "name": "Kudeta" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_update_group_rejects_empty_change_set() {
    let (app, stores) = create_test_app();
    let (_, token) = seed_user(&stores, "+6281111111111").await;

    let response = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/v1/groups",
            &token,
            group_payload("Arisan Diam"),
        ))
        .await
        .unwrap();
    let created = parse_response_body(response).await;
    let group_id = created["id"].as_str().unwrap();

    let response = app
        .oneshot(json_request_with_auth(
            Method::PUT,
            &format!("/api/v1/groups/{group_id}"),
            &token,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_group_rejects_illegal_status_transition() {
    let (app, stores) = create_test_app();
    let (_, token) = seed_user(&stores, "+6281111111111").await;

    let response = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/v1/groups",
            &token,
            group_payload("Arisan Selesai"),
        ))
        .await
        .unwrap();
    let created = parse_response_body(response).await;
    let group_id = created["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::PUT,
            &format!("/api/v1/groups/{group_id}"),
            &token,
            json!({ "status": "completed" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Completed is terminal.
    let response = app
        .oneshot(json_request_with_auth(
            Method::PUT,
            &format!("/api/v1/groups/{group_id}"),
            &token,
            json!({ "status": "active" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "conflict");
}

// ============================================================================
// Membership management
// ============================================================================

#[tokio::test]
async fn test_member_lifecycle_join_list_leave() {
    let (app, stores) = create_test_app();
    let (_, admin_token) = seed_user(&stores, "+6281111111111").await;
    let (member_id, member_token) = seed_user(&stores, "+6282222222222").await;

    let response = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/v1/groups",
            &admin_token,
            group_payload("Arisan RT"),
        ))
        .await
        .unwrap();
    let created = parse_response_body(response).await;
    let group_id: uuid::Uuid = created["id"].as_str().unwrap().parse().unwrap();

    stores
        .groups
        .add_member(group_id, member_id, false)
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get_request_with_auth(
            &format!("/api/v1/groups/{group_id}/members"),
            &member_token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["count"], 2);

    let response = app
        .clone()
        .oneshot(post_request_with_auth(
            &format!("/api/v1/groups/{group_id}/leave"),
            &member_token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["removed"], true);
    assert_eq!(body["user_id"], member_id.to_string());

    // Gone from the member list afterwards.
    let response = app
        .oneshot(get_request_with_auth(
            &format!("/api/v1/groups/{group_id}/members"),
            &admin_token,
        ))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_leave_without_membership_is_not_found() {
    let (app, stores) = create_test_app();
    let (_, admin_token) = seed_user(&stores, "+6281111111111").await;
    let (_, outsider_token) = seed_user(&stores, "+6282222222222").await;

    let response = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/v1/groups",
            &admin_token,
            group_payload("Arisan RT"),
        ))
        .await
        .unwrap();
    let created = parse_response_body(response).await;
    let group_id = created["id"].as_str().unwrap();

    let response = app
        .oneshot(post_request_with_auth(
            &format!("/api/v1/groups/{group_id}/leave"),
            &outsider_token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_remove_member_requires_admin() {
    let (app, stores) = create_test_app();
    let (admin_id, admin_token) = seed_user(&stores, "+6281111111111").await;
    let (member_id, member_token) = seed_user(&stores, "+6282222222222").await;

    let response = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/v1/groups",
            &admin_token,
            group_payload("Arisan Kantor"),
        ))
        .await
        .unwrap();
    let created = parse_response_body(response).await;
    let group_id: uuid::Uuid = created["id"].as_str().unwrap().parse().unwrap();

    stores
        .groups
        .add_member(group_id, member_id, false)
        .await
        .unwrap();

    // Plain member cannot remove the admin.
    let response = app
        .clone()
        .oneshot(delete_request_with_auth(
            &format!("/api/v1/groups/{group_id}/members/{admin_id}"),
            &member_token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admin removes the member.
    let response = app
        .oneshot(delete_request_with_auth(
            &format!("/api/v1/groups/{group_id}/members/{member_id}"),
            &admin_token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["removed"], true);
}

#[tokio::test]
async fn test_promote_member_grants_admin() {
    let (app, stores) = create_test_app();
    let (_, admin_token) = seed_user(&stores, "+6281111111111").await;
    let (member_id, member_token) = seed_user(&stores, "+6282222222222").await;

    let response = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/v1/groups",
            &admin_token,
            group_payload("Arisan Kantor"),
        ))
        .await
        .unwrap();
    let created = parse_response_body(response).await;
    let group_id: uuid::Uuid = created["id"].as_str().unwrap().parse().unwrap();

    stores
        .groups
        .add_member(group_id, member_id, false)
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post_request_with_auth(
            &format!("/api/v1/groups/{group_id}/members/{member_id}/promote"),
            &admin_token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["is_admin"], true);

    // The promoted member can now update the group.
    let response = app
        .oneshot(json_request_with_auth(
            Method::PUT,
            &format!("/api/v1/groups/{group_id}"),
            &member_token,
            json!({ "name": "Arisan Bersama" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
