//! Integration tests for event management and admission endpoints.

mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::{epoch, TestApp};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() {
    let app = TestApp::new();
    let (status, body) = app
        .call("POST", "/api/v1/events", None, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_create_event_validates_window() {
    let app = TestApp::new();
    let start = epoch() + Duration::hours(1);
    let (status, body) = app
        .call(
            "POST",
            "/api/v1/events",
            Some(Uuid::new_v4()),
            Some(json!({
                "title": "Backwards",
                "start_datetime": start,
                "end_datetime": start - Duration::minutes(5),
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_malformed_json_is_validation_error() {
    let app = TestApp::new();
    let (status, body) = app
        .call(
            "POST",
            "/api/v1/events",
            Some(Uuid::new_v4()),
            Some(json!({ "title": 42 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_draft_event_hidden_until_published() {
    let app = TestApp::new();
    let organizer = Uuid::new_v4();
    let start = epoch() + Duration::days(2);
    let (status, body) = app
        .call(
            "POST",
            "/api/v1/events",
            Some(organizer),
            Some(json!({
                "title": "Quiet draft",
                "start_datetime": start,
                "end_datetime": start + Duration::hours(1),
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "draft");
    let uri = format!("/api/v1/events/{}", body["id"].as_str().unwrap());

    let (status, _) = app.call("GET", &uri, Some(Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.call("GET", &uri, Some(organizer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["participant_count"], 0);
}

#[tokio::test]
async fn test_join_respects_capacity_and_excludes_organizer() {
    let app = TestApp::new();
    let organizer = Uuid::new_v4();
    let event_id = app.published_event(organizer, Some(1)).await;

    let first = Uuid::new_v4();
    let (status, body) = app.join(event_id, first).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "accepted");

    let second = Uuid::new_v4();
    let (status, body) = app.join(event_id, second).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");

    // Joining again returns the existing row
    let (status, body) = app.join(event_id, first).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "accepted");

    let (status, body) = app
        .call("GET", &format!("/api/v1/events/{}", event_id), Some(second), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["participant_count"], 1);
    assert_eq!(body["seats_remaining"], 0);
    assert_eq!(body["counts"]["pending"], 1);
}

#[tokio::test]
async fn test_organizer_decides_pending_participant() {
    let app = TestApp::new();
    let organizer = Uuid::new_v4();
    let event_id = app.published_event(organizer, Some(1)).await;
    app.join(event_id, Uuid::new_v4()).await;
    let (_, pending) = app.join(event_id, Uuid::new_v4()).await;
    let uri = format!(
        "/api/v1/participants/{}/decision",
        pending["id"].as_str().unwrap()
    );

    let (status, _) = app
        .call("POST", &uri, Some(Uuid::new_v4()), Some(json!({ "decision": "reject" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call("POST", &uri, Some(organizer), Some(json!({ "decision": "reject" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");
}

#[tokio::test]
async fn test_invitee_accepts_invitation() {
    let app = TestApp::new();
    let organizer = Uuid::new_v4();
    let event_id = app.published_event(organizer, None).await;
    let invitee = Uuid::new_v4();

    let (status, invited) = app
        .call(
            "POST",
            &format!("/api/v1/events/{}/invitations", event_id),
            Some(organizer),
            Some(json!({ "user_id": invitee, "role": "speaker" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(invited["status"], "pending");
    assert_eq!(invited["role"], "speaker");
    let uri = format!(
        "/api/v1/participants/{}/response",
        invited["id"].as_str().unwrap()
    );

    let (status, _) = app
        .call("POST", &uri, Some(organizer), Some(json!({ "decision": "accept" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call("POST", &uri, Some(invitee), Some(json!({ "decision": "accept" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "accepted");
}

#[tokio::test]
async fn test_participant_list_is_for_managers() {
    let app = TestApp::new();
    let organizer = Uuid::new_v4();
    let event_id = app.published_event(organizer, None).await;
    let member = Uuid::new_v4();
    app.join(event_id, member).await;
    let uri = format!("/api/v1/events/{}/participants", event_id);

    let (status, body) = app.call("GET", &uri, Some(organizer), None).await;
    assert_eq!(status, StatusCode::OK);
    let participants = body["participants"].as_array().unwrap();
    assert!(participants
        .iter()
        .any(|p| p["user_id"] == member.to_string()));

    let (status, _) = app.call("GET", &uri, Some(member), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_cancelled_event_rejects_joins() {
    let app = TestApp::new();
    let organizer = Uuid::new_v4();
    let event_id = app.published_event(organizer, None).await;

    let (status, body) = app
        .call(
            "POST",
            &format!("/api/v1/events/{}/cancel", event_id),
            Some(organizer),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    let (status, _) = app.join(event_id, Uuid::new_v4()).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();

    let (status, body) = app.call("GET", "/api/health/live", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "alive");

    let (status, body) = app.call("GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"]["connected"], true);

    let (status, _) = app.call("GET", "/api/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
}
