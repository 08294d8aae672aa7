mod common;

use axum::http::StatusCode;
use classroom_core::Role;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn learner_message_to_teacher_is_created_with_both_parties() {
    let app = TestApp::new();
    let _learner = app.user("ana", Role::Learner).await;
    let teacher = app.user("bruno", Role::Teacher).await;

    let (status, body) = app
        .request(
            "POST",
            "/api/messages",
            Some("ana"),
            Some(json!({ "subject": "Help", "body": "question", "recipientId": teacher.id })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["subject"], "Help");
    assert_eq!(body["read"], false);
    assert_eq!(body["sender"]["username"], "ana");
    assert_eq!(body["sender"]["role"], "learner");
    assert_eq!(body["recipient"]["username"], "bruno");
    assert_eq!(body["recipient"]["role"], "teacher");
}

#[tokio::test]
async fn administrator_send_is_forbidden_with_explanation() {
    let app = TestApp::new();
    app.user("carla", Role::Administrator).await;
    let teacher = app.user("bruno", Role::Teacher).await;

    let (status, body) = app
        .request(
            "POST",
            "/api/messages",
            Some("carla"),
            Some(json!({ "subject": "Hi", "body": "there", "recipientId": teacher.id })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
    assert_eq!(body["message"], "Administrators cannot send messages");
}

#[tokio::test]
async fn missing_token_is_rejected_before_validation() {
    let app = TestApp::new();

    let (status, body) = app
        .request("POST", "/api/messages", None, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");

    let (status, _) = app
        .request("GET", "/api/messages/received", Some("nobody"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_recipient_and_missing_fields() {
    let app = TestApp::new();
    app.user("ana", Role::Learner).await;

    let (status, body) = app
        .request(
            "POST",
            "/api/messages",
            Some("ana"),
            Some(json!({ "subject": "Help", "body": "question", "recipientId": uuid::Uuid::new_v4() })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "recipient_not_found");

    let (status, body) = app
        .request("POST", "/api/messages", Some("ana"), Some(json!({ "subject": "Help" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");

    let (_, sent) = app.request("GET", "/api/messages/sent", Some("ana"), None).await;
    assert_eq!(sent.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn read_edit_and_delete_lifecycle() {
    let app = TestApp::new();
    app.user("ana", Role::Learner).await;
    let teacher = app.user("bruno", Role::Teacher).await;
    app.user("carla", Role::Administrator).await;

    let (_, sent) = app
        .request(
            "POST",
            "/api/messages",
            Some("ana"),
            Some(json!({ "subject": "Help", "body": "question", "recipientId": teacher.id })),
        )
        .await;
    let id = sent["id"].as_str().unwrap().to_string();

    let (status, received) = app
        .request("GET", "/api/messages/received", Some("bruno"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(received[0]["id"], id.as_str());
    assert_eq!(received[0]["sender"]["username"], "ana");
    assert!(received[0].get("recipient").is_none());

    // Only the recipient can mark read, and only once.
    let read_uri = format!("/api/messages/{id}/read");
    let (status, _) = app.request("PUT", &read_uri, Some("ana"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = app.request("PUT", &read_uri, Some("bruno"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["read"], true);
    let (status, body) = app.request("PUT", &read_uri, Some("bruno"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    // Non-senders get NotFound, the sender may still edit a read message.
    let edit_uri = format!("/api/messages/{id}");
    let edit = json!({ "subject": "Help (edited)", "body": "question, rephrased" });
    let (status, _) = app
        .request("PUT", &edit_uri, Some("bruno"), Some(edit.clone()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = app.request("PUT", &edit_uri, Some("ana"), Some(edit)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subject"], "Help (edited)");
    assert_eq!(body["read"], true);

    // Outsiders cannot delete; participants can.
    let (status, _) = app.request("DELETE", &edit_uri, Some("carla"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = app.request("DELETE", &edit_uri, Some("bruno"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (_, sent) = app.request("GET", "/api/messages/sent", Some("ana"), None).await;
    assert!(sent.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn recipients_are_filtered_by_role() {
    let app = TestApp::new();
    app.user("ana", Role::Learner).await;
    app.user("beto", Role::Learner).await;
    app.user("bruno", Role::Teacher).await;
    app.user("carla", Role::Administrator).await;

    let (status, body) = app
        .request("GET", "/api/messages/recipients", Some("ana"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["bruno", "carla"]);

    let (_, body) = app
        .request("GET", "/api/messages/recipients", Some("carla"), None)
        .await;
    assert!(body.as_array().unwrap().is_empty());
}
