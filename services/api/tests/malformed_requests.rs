mod common;

use axum::http::StatusCode;
use classroom_core::Role;
use common::TestApp;
use serde_json::{json, Value};

fn assert_error(status: StatusCode, body: &Value, expected: StatusCode, kind: &str) {
    assert_eq!(status, expected, "{body}");
    assert_eq!(body["error"], kind, "{body}");
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()), "{body}");
}

async fn created_assignment(app: &TestApp) -> String {
    let (_, created) = app
        .request(
            "POST",
            "/api/tareas",
            Some("bruno"),
            Some(json!({
                "title": "Capitals",
                "dueAt": "2030-01-01T00:00:00Z",
                "questions": [{
                    "text": "Capital of Peru?",
                    "options": [
                        { "text": "Quito", "isCorrect": false },
                        { "text": "Lima", "isCorrect": true }
                    ]
                }]
            })),
        )
        .await;
    created["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn unparseable_assignment_bodies_are_invalid_input() {
    let app = TestApp::new();
    app.user("bruno", Role::Teacher).await;

    let (status, body) = app
        .request(
            "POST",
            "/api/tareas",
            Some("bruno"),
            Some(json!({ "title": "Capitals", "dueAt": "tomorrow", "questions": [] })),
        )
        .await;
    assert_error(status, &body, StatusCode::BAD_REQUEST, "invalid_input");

    let (status, body) = app
        .request(
            "POST",
            "/api/tareas",
            Some("bruno"),
            Some(json!({ "title": "Capitals", "dueAt": "2030-01-01T00:00:00Z", "questions": "none" })),
        )
        .await;
    assert_error(status, &body, StatusCode::BAD_REQUEST, "invalid_input");

    let (_, all) = app.request("GET", "/api/tareas", None, None).await;
    assert!(all.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn answer_without_option_index_is_invalid_input() {
    let app = TestApp::new();
    app.user("bruno", Role::Teacher).await;
    app.user("ana", Role::Learner).await;
    let id = created_assignment(&app).await;

    let (status, body) = app
        .request(
            "POST",
            &format!("/api/tareas/{id}/answers"),
            Some("ana"),
            Some(json!({ "questionIndex": 0 })),
        )
        .await;
    assert_error(status, &body, StatusCode::BAD_REQUEST, "invalid_input");
    assert!(body["message"].as_str().unwrap().contains("optionIndex"));
}

#[tokio::test]
async fn non_uuid_recipient_is_invalid_input() {
    let app = TestApp::new();
    app.user("ana", Role::Learner).await;

    let (status, body) = app
        .request(
            "POST",
            "/api/messages",
            Some("ana"),
            Some(json!({ "subject": "Help", "body": "question", "recipientId": "nope" })),
        )
        .await;
    assert_error(status, &body, StatusCode::BAD_REQUEST, "invalid_input");
}

#[tokio::test]
async fn non_uuid_path_ids_are_not_found() {
    let app = TestApp::new();
    app.user("ana", Role::Learner).await;

    let edit = json!({ "subject": "Help", "body": "question" });
    let cases = [
        ("PUT", "/api/messages/not-a-uuid/read", None),
        ("PUT", "/api/messages/not-a-uuid", Some(edit)),
        ("DELETE", "/api/messages/not-a-uuid", None),
        ("GET", "/api/tareas/not-a-uuid/progress", None),
        (
            "POST",
            "/api/tareas/not-a-uuid/answers",
            Some(json!({ "questionIndex": 0, "optionIndex": 0 })),
        ),
    ];
    for (method, uri, body) in cases {
        let (status, response) = app.request(method, uri, Some("ana"), body).await;
        assert_error(status, &response, StatusCode::NOT_FOUND, "not_found");
    }
}

#[tokio::test]
async fn malformed_ids_still_require_identity_first() {
    let app = TestApp::new();

    let (status, body) = app
        .request("PUT", "/api/messages/not-a-uuid/read", None, None)
        .await;
    assert_error(status, &body, StatusCode::UNAUTHORIZED, "unauthenticated");
}
