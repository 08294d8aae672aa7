//! services/api/src/web/messages.rs
//!
//! REST handlers for the message router.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use classroom_core::{EditMessage, Identity, MessageView, SendMessage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::extract::{JsonBody, ResourceId};
use crate::web::rest::{reject, ErrorResponse, Rejection, UserSummaryResponse};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub subject: Option<String>,
    pub body: Option<String>,
    pub recipient_id: Option<Uuid>,
}

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct EditMessageRequest {
    pub subject: Option<String>,
    pub body: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: Uuid,
    pub subject: String,
    pub body: String,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<UserSummaryResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<UserSummaryResponse>,
}

impl From<MessageView> for MessageResponse {
    fn from(view: MessageView) -> Self {
        let message = view.message;
        Self {
            id: message.id,
            subject: message.subject,
            body: message.body,
            sender_id: message.sender_id,
            recipient_id: message.recipient_id,
            read: message.read,
            created_at: message.created_at,
            sender: view.sender.map(Into::into),
            recipient: view.recipient.map(Into::into),
        }
    }
}

fn responses(views: Vec<MessageView>) -> Json<Vec<MessageResponse>> {
    Json(views.into_iter().map(MessageResponse::from).collect())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/messages/received - Messages addressed to the caller, newest first
#[utoipa::path(
    get,
    path = "/api/messages/received",
    tag = "Messages",
    responses(
        (status = 200, description = "Received messages with their senders", body = [MessageResponse]),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn list_received_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Identity>,
) -> Result<impl IntoResponse, Rejection> {
    let views = state.messages.list_received(&caller).await.map_err(reject)?;
    Ok(responses(views))
}

/// GET /api/messages/sent - Messages the caller sent, newest first
#[utoipa::path(
    get,
    path = "/api/messages/sent",
    tag = "Messages",
    responses(
        (status = 200, description = "Sent messages with their recipients", body = [MessageResponse]),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn list_sent_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Identity>,
) -> Result<impl IntoResponse, Rejection> {
    let views = state.messages.list_sent(&caller).await.map_err(reject)?;
    Ok(responses(views))
}

/// GET /api/messages/recipients - Users the caller is allowed to message
#[utoipa::path(
    get,
    path = "/api/messages/recipients",
    tag = "Messages",
    responses(
        (status = 200, description = "Eligible recipients ordered by username", body = [UserSummaryResponse]),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn list_recipients_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Identity>,
) -> Result<impl IntoResponse, Rejection> {
    let users = state.messages.list_recipients(&caller).await.map_err(reject)?;
    let body: Vec<UserSummaryResponse> = users.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// POST /api/messages - Send a message
#[utoipa::path(
    post,
    path = "/api/messages",
    tag = "Messages",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message sent", body = MessageResponse),
        (status = 400, description = "Missing subject, body or recipient", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "The role matrix forbids this send", body = ErrorResponse),
        (status = 404, description = "Recipient or sender not found", body = ErrorResponse)
    )
)]
pub async fn send_message_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Identity>,
    JsonBody(req): JsonBody<SendMessageRequest>,
) -> Result<impl IntoResponse, Rejection> {
    let request = SendMessage {
        subject: req.subject,
        body: req.body,
        recipient_id: req.recipient_id,
    };
    let view = state.messages.send(&caller, request).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(MessageResponse::from(view))))
}

/// PUT /api/messages/{id} - Edit a message the caller sent
#[utoipa::path(
    put,
    path = "/api/messages/{id}",
    tag = "Messages",
    request_body = EditMessageRequest,
    params(("id" = Uuid, Path, description = "Message id")),
    responses(
        (status = 200, description = "Message updated", body = MessageResponse),
        (status = 400, description = "Missing subject or body", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Not found or not sent by the caller", body = ErrorResponse)
    )
)]
pub async fn edit_message_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Identity>,
    ResourceId(id): ResourceId,
    JsonBody(req): JsonBody<EditMessageRequest>,
) -> Result<impl IntoResponse, Rejection> {
    let request = EditMessage {
        subject: req.subject,
        body: req.body,
    };
    let view = state.messages.edit(&caller, id, request).await.map_err(reject)?;
    Ok(Json(MessageResponse::from(view)))
}

/// PUT /api/messages/{id}/read - Mark a received message as read
#[utoipa::path(
    put,
    path = "/api/messages/{id}/read",
    tag = "Messages",
    params(("id" = Uuid, Path, description = "Message id")),
    responses(
        (status = 200, description = "Message marked as read", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Not found, not addressed to the caller, or already read", body = ErrorResponse)
    )
)]
pub async fn mark_read_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Identity>,
    ResourceId(id): ResourceId,
) -> Result<impl IntoResponse, Rejection> {
    let view = state.messages.mark_read(&caller, id).await.map_err(reject)?;
    Ok(Json(MessageResponse::from(view)))
}

/// DELETE /api/messages/{id} - Delete a message the caller sent or received
#[utoipa::path(
    delete,
    path = "/api/messages/{id}",
    tag = "Messages",
    params(("id" = Uuid, Path, description = "Message id")),
    responses(
        (status = 204, description = "Message deleted"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Not found or caller is not a participant", body = ErrorResponse)
    )
)]
pub async fn delete_message_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Identity>,
    ResourceId(id): ResourceId,
) -> Result<impl IntoResponse, Rejection> {
    state.messages.delete(&caller, id).await.map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}
