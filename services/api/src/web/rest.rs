//! services/api/src/web/rest.rs
//!
//! Shared REST plumbing: the OpenAPI master definition, the error body every
//! handler returns, and the identity payloads embedded in responses.

use axum::{http::StatusCode, response::Json};
use classroom_core::{Role, ServiceError, UserSummary};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::web::{assignments, messages};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        messages::list_received_handler,
        messages::list_sent_handler,
        messages::list_recipients_handler,
        messages::send_message_handler,
        messages::edit_message_handler,
        messages::mark_read_handler,
        messages::delete_message_handler,
        assignments::list_assignments_handler,
        assignments::list_my_assignments_handler,
        assignments::create_assignment_handler,
        assignments::submit_answer_handler,
        assignments::progress_handler,
    ),
    components(
        schemas(
            ErrorResponse,
            RoleName,
            UserSummaryResponse,
            messages::MessageResponse,
            messages::SendMessageRequest,
            messages::EditMessageRequest,
            assignments::AssignmentResponse,
            assignments::QuestionResponse,
            assignments::OptionPayload,
            assignments::AnswerResponse,
            assignments::CreateAssignmentRequest,
            assignments::QuestionRequest,
            assignments::SubmitAnswerRequest,
            assignments::ProgressResponse,
        )
    ),
    tags(
        (name = "Messages", description = "Role-gated messaging between learners, teachers and administrators."),
        (name = "Assignments", description = "Multiple-choice assignments and answer submission.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Errors
//=========================================================================================

/// The body returned with every failed request.
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ErrorResponse {
    /// Machine-usable error kind, e.g. `not_found`.
    pub error: String,
    pub message: String,
}

pub type Rejection = (StatusCode, Json<ErrorResponse>);

/// Maps a core error onto its HTTP status and JSON body.
///
/// Internal failures are logged in full and reported with a generic message.
pub fn reject(err: ServiceError) -> Rejection {
    let status = match &err {
        ServiceError::Unauthenticated => StatusCode::UNAUTHORIZED,
        ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
        ServiceError::NotFound(_)
        | ServiceError::RecipientNotFound
        | ServiceError::SenderNotFound => StatusCode::NOT_FOUND,
        ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let message = match &err {
        ServiceError::Internal(source) => {
            error!("Request failed with internal error: {:?}", source);
            "Internal server error".to_string()
        }
        other => other.to_string(),
    };
    (
        status,
        Json(ErrorResponse {
            error: err.kind().to_string(),
            message,
        }),
    )
}

//=========================================================================================
// Shared Payloads
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoleName {
    Learner,
    Teacher,
    Administrator,
}

impl From<Role> for RoleName {
    fn from(role: Role) -> Self {
        match role {
            Role::Learner => RoleName::Learner,
            Role::Teacher => RoleName::Teacher,
            Role::Administrator => RoleName::Administrator,
        }
    }
}

/// The identity stamped onto messages and assignments.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct UserSummaryResponse {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub role: RoleName,
}

impl From<UserSummary> for UserSummaryResponse {
    fn from(user: UserSummary) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            role: user.role.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classroom_core::PortError;

    #[test]
    fn internal_errors_hide_their_cause() {
        let (status, Json(body)) = reject(ServiceError::Internal(PortError::Unexpected(
            "connection reset by peer".to_string(),
        )));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "internal");
        assert!(!body.message.contains("connection reset"));
    }

    #[test]
    fn scoped_lookups_and_missing_parties_are_404() {
        for err in [
            ServiceError::not_found("Message not found"),
            ServiceError::RecipientNotFound,
            ServiceError::SenderNotFound,
        ] {
            assert_eq!(reject(err).0, StatusCode::NOT_FOUND);
        }
        assert_eq!(reject(ServiceError::Unauthenticated).0, StatusCode::UNAUTHORIZED);
    }
}
