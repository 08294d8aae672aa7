//! crates/classroom_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete identity provider, user directory and storage.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Answer, Assignment, Identity, Message, NewAssignment, NewMessage, Role, User,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves an opaque bearer token to the acting principal, if the token is live.
    async fn resolve_token(&self, token: &str) -> PortResult<Option<Identity>>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, user_id: Uuid) -> PortResult<Option<User>>;

    /// Every user holding one of `roles`, ordered by username.
    async fn list_users_by_roles(&self, roles: &[Role]) -> PortResult<Vec<User>>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn insert_message(&self, message: NewMessage) -> PortResult<Message>;

    /// Messages addressed to `recipient_id`, newest first.
    async fn list_received(&self, recipient_id: Uuid) -> PortResult<Vec<Message>>;

    /// Messages sent by `sender_id`, newest first.
    async fn list_sent(&self, sender_id: Uuid) -> PortResult<Vec<Message>>;

    /// Rewrites subject and body of `message_id` only if it was sent by `sender_id`.
    async fn update_as_sender(
        &self,
        message_id: Uuid,
        sender_id: Uuid,
        subject: &str,
        body: &str,
    ) -> PortResult<Option<Message>>;

    /// Flips `read` to true only if `message_id` is addressed to `recipient_id` and still unread.
    async fn mark_read_as_recipient(
        &self,
        message_id: Uuid,
        recipient_id: Uuid,
    ) -> PortResult<Option<Message>>;

    /// Deletes `message_id` only if `user_id` sent or received it. Returns whether a row went away.
    async fn delete_as_participant(&self, message_id: Uuid, user_id: Uuid) -> PortResult<bool>;
}

#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Persists the assignment and all its questions as one unit.
    async fn insert_assignment(&self, assignment: NewAssignment) -> PortResult<Assignment>;

    async fn get_assignment(&self, assignment_id: Uuid) -> PortResult<Option<Assignment>>;

    async fn list_assignments(&self) -> PortResult<Vec<Assignment>>;

    async fn list_by_author(&self, author_id: Uuid) -> PortResult<Vec<Assignment>>;

    /// Assignments whose author currently holds `role`, earliest due date first.
    async fn list_by_author_role(&self, role: Role) -> PortResult<Vec<Assignment>>;

    /// Inserts or replaces the answer keyed by `(assignment_id, question_index, answer.user_id)`.
    async fn upsert_answer(
        &self,
        assignment_id: Uuid,
        question_index: usize,
        answer: Answer,
    ) -> PortResult<()>;

    async fn set_completed(&self, assignment_id: Uuid, completed: bool) -> PortResult<()>;
}
