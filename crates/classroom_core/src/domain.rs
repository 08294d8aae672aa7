//! crates/classroom_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Users and Identity
//=========================================================================================

/// The closed set of roles a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Learner,
    Teacher,
    Administrator,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Learner, Role::Teacher, Role::Administrator];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Learner => "learner",
            Role::Teacher => "teacher",
            Role::Administrator => "administrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "learner" => Ok(Role::Learner),
            "teacher" => Ok(Role::Teacher),
            "administrator" => Ok(Role::Administrator),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// A user record as owned by the external user directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub role: Role,
}

/// The resolved acting principal for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
    pub username: String,
    pub name: String,
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            role: user.role,
            username: user.username,
            name: user.name,
        }
    }
}

/// Minimal identity stamped onto messages and assignments when they are returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub role: Role,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

//=========================================================================================
// Messages
//=========================================================================================

/// A single message row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Uuid,
    pub subject: String,
    pub body: String,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// The data needed to persist a freshly sent message.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub subject: String,
    pub body: String,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
}

/// A message annotated with whichever counterpart identities the operation exposes.
#[derive(Debug, Clone)]
pub struct MessageView {
    pub message: Message,
    pub sender: Option<UserSummary>,
    pub recipient: Option<UserSummary>,
}

//=========================================================================================
// Assignments ("tareas")
//=========================================================================================

/// One selectable option of a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOption {
    pub text: String,
    pub is_correct: bool,
}

/// The current answer of one user to one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub user_id: Uuid,
    pub selected_option_index: usize,
    pub answered_at: DateTime<Utc>,
}

/// A multiple-choice question embedded in an assignment, addressed by its index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub text: String,
    pub options: Vec<QuizOption>,
    /// At most one entry per user.
    pub answers: Vec<Answer>,
}

/// A teacher-authored quiz with its embedded questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub questions: Vec<Question>,
    /// Reflects the progress of the most recent submitter only.
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// A structurally validated assignment, ready to be persisted in one unit.
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub title: String,
    pub description: Option<String>,
    pub due_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub questions: Vec<NewQuestion>,
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub text: String,
    pub options: Vec<QuizOption>,
}

/// An assignment joined with its author's identity.
#[derive(Debug, Clone)]
pub struct AssignmentView {
    pub assignment: Assignment,
    pub author: Option<UserSummary>,
}

/// Progress of a single learner through one assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LearnerProgress {
    pub answered: usize,
    pub total: usize,
    pub completed: bool,
}
