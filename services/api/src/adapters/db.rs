//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of the
//! identity, directory and repository ports from the `core` crate. It handles all
//! interactions with the PostgreSQL database using `sqlx`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use classroom_core::domain::{
    Answer, Assignment, Identity, Message, NewAssignment, NewMessage, Question, QuizOption, Role,
    User,
};
use classroom_core::ports::{
    AssignmentRepository, IdentityProvider, MessageRepository, PortError, PortResult,
    UserDirectory,
};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements every storage-facing port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Loads the answer rows for `assignment_ids`, grouped per assignment and question.
    async fn answers_for(
        &self,
        assignment_ids: &[Uuid],
    ) -> PortResult<HashMap<(Uuid, usize), Vec<Answer>>> {
        let records = sqlx::query_as::<_, AnswerRecord>(
            "SELECT assignment_id, question_index, user_id, selected_option_index, answered_at \
             FROM assignment_answers WHERE assignment_id = ANY($1) \
             ORDER BY inserted_at ASC",
        )
        .bind(assignment_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let mut grouped: HashMap<(Uuid, usize), Vec<Answer>> = HashMap::new();
        for record in records {
            let key = (record.assignment_id, record.question_index as usize);
            grouped.entry(key).or_default().push(record.to_domain());
        }
        Ok(grouped)
    }

    /// Turns assignment rows into domain assignments with their answer ledgers attached.
    async fn hydrate(&self, records: Vec<AssignmentRecord>) -> PortResult<Vec<Assignment>> {
        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        let mut answers = if ids.is_empty() {
            HashMap::new()
        } else {
            self.answers_for(&ids).await?
        };
        Ok(records
            .into_iter()
            .map(|record| record.to_domain(&mut answers))
            .collect())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    username: String,
    name: String,
    role: String,
}
impl UserRecord {
    fn to_domain(self) -> PortResult<User> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(User {
            id: self.id,
            username: self.username,
            name: self.name,
            role,
        })
    }
}

#[derive(FromRow)]
struct MessageRecord {
    id: Uuid,
    subject: String,
    body: String,
    sender_id: Uuid,
    recipient_id: Uuid,
    read: bool,
    created_at: DateTime<Utc>,
}
impl MessageRecord {
    fn to_domain(self) -> Message {
        Message {
            id: self.id,
            subject: self.subject,
            body: self.body,
            sender_id: self.sender_id,
            recipient_id: self.recipient_id,
            read: self.read,
            created_at: self.created_at,
        }
    }
}

/// The nested shape stored in `assignments.questions`.
#[derive(Serialize, Deserialize)]
struct QuestionDocument {
    text: String,
    options: Vec<OptionDocument>,
}

#[derive(Serialize, Deserialize)]
struct OptionDocument {
    text: String,
    is_correct: bool,
}

#[derive(FromRow)]
struct AssignmentRecord {
    id: Uuid,
    title: String,
    description: Option<String>,
    due_at: DateTime<Utc>,
    author_id: Uuid,
    questions: Json<Vec<QuestionDocument>>,
    completed: bool,
    created_at: DateTime<Utc>,
}
impl AssignmentRecord {
    fn to_domain(self, answers: &mut HashMap<(Uuid, usize), Vec<Answer>>) -> Assignment {
        let id = self.id;
        let questions = self
            .questions
            .0
            .into_iter()
            .enumerate()
            .map(|(index, doc)| Question {
                text: doc.text,
                options: doc
                    .options
                    .into_iter()
                    .map(|o| QuizOption {
                        text: o.text,
                        is_correct: o.is_correct,
                    })
                    .collect(),
                answers: answers.remove(&(id, index)).unwrap_or_default(),
            })
            .collect();
        Assignment {
            id,
            title: self.title,
            description: self.description,
            due_at: self.due_at,
            author_id: self.author_id,
            questions,
            completed: self.completed,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct AnswerRecord {
    assignment_id: Uuid,
    question_index: i32,
    user_id: Uuid,
    selected_option_index: i32,
    answered_at: DateTime<Utc>,
}
impl AnswerRecord {
    fn to_domain(self) -> Answer {
        Answer {
            user_id: self.user_id,
            selected_option_index: self.selected_option_index as usize,
            answered_at: self.answered_at,
        }
    }
}

const MESSAGE_COLUMNS: &str = "id, subject, body, sender_id, recipient_id, read, created_at";
const ASSIGNMENT_COLUMNS: &str =
    "a.id, a.title, a.description, a.due_at, a.author_id, a.questions, a.completed, a.created_at";

//=========================================================================================
// Identity and Directory Implementations
//=========================================================================================

#[async_trait]
impl IdentityProvider for DbAdapter {
    async fn resolve_token(&self, token: &str) -> PortResult<Option<Identity>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT u.id, u.username, u.name, u.role FROM auth_sessions s \
             JOIN users u ON u.id = s.user_id \
             WHERE s.id = $1 AND s.expires_at > NOW()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        record
            .map(|r| r.to_domain().map(Identity::from))
            .transpose()
    }
}

#[async_trait]
impl UserDirectory for DbAdapter {
    async fn find_user(&self, user_id: Uuid) -> PortResult<Option<User>> {
        sqlx::query_as::<_, UserRecord>("SELECT id, username, name, role FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .map(UserRecord::to_domain)
            .transpose()
    }

    async fn list_users_by_roles(&self, roles: &[Role]) -> PortResult<Vec<User>> {
        let roles: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
        sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, name, role FROM users WHERE role = ANY($1) ORDER BY username ASC",
        )
        .bind(&roles)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?
        .into_iter()
        .map(UserRecord::to_domain)
        .collect()
    }
}

//=========================================================================================
// `MessageRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl MessageRepository for DbAdapter {
    async fn insert_message(&self, message: NewMessage) -> PortResult<Message> {
        let record = sqlx::query_as::<_, MessageRecord>(&format!(
            "INSERT INTO messages (id, subject, body, sender_id, recipient_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&message.subject)
        .bind(&message.body)
        .bind(message.sender_id)
        .bind(message.recipient_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_received(&self, recipient_id: Uuid) -> PortResult<Vec<Message>> {
        let records = sqlx::query_as::<_, MessageRecord>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE recipient_id = $1 ORDER BY created_at DESC"
        ))
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn list_sent(&self, sender_id: Uuid) -> PortResult<Vec<Message>> {
        let records = sqlx::query_as::<_, MessageRecord>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE sender_id = $1 ORDER BY created_at DESC"
        ))
        .bind(sender_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn update_as_sender(
        &self,
        message_id: Uuid,
        sender_id: Uuid,
        subject: &str,
        body: &str,
    ) -> PortResult<Option<Message>> {
        let record = sqlx::query_as::<_, MessageRecord>(&format!(
            "UPDATE messages SET subject = $3, body = $4 \
             WHERE id = $1 AND sender_id = $2 RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(message_id)
        .bind(sender_id)
        .bind(subject)
        .bind(body)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn mark_read_as_recipient(
        &self,
        message_id: Uuid,
        recipient_id: Uuid,
    ) -> PortResult<Option<Message>> {
        let record = sqlx::query_as::<_, MessageRecord>(&format!(
            "UPDATE messages SET read = TRUE \
             WHERE id = $1 AND recipient_id = $2 AND read = FALSE RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(message_id)
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn delete_as_participant(&self, message_id: Uuid, user_id: Uuid) -> PortResult<bool> {
        let result = sqlx::query(
            "DELETE FROM messages WHERE id = $1 AND (sender_id = $2 OR recipient_id = $2)",
        )
        .bind(message_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }
}

//=========================================================================================
// `AssignmentRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl AssignmentRepository for DbAdapter {
    async fn insert_assignment(&self, assignment: NewAssignment) -> PortResult<Assignment> {
        let questions: Vec<QuestionDocument> = assignment
            .questions
            .into_iter()
            .map(|q| QuestionDocument {
                text: q.text,
                options: q
                    .options
                    .into_iter()
                    .map(|o| OptionDocument {
                        text: o.text,
                        is_correct: o.is_correct,
                    })
                    .collect(),
            })
            .collect();

        let record = sqlx::query_as::<_, AssignmentRecord>(
            "INSERT INTO assignments AS a (id, title, description, due_at, author_id, questions) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING a.id, a.title, a.description, a.due_at, a.author_id, a.questions, a.completed, a.created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&assignment.title)
        .bind(&assignment.description)
        .bind(assignment.due_at)
        .bind(assignment.author_id)
        .bind(Json(questions))
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.to_domain(&mut HashMap::new()))
    }

    async fn get_assignment(&self, assignment_id: Uuid) -> PortResult<Option<Assignment>> {
        let record = sqlx::query_as::<_, AssignmentRecord>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments a WHERE a.id = $1"
        ))
        .bind(assignment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        match record {
            Some(record) => Ok(self.hydrate(vec![record]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_assignments(&self) -> PortResult<Vec<Assignment>> {
        let records = sqlx::query_as::<_, AssignmentRecord>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments a ORDER BY a.created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        self.hydrate(records).await
    }

    async fn list_by_author(&self, author_id: Uuid) -> PortResult<Vec<Assignment>> {
        let records = sqlx::query_as::<_, AssignmentRecord>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments a \
             WHERE a.author_id = $1 ORDER BY a.created_at ASC"
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        self.hydrate(records).await
    }

    async fn list_by_author_role(&self, role: Role) -> PortResult<Vec<Assignment>> {
        let records = sqlx::query_as::<_, AssignmentRecord>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments a \
             JOIN users u ON u.id = a.author_id \
             WHERE u.role = $1 ORDER BY a.due_at ASC"
        ))
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        self.hydrate(records).await
    }

    async fn upsert_answer(
        &self,
        assignment_id: Uuid,
        question_index: usize,
        answer: Answer,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO assignment_answers \
             (assignment_id, question_index, user_id, selected_option_index, answered_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (assignment_id, question_index, user_id) DO UPDATE \
             SET selected_option_index = EXCLUDED.selected_option_index, \
                 answered_at = EXCLUDED.answered_at",
        )
        .bind(assignment_id)
        .bind(question_index as i32)
        .bind(answer.user_id)
        .bind(answer.selected_option_index as i32)
        .bind(answer.answered_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn set_completed(&self, assignment_id: Uuid, completed: bool) -> PortResult<()> {
        let result = sqlx::query("UPDATE assignments SET completed = $2 WHERE id = $1")
            .bind(assignment_id)
            .bind(completed)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Assignment {} not found",
                assignment_id
            )));
        }
        Ok(())
    }
}
