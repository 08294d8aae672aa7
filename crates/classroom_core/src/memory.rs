//! crates/classroom_core/src/memory.rs
//!
//! An in-process adapter implementing every port. Backs the test suites and any
//! embedder that does not need durable storage.

use std::cmp::Reverse;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    Answer, Assignment, Identity, Message, NewAssignment, NewMessage, Question, Role, User,
};
use crate::ledger;
use crate::ports::{
    AssignmentRepository, IdentityProvider, MessageRepository, PortError, PortResult,
    UserDirectory,
};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    tokens: RwLock<HashMap<String, Uuid>>,
    /// Insertion order is kept so equal timestamps still list newest first.
    messages: RwLock<Vec<Message>>,
    assignments: RwLock<Vec<Assignment>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, username: &str, name: &str, role: Role) -> User {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            name: name.to_string(),
            role,
        };
        self.users.write().await.insert(user.id, user.clone());
        user
    }

    pub async fn set_role(&self, user_id: Uuid, role: Role) {
        if let Some(user) = self.users.write().await.get_mut(&user_id) {
            user.role = role;
        }
    }

    pub async fn issue_token(&self, token: &str, user_id: Uuid) {
        self.tokens.write().await.insert(token.to_string(), user_id);
    }

    pub async fn message(&self, message_id: Uuid) -> Option<Message> {
        self.messages
            .read()
            .await
            .iter()
            .find(|m| m.id == message_id)
            .cloned()
    }

    pub async fn assignment(&self, assignment_id: Uuid) -> Option<Assignment> {
        self.assignments
            .read()
            .await
            .iter()
            .find(|a| a.id == assignment_id)
            .cloned()
    }

    async fn messages_where(&self, keep: impl Fn(&Message) -> bool) -> Vec<Message> {
        let mut found: Vec<Message> = self
            .messages
            .read()
            .await
            .iter()
            .rev()
            .filter(|m| keep(*m))
            .cloned()
            .collect();
        found.sort_by_key(|m| Reverse(m.created_at));
        found
    }
}

#[async_trait]
impl IdentityProvider for InMemoryStore {
    async fn resolve_token(&self, token: &str) -> PortResult<Option<Identity>> {
        let Some(user_id) = self.tokens.read().await.get(token).copied() else {
            return Ok(None);
        };
        Ok(self.users.read().await.get(&user_id).cloned().map(Identity::from))
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn find_user(&self, user_id: Uuid) -> PortResult<Option<User>> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn list_users_by_roles(&self, roles: &[Role]) -> PortResult<Vec<User>> {
        let mut users: Vec<User> = self
            .users
            .read()
            .await
            .values()
            .filter(|u| roles.contains(&u.role))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }
}

#[async_trait]
impl MessageRepository for InMemoryStore {
    async fn insert_message(&self, message: NewMessage) -> PortResult<Message> {
        let message = Message {
            id: Uuid::new_v4(),
            subject: message.subject,
            body: message.body,
            sender_id: message.sender_id,
            recipient_id: message.recipient_id,
            read: false,
            created_at: Utc::now(),
        };
        self.messages.write().await.push(message.clone());
        Ok(message)
    }

    async fn list_received(&self, recipient_id: Uuid) -> PortResult<Vec<Message>> {
        Ok(self.messages_where(|m| m.recipient_id == recipient_id).await)
    }

    async fn list_sent(&self, sender_id: Uuid) -> PortResult<Vec<Message>> {
        Ok(self.messages_where(|m| m.sender_id == sender_id).await)
    }

    async fn update_as_sender(
        &self,
        message_id: Uuid,
        sender_id: Uuid,
        subject: &str,
        body: &str,
    ) -> PortResult<Option<Message>> {
        let mut messages = self.messages.write().await;
        Ok(messages
            .iter_mut()
            .find(|m| m.id == message_id && m.sender_id == sender_id)
            .map(|m| {
                m.subject = subject.to_string();
                m.body = body.to_string();
                m.clone()
            }))
    }

    async fn mark_read_as_recipient(
        &self,
        message_id: Uuid,
        recipient_id: Uuid,
    ) -> PortResult<Option<Message>> {
        let mut messages = self.messages.write().await;
        Ok(messages
            .iter_mut()
            .find(|m| m.id == message_id && m.recipient_id == recipient_id && !m.read)
            .map(|m| {
                m.read = true;
                m.clone()
            }))
    }

    async fn delete_as_participant(&self, message_id: Uuid, user_id: Uuid) -> PortResult<bool> {
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|m| {
            !(m.id == message_id && (m.sender_id == user_id || m.recipient_id == user_id))
        });
        Ok(messages.len() != before)
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryStore {
    async fn insert_assignment(&self, assignment: NewAssignment) -> PortResult<Assignment> {
        let assignment = Assignment {
            id: Uuid::new_v4(),
            title: assignment.title,
            description: assignment.description,
            due_at: assignment.due_at,
            author_id: assignment.author_id,
            questions: assignment
                .questions
                .into_iter()
                .map(|q| Question {
                    text: q.text,
                    options: q.options,
                    answers: Vec::new(),
                })
                .collect(),
            completed: false,
            created_at: Utc::now(),
        };
        self.assignments.write().await.push(assignment.clone());
        Ok(assignment)
    }

    async fn get_assignment(&self, assignment_id: Uuid) -> PortResult<Option<Assignment>> {
        Ok(self.assignment(assignment_id).await)
    }

    async fn list_assignments(&self) -> PortResult<Vec<Assignment>> {
        Ok(self.assignments.read().await.clone())
    }

    async fn list_by_author(&self, author_id: Uuid) -> PortResult<Vec<Assignment>> {
        Ok(self
            .assignments
            .read()
            .await
            .iter()
            .filter(|a| a.author_id == author_id)
            .cloned()
            .collect())
    }

    async fn list_by_author_role(&self, role: Role) -> PortResult<Vec<Assignment>> {
        let users = self.users.read().await;
        let mut found: Vec<Assignment> = self
            .assignments
            .read()
            .await
            .iter()
            .filter(|a| users.get(&a.author_id).is_some_and(|u| u.role == role))
            .cloned()
            .collect();
        found.sort_by_key(|a| a.due_at);
        Ok(found)
    }

    async fn upsert_answer(
        &self,
        assignment_id: Uuid,
        question_index: usize,
        answer: Answer,
    ) -> PortResult<()> {
        let mut assignments = self.assignments.write().await;
        let question = assignments
            .iter_mut()
            .find(|a| a.id == assignment_id)
            .and_then(|a| a.questions.get_mut(question_index))
            .ok_or_else(|| {
                PortError::NotFound(format!(
                    "Question {question_index} of assignment {assignment_id} not found"
                ))
            })?;
        ledger::record_answer(question, answer);
        Ok(())
    }

    async fn set_completed(&self, assignment_id: Uuid, completed: bool) -> PortResult<()> {
        let mut assignments = self.assignments.write().await;
        let assignment = assignments
            .iter_mut()
            .find(|a| a.id == assignment_id)
            .ok_or_else(|| PortError::NotFound(format!("Assignment {assignment_id} not found")))?;
        assignment.completed = completed;
        Ok(())
    }
}
