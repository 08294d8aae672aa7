//! crates/classroom_core/src/messaging.rs
//!
//! The message router: role-gated sending plus owner-scoped edit, mark-read and delete.
//!
//! Ownership checks are folded into a single scoped store call, so a caller outside
//! the scope sees exactly the same `NotFound` as for a message that does not exist.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Identity, Message, MessageView, NewMessage, UserSummary};
use crate::error::{ServiceError, ServiceResult};
use crate::permissions;
use crate::ports::{MessageRepository, UserDirectory};

/// A send request as it arrives from the outside; every field is optional until validated.
#[derive(Debug, Clone, Default)]
pub struct SendMessage {
    pub subject: Option<String>,
    pub body: Option<String>,
    pub recipient_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct EditMessage {
    pub subject: Option<String>,
    pub body: Option<String>,
}

pub struct MessageRouter {
    users: Arc<dyn UserDirectory>,
    messages: Arc<dyn MessageRepository>,
}

impl MessageRouter {
    pub fn new(users: Arc<dyn UserDirectory>, messages: Arc<dyn MessageRepository>) -> Self {
        Self { users, messages }
    }

    /// Messages addressed to the caller, newest first, each carrying its sender.
    pub async fn list_received(&self, caller: &Identity) -> ServiceResult<Vec<MessageView>> {
        let messages = self.messages.list_received(caller.id).await?;
        let senders = self.summaries(messages.iter().map(|m| m.sender_id)).await?;
        Ok(messages
            .into_iter()
            .map(|message| MessageView {
                sender: senders.get(&message.sender_id).cloned(),
                recipient: None,
                message,
            })
            .collect())
    }

    /// Messages the caller sent, newest first, each carrying its recipient.
    pub async fn list_sent(&self, caller: &Identity) -> ServiceResult<Vec<MessageView>> {
        let messages = self.messages.list_sent(caller.id).await?;
        let recipients = self.summaries(messages.iter().map(|m| m.recipient_id)).await?;
        Ok(messages
            .into_iter()
            .map(|message| MessageView {
                sender: None,
                recipient: recipients.get(&message.recipient_id).cloned(),
                message,
            })
            .collect())
    }

    /// Every user the caller is allowed to message, ordered by username.
    pub async fn list_recipients(&self, caller: &Identity) -> ServiceResult<Vec<UserSummary>> {
        let roles = permissions::allowed_recipients(caller.role);
        if roles.is_empty() {
            return Ok(Vec::new());
        }
        let users = self.users.list_users_by_roles(roles).await?;
        Ok(users.iter().map(UserSummary::from).collect())
    }

    pub async fn send(&self, caller: &Identity, request: SendMessage) -> ServiceResult<MessageView> {
        let (subject, body, recipient_id) = match (
            non_blank(request.subject),
            non_blank(request.body),
            request.recipient_id,
        ) {
            (Some(subject), Some(body), Some(recipient_id)) => (subject, body, recipient_id),
            _ => {
                return Err(ServiceError::invalid(
                    "Subject, body and recipient are required",
                ))
            }
        };

        let recipient = self
            .users
            .find_user(recipient_id)
            .await?
            .ok_or(ServiceError::RecipientNotFound)?;
        let sender = self
            .users
            .find_user(caller.id)
            .await?
            .ok_or(ServiceError::SenderNotFound)?;

        if !permissions::can_send(sender.role, recipient.role) {
            warn!(
                sender_id = %sender.id,
                sender_role = %sender.role,
                recipient_role = %recipient.role,
                "Message send denied by role matrix"
            );
            return Err(ServiceError::forbidden(permissions::denial_reason(sender.role)));
        }

        let message = self
            .messages
            .insert_message(NewMessage {
                subject,
                body,
                sender_id: sender.id,
                recipient_id: recipient.id,
            })
            .await?;
        info!(message_id = %message.id, sender_id = %sender.id, recipient_id = %recipient.id, "Message sent");

        Ok(MessageView {
            message,
            sender: Some(UserSummary::from(&sender)),
            recipient: Some(UserSummary::from(&recipient)),
        })
    }

    /// Rewrites subject and body. Only the original sender may do this.
    pub async fn edit(
        &self,
        caller: &Identity,
        message_id: Uuid,
        request: EditMessage,
    ) -> ServiceResult<MessageView> {
        let (subject, body) = match (non_blank(request.subject), non_blank(request.body)) {
            (Some(subject), Some(body)) => (subject, body),
            _ => return Err(ServiceError::invalid("Subject and body are required")),
        };

        let message = self
            .messages
            .update_as_sender(message_id, caller.id, &subject, &body)
            .await?
            .ok_or_else(|| {
                ServiceError::not_found("Message not found or you are not allowed to edit it")
            })?;
        self.with_parties(message).await
    }

    /// Marks an unread message addressed to the caller as read. A second call is `NotFound`.
    pub async fn mark_read(&self, caller: &Identity, message_id: Uuid) -> ServiceResult<MessageView> {
        let message = self
            .messages
            .mark_read_as_recipient(message_id, caller.id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Message not found or already marked as read"))?;
        self.with_parties(message).await
    }

    /// Deletes a message the caller either sent or received.
    pub async fn delete(&self, caller: &Identity, message_id: Uuid) -> ServiceResult<()> {
        if self.messages.delete_as_participant(message_id, caller.id).await? {
            info!(%message_id, user_id = %caller.id, "Message deleted");
            Ok(())
        } else {
            Err(ServiceError::not_found(
                "Message not found or you are not allowed to delete it",
            ))
        }
    }

    async fn with_parties(&self, message: Message) -> ServiceResult<MessageView> {
        let sender = self.users.find_user(message.sender_id).await?;
        let recipient = self.users.find_user(message.recipient_id).await?;
        Ok(MessageView {
            sender: sender.as_ref().map(UserSummary::from),
            recipient: recipient.as_ref().map(UserSummary::from),
            message,
        })
    }

    async fn summaries(
        &self,
        ids: impl Iterator<Item = Uuid>,
    ) -> ServiceResult<HashMap<Uuid, UserSummary>> {
        let mut found = HashMap::new();
        for id in ids {
            if found.contains_key(&id) {
                continue;
            }
            if let Some(user) = self.users.find_user(id).await? {
                found.insert(id, UserSummary::from(&user));
            }
        }
        Ok(found)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::memory::InMemoryStore;

    struct Fixture {
        store: Arc<InMemoryStore>,
        router: MessageRouter,
        learner: Identity,
        teacher: Identity,
        admin: Identity,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let learner: Identity = store.add_user("lucia", "Lucia Gomez", Role::Learner).await.into();
        let teacher: Identity = store.add_user("tomas", "Tomas Vidal", Role::Teacher).await.into();
        let admin: Identity = store.add_user("carla", "Carla Paz", Role::Administrator).await.into();
        let router = MessageRouter::new(store.clone(), store.clone());
        Fixture { store, router, learner, teacher, admin }
    }

    fn request(to: &Identity, subject: &str, body: &str) -> SendMessage {
        SendMessage {
            subject: Some(subject.to_string()),
            body: Some(body.to_string()),
            recipient_id: Some(to.id),
        }
    }

    #[tokio::test]
    async fn learner_message_to_teacher_carries_both_parties() {
        let f = fixture().await;
        let sent = f
            .router
            .send(&f.learner, request(&f.teacher, "Help", "question"))
            .await
            .unwrap();

        assert_eq!(sent.message.subject, "Help");
        assert!(!sent.message.read);
        assert_eq!(sent.sender.unwrap().username, "lucia");
        assert_eq!(sent.recipient.unwrap().role, Role::Teacher);
    }

    #[tokio::test]
    async fn administrators_are_told_they_cannot_send() {
        let f = fixture().await;
        let err = f
            .router
            .send(&f.admin, request(&f.teacher, "Hi", "there"))
            .await
            .unwrap_err();
        match err {
            ServiceError::Forbidden(reason) => assert!(reason.contains("Administrators cannot send")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn teachers_may_only_reach_administrators() {
        let f = fixture().await;
        let err = f
            .router
            .send(&f.teacher, request(&f.learner, "Grades", "posted"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(ref r) if r.contains("administrators")));

        f.router
            .send(&f.teacher, request(&f.admin, "Room", "booked"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unknown_recipient_persists_nothing() {
        let f = fixture().await;
        let err = f
            .router
            .send(
                &f.learner,
                SendMessage {
                    recipient_id: Some(Uuid::new_v4()),
                    ..request(&f.teacher, "Help", "question")
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::RecipientNotFound));
        assert!(f.router.list_sent(&f.learner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn caller_missing_from_directory_is_sender_not_found() {
        let f = fixture().await;
        let ghost = Identity {
            id: Uuid::new_v4(),
            role: Role::Learner,
            username: "ghost".to_string(),
            name: "Ghost".to_string(),
        };
        let err = f
            .router
            .send(&ghost, request(&f.teacher, "Boo", "!"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::SenderNotFound));
    }

    #[tokio::test]
    async fn blank_fields_are_invalid_input() {
        let f = fixture().await;
        let err = f
            .router
            .send(&f.learner, request(&f.teacher, "   ", "body"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = f
            .router
            .send(&f.learner, SendMessage::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn identical_sends_are_stored_separately_and_listed_newest_first() {
        let f = fixture().await;
        let first = f
            .router
            .send(&f.learner, request(&f.teacher, "Same", "content"))
            .await
            .unwrap();
        let second = f
            .router
            .send(&f.learner, request(&f.teacher, "Same", "content"))
            .await
            .unwrap();
        assert_ne!(first.message.id, second.message.id);

        let received = f.router.list_received(&f.teacher).await.unwrap();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].message.id, second.message.id);
        assert_eq!(received[0].sender.as_ref().unwrap().username, "lucia");
        assert!(received[0].recipient.is_none());

        let sent = f.router.list_sent(&f.learner).await.unwrap();
        assert_eq!(sent[1].message.id, first.message.id);
        assert_eq!(sent[1].recipient.as_ref().unwrap().username, "tomas");
    }

    #[tokio::test]
    async fn mark_read_twice_is_not_found_the_second_time() {
        let f = fixture().await;
        let sent = f
            .router
            .send(&f.learner, request(&f.teacher, "Help", "question"))
            .await
            .unwrap();

        let read = f.router.mark_read(&f.teacher, sent.message.id).await.unwrap();
        assert!(read.message.read);

        let again = f.router.mark_read(&f.teacher, sent.message.id).await.unwrap_err();
        assert!(matches!(again, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn only_the_recipient_can_mark_read() {
        let f = fixture().await;
        let sent = f
            .router
            .send(&f.learner, request(&f.teacher, "Help", "question"))
            .await
            .unwrap();
        let err = f.router.mark_read(&f.learner, sent.message.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn non_sender_edit_is_not_found_and_changes_nothing() {
        let f = fixture().await;
        let sent = f
            .router
            .send(&f.learner, request(&f.teacher, "Help", "question"))
            .await
            .unwrap();

        let edit = EditMessage {
            subject: Some("Hijacked".to_string()),
            body: Some("text".to_string()),
        };
        let err = f
            .router
            .edit(&f.teacher, sent.message.id, edit.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let stored = f.store.message(sent.message.id).await.unwrap();
        assert_eq!(stored.subject, "Help");

        let edited = f.router.edit(&f.learner, sent.message.id, edit).await.unwrap();
        assert_eq!(edited.message.subject, "Hijacked");
        assert_eq!(edited.message.body, "text");
    }

    #[tokio::test]
    async fn blank_edit_is_invalid_input_and_keeps_the_original() {
        let f = fixture().await;
        let sent = f
            .router
            .send(&f.learner, request(&f.teacher, "Help", "question"))
            .await
            .unwrap();

        for edit in [
            EditMessage { subject: Some("  ".to_string()), body: Some("text".to_string()) },
            EditMessage { subject: Some("Help".to_string()), body: None },
        ] {
            let err = f
                .router
                .edit(&f.learner, sent.message.id, edit)
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::InvalidInput(_)));
        }

        let stored = f.store.message(sent.message.id).await.unwrap();
        assert_eq!(stored.subject, "Help");
        assert_eq!(stored.body, "question");
    }

    #[tokio::test]
    async fn either_party_can_delete_but_nobody_else() {
        let f = fixture().await;
        let first = f
            .router
            .send(&f.learner, request(&f.teacher, "One", "1"))
            .await
            .unwrap();
        let second = f
            .router
            .send(&f.learner, request(&f.teacher, "Two", "2"))
            .await
            .unwrap();

        let err = f.router.delete(&f.admin, first.message.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        f.router.delete(&f.learner, first.message.id).await.unwrap();
        f.router.delete(&f.teacher, second.message.id).await.unwrap();
        assert!(f.router.list_received(&f.teacher).await.unwrap().is_empty());

        let err = f.router.delete(&f.learner, first.message.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn recipients_follow_the_role_matrix() {
        let f = fixture().await;
        let for_learner: Vec<_> = f
            .router
            .list_recipients(&f.learner)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(for_learner, vec!["carla", "tomas"]);

        let for_teacher = f.router.list_recipients(&f.teacher).await.unwrap();
        assert_eq!(for_teacher.len(), 1);
        assert_eq!(for_teacher[0].role, Role::Administrator);

        assert!(f.router.list_recipients(&f.admin).await.unwrap().is_empty());
    }
}
