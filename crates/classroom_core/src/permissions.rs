//! crates/classroom_core/src/permissions.rs
//!
//! The static send-authorization table between roles.
//!
//! | sender        | may message              |
//! |---------------|--------------------------|
//! | learner       | teacher, administrator   |
//! | teacher       | administrator            |
//! | administrator | nobody                   |

use crate::domain::Role;

/// Returns whether a user holding `sender` may message a user holding `recipient`.
pub fn can_send(sender: Role, recipient: Role) -> bool {
    allowed_recipients(sender).contains(&recipient)
}

/// The roles `sender` may address, in table order.
pub fn allowed_recipients(sender: Role) -> &'static [Role] {
    match sender {
        Role::Learner => &[Role::Teacher, Role::Administrator],
        Role::Teacher => &[Role::Administrator],
        Role::Administrator => &[],
    }
}

/// The human-readable reason given when `sender` is refused.
pub fn denial_reason(sender: Role) -> &'static str {
    match sender {
        Role::Learner => "Learners may only send messages to teachers or administrators",
        Role::Teacher => "Teachers may only send messages to administrators",
        Role::Administrator => "Administrators cannot send messages",
    }
}
