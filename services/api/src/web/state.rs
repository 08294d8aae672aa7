//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use classroom_core::ports::{
    AssignmentRepository, IdentityProvider, MessageRepository, UserDirectory,
};
use classroom_core::{MessageRouter, QuizStore};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityProvider>,
    pub messages: Arc<MessageRouter>,
    pub quizzes: Arc<QuizStore>,
}

impl AppState {
    /// Wires the core services over a single adapter that implements every port.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: IdentityProvider + UserDirectory + MessageRepository + AssignmentRepository + 'static,
    {
        Self {
            identity: store.clone(),
            messages: Arc::new(MessageRouter::new(store.clone(), store.clone())),
            quizzes: Arc::new(QuizStore::new(store.clone(), store)),
        }
    }
}
