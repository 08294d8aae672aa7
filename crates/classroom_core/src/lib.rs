pub mod domain;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod memory;
pub mod messaging;
pub mod permissions;
pub mod ports;
pub mod quiz;

pub use domain::{
    Answer, Assignment, AssignmentView, Identity, LearnerProgress, Message, MessageView,
    NewAssignment, NewMessage, NewQuestion, Question, QuizOption, Role, User, UserSummary,
};
pub use error::{ServiceError, ServiceResult};
pub use identity::authenticate;
pub use memory::InMemoryStore;
pub use messaging::{EditMessage, MessageRouter, SendMessage};
pub use ports::{
    AssignmentRepository, IdentityProvider, MessageRepository, PortError, PortResult,
    UserDirectory,
};
pub use quiz::{CreateAssignment, QuestionDraft, QuizStore, SubmitAnswer};
