//! crates/classroom_core/src/ledger.rs
//!
//! The answer ledger embedded in every question: one current answer per user,
//! plus the completion state derived from it.

use uuid::Uuid;

use crate::domain::{Answer, LearnerProgress, Question};

/// What `record_answer` did to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerUpdate {
    Inserted,
    Replaced,
}

/// Stores `answer` as the current answer of its user, replacing any previous one in place.
pub fn record_answer(question: &mut Question, answer: Answer) -> LedgerUpdate {
    match question
        .answers
        .iter_mut()
        .find(|existing| existing.user_id == answer.user_id)
    {
        Some(existing) => {
            *existing = answer;
            LedgerUpdate::Replaced
        }
        None => {
            question.answers.push(answer);
            LedgerUpdate::Inserted
        }
    }
}

pub fn answer_of(question: &Question, user_id: Uuid) -> Option<&Answer> {
    question.answers.iter().find(|a| a.user_id == user_id)
}

/// True when `user_id` has a current answer on every question.
pub fn is_complete_for(questions: &[Question], user_id: Uuid) -> bool {
    questions
        .iter()
        .all(|question| answer_of(question, user_id).is_some())
}

pub fn progress_of(questions: &[Question], user_id: Uuid) -> LearnerProgress {
    let answered = questions
        .iter()
        .filter(|question| answer_of(question, user_id).is_some())
        .count();
    LearnerProgress {
        answered,
        total: questions.len(),
        completed: answered == questions.len(),
    }
}
