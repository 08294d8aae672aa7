//! crates/classroom_core/src/quiz.rs
//!
//! The quiz store: authoring and visibility rules for assignments, and answer
//! submission through the ledger.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{
    Answer, Assignment, AssignmentView, Identity, LearnerProgress, NewAssignment, NewQuestion,
    QuizOption, Role, UserSummary,
};
use crate::error::{ServiceError, ServiceResult};
use crate::ledger;
use crate::ports::{AssignmentRepository, UserDirectory};

//=========================================================================================
// Requests
//=========================================================================================

/// An assignment as submitted for creation, before structural validation.
#[derive(Debug, Clone, Default)]
pub struct CreateAssignment {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub questions: Option<Vec<QuestionDraft>>,
}

#[derive(Debug, Clone, Default)]
pub struct QuestionDraft {
    pub text: Option<String>,
    pub options: Option<Vec<QuizOption>>,
}

/// Raw indices as received. They may be negative or out of range until checked.
#[derive(Debug, Clone, Copy)]
pub struct SubmitAnswer {
    pub question_index: i64,
    pub option_index: i64,
}

impl CreateAssignment {
    /// Checks the whole draft and produces an assignment that can be persisted in one unit.
    pub fn validate(self, author_id: Uuid) -> ServiceResult<NewAssignment> {
        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ServiceError::invalid("Missing title"))?;
        let due_at = self
            .due_at
            .ok_or_else(|| ServiceError::invalid("Missing due date"))?;
        let drafts = self
            .questions
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ServiceError::invalid("At least one question is required"))?;

        let questions = drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| draft.validate(index))
            .collect::<ServiceResult<Vec<_>>>()?;

        Ok(NewAssignment {
            title,
            description: self.description.filter(|d| !d.trim().is_empty()),
            due_at,
            author_id,
            questions,
        })
    }
}

impl QuestionDraft {
    fn validate(self, index: usize) -> ServiceResult<NewQuestion> {
        let text = self
            .text
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ServiceError::invalid(format!("Question {index}: text is required")))?;
        let options = self.options.filter(|o| !o.is_empty()).ok_or_else(|| {
            ServiceError::invalid(format!("Question {index}: at least one option is required"))
        })?;
        if options.iter().filter(|o| o.is_correct).count() != 1 {
            return Err(ServiceError::invalid(format!(
                "Question {index}: exactly one correct option is required"
            )));
        }
        Ok(NewQuestion { text, options })
    }
}

//=========================================================================================
// Per-assignment write serialisation
//=========================================================================================

/// One async mutex per assignment id, handed out on demand.
#[derive(Default)]
pub struct AssignmentLocks {
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl AssignmentLocks {
    pub async fn acquire(&self, assignment_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
            // Drop entries nobody is holding or waiting on.
            locks.retain(|id, lock| *id == assignment_id || Arc::strong_count(lock) > 1);
            locks.entry(assignment_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

//=========================================================================================
// QuizStore
//=========================================================================================

pub struct QuizStore {
    users: Arc<dyn UserDirectory>,
    assignments: Arc<dyn AssignmentRepository>,
    locks: AssignmentLocks,
}

impl QuizStore {
    pub fn new(users: Arc<dyn UserDirectory>, assignments: Arc<dyn AssignmentRepository>) -> Self {
        Self {
            users,
            assignments,
            locks: AssignmentLocks::default(),
        }
    }

    /// Every assignment with its author attached. Needs no identity.
    pub async fn list_all(&self) -> ServiceResult<Vec<AssignmentView>> {
        let assignments = self.assignments.list_assignments().await?;
        self.with_authors(assignments).await
    }

    /// Teachers see what they authored; learners see everything authored by a current
    /// teacher, earliest due date first; any other role sees nothing.
    pub async fn list_mine(&self, caller: &Identity) -> ServiceResult<Vec<AssignmentView>> {
        let assignments = match caller.role {
            Role::Teacher => self.assignments.list_by_author(caller.id).await?,
            Role::Learner => self.assignments.list_by_author_role(Role::Teacher).await?,
            Role::Administrator => Vec::new(),
        };
        self.with_authors(assignments).await
    }

    pub async fn create(
        &self,
        caller: &Identity,
        request: CreateAssignment,
    ) -> ServiceResult<AssignmentView> {
        let new_assignment = request.validate(caller.id).inspect_err(|err| {
            debug!(author_id = %caller.id, %err, "Rejected assignment draft");
        })?;
        let assignment = self.assignments.insert_assignment(new_assignment).await?;
        info!(
            assignment_id = %assignment.id,
            author_id = %caller.id,
            questions = assignment.questions.len(),
            "Assignment created"
        );
        self.with_author(assignment).await
    }

    /// Records the caller's answer to one question and recomputes the completion flag.
    ///
    /// Submissions to the same assignment are serialised; answers are stored per
    /// `(assignment, question, user)` so one learner never overwrites another.
    pub async fn submit_answer(
        &self,
        caller: &Identity,
        assignment_id: Uuid,
        request: SubmitAnswer,
    ) -> ServiceResult<AssignmentView> {
        if caller.role != Role::Learner {
            warn!(user_id = %caller.id, role = %caller.role, "Non-learner tried to answer");
            return Err(ServiceError::forbidden("Only learners can answer assignments"));
        }

        let _guard = self.locks.acquire(assignment_id).await;

        let mut assignment = self
            .assignments
            .get_assignment(assignment_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Assignment not found"))?;

        let question_index = checked_index(request.question_index, assignment.questions.len())
            .ok_or_else(|| ServiceError::invalid("Invalid question index"))?;
        let question = &mut assignment.questions[question_index];
        let option_index = checked_index(request.option_index, question.options.len())
            .ok_or_else(|| ServiceError::invalid("Invalid answer index"))?;

        let answer = Answer {
            user_id: caller.id,
            selected_option_index: option_index,
            answered_at: Utc::now(),
        };
        let update = ledger::record_answer(question, answer.clone());
        self.assignments
            .upsert_answer(assignment_id, question_index, answer)
            .await?;

        let completed = ledger::is_complete_for(&assignment.questions, caller.id);
        if completed != assignment.completed {
            self.assignments.set_completed(assignment_id, completed).await?;
            assignment.completed = completed;
        }
        info!(
            %assignment_id,
            learner_id = %caller.id,
            question_index,
            option_index,
            ?update,
            completed,
            "Answer recorded"
        );

        self.with_author(assignment).await
    }

    /// The caller's own progress through an assignment, derived from the ledger.
    pub async fn progress(
        &self,
        caller: &Identity,
        assignment_id: Uuid,
    ) -> ServiceResult<LearnerProgress> {
        let assignment = self
            .assignments
            .get_assignment(assignment_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Assignment not found"))?;
        Ok(ledger::progress_of(&assignment.questions, caller.id))
    }

    async fn with_author(&self, assignment: Assignment) -> ServiceResult<AssignmentView> {
        let author = self.users.find_user(assignment.author_id).await?;
        Ok(AssignmentView {
            author: author.as_ref().map(UserSummary::from),
            assignment,
        })
    }

    async fn with_authors(&self, assignments: Vec<Assignment>) -> ServiceResult<Vec<AssignmentView>> {
        let mut authors: HashMap<Uuid, Option<UserSummary>> = HashMap::new();
        let mut views = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            if !authors.contains_key(&assignment.author_id) {
                let author = self.users.find_user(assignment.author_id).await?;
                authors.insert(assignment.author_id, author.as_ref().map(UserSummary::from));
            }
            views.push(AssignmentView {
                author: authors.get(&assignment.author_id).cloned().flatten(),
                assignment,
            });
        }
        Ok(views)
    }
}

fn checked_index(raw: i64, len: usize) -> Option<usize> {
    usize::try_from(raw).ok().filter(|index| *index < len)
}
