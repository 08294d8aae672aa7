//! services/api/src/web/assignments.rs
//!
//! REST handlers for the quiz store.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use classroom_core::{
    AssignmentView, CreateAssignment, Identity, LearnerProgress, QuestionDraft, QuizOption,
    SubmitAnswer,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::extract::{JsonBody, ResourceId};
use crate::web::rest::{reject, ErrorResponse, Rejection, UserSummaryResponse};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OptionPayload {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRequest {
    pub text: Option<String>,
    pub options: Option<Vec<OptionPayload>>,
}

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub questions: Option<Vec<QuestionRequest>>,
}

#[derive(Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    pub question_index: i64,
    pub option_index: i64,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub user_id: Uuid,
    pub selected_option_index: usize,
    pub answered_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub text: String,
    pub options: Vec<OptionPayload>,
    pub answers: Vec<AnswerResponse>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub author: Option<UserSummaryResponse>,
    pub questions: Vec<QuestionResponse>,
    /// Completion of the most recent submitter; see the progress endpoint for per-learner state.
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub answered: usize,
    pub total: usize,
    pub completed: bool,
}

impl From<AssignmentView> for AssignmentResponse {
    fn from(view: AssignmentView) -> Self {
        let assignment = view.assignment;
        Self {
            id: assignment.id,
            title: assignment.title,
            description: assignment.description,
            due_at: assignment.due_at,
            author_id: assignment.author_id,
            author: view.author.map(Into::into),
            questions: assignment
                .questions
                .into_iter()
                .map(|q| QuestionResponse {
                    text: q.text,
                    options: q
                        .options
                        .into_iter()
                        .map(|o| OptionPayload {
                            text: o.text,
                            is_correct: o.is_correct,
                        })
                        .collect(),
                    answers: q
                        .answers
                        .into_iter()
                        .map(|a| AnswerResponse {
                            user_id: a.user_id,
                            selected_option_index: a.selected_option_index,
                            answered_at: a.answered_at,
                        })
                        .collect(),
                })
                .collect(),
            completed: assignment.completed,
            created_at: assignment.created_at,
        }
    }
}

impl From<LearnerProgress> for ProgressResponse {
    fn from(progress: LearnerProgress) -> Self {
        Self {
            answered: progress.answered,
            total: progress.total,
            completed: progress.completed,
        }
    }
}

impl From<CreateAssignmentRequest> for CreateAssignment {
    fn from(req: CreateAssignmentRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            due_at: req.due_at,
            questions: req.questions.map(|questions| {
                questions
                    .into_iter()
                    .map(|q| QuestionDraft {
                        text: q.text,
                        options: q.options.map(|options| {
                            options
                                .into_iter()
                                .map(|o| QuizOption {
                                    text: o.text,
                                    is_correct: o.is_correct,
                                })
                                .collect()
                        }),
                    })
                    .collect()
            }),
        }
    }
}

fn responses(views: Vec<AssignmentView>) -> Json<Vec<AssignmentResponse>> {
    Json(views.into_iter().map(AssignmentResponse::from).collect())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/tareas - Every assignment with its author
#[utoipa::path(
    get,
    path = "/api/tareas",
    tag = "Assignments",
    responses(
        (status = 200, description = "All assignments", body = [AssignmentResponse]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_assignments_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, Rejection> {
    let views = state.quizzes.list_all().await.map_err(reject)?;
    Ok(responses(views))
}

/// GET /api/tareas/mine - Assignments visible to the caller's role
#[utoipa::path(
    get,
    path = "/api/tareas/mine",
    tag = "Assignments",
    responses(
        (status = 200, description = "Authored assignments for teachers, teacher-authored assignments for learners", body = [AssignmentResponse]),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn list_my_assignments_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Identity>,
) -> Result<impl IntoResponse, Rejection> {
    let views = state.quizzes.list_mine(&caller).await.map_err(reject)?;
    Ok(responses(views))
}

/// POST /api/tareas - Create an assignment with its questions
#[utoipa::path(
    post,
    path = "/api/tareas",
    tag = "Assignments",
    request_body = CreateAssignmentRequest,
    responses(
        (status = 201, description = "Assignment created", body = AssignmentResponse),
        (status = 400, description = "Missing fields or malformed questions", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn create_assignment_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Identity>,
    JsonBody(req): JsonBody<CreateAssignmentRequest>,
) -> Result<impl IntoResponse, Rejection> {
    let view = state
        .quizzes
        .create(&caller, req.into())
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(AssignmentResponse::from(view))))
}

/// POST /api/tareas/{id}/answers - Record the caller's answer to one question
#[utoipa::path(
    post,
    path = "/api/tareas/{id}/answers",
    tag = "Assignments",
    request_body = SubmitAnswerRequest,
    params(("id" = Uuid, Path, description = "Assignment id")),
    responses(
        (status = 200, description = "Answer recorded", body = AssignmentResponse),
        (status = 400, description = "Question or option index out of range", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Only learners may answer", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse)
    )
)]
pub async fn submit_answer_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Identity>,
    ResourceId(id): ResourceId,
    JsonBody(req): JsonBody<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, Rejection> {
    let request = SubmitAnswer {
        question_index: req.question_index,
        option_index: req.option_index,
    };
    let view = state
        .quizzes
        .submit_answer(&caller, id, request)
        .await
        .map_err(reject)?;
    Ok(Json(AssignmentResponse::from(view)))
}

/// GET /api/tareas/{id}/progress - The caller's own progress through an assignment
#[utoipa::path(
    get,
    path = "/api/tareas/{id}/progress",
    tag = "Assignments",
    params(("id" = Uuid, Path, description = "Assignment id")),
    responses(
        (status = 200, description = "Answered and total question counts", body = ProgressResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse)
    )
)]
pub async fn progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Identity>,
    ResourceId(id): ResourceId,
) -> Result<impl IntoResponse, Rejection> {
    let progress = state.quizzes.progress(&caller, id).await.map_err(reject)?;
    Ok(Json(ProgressResponse::from(progress)))
}
