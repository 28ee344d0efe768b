// src/handlers/exam.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    grading,
    models::exam::{ExamListItem, ExamResponse, SubmitExamRequest},
    repo,
    utils::jwt::Claims,
};

/// Lists all exams with their question counts, newest first.
pub async fn list_exams(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let exams = sqlx::query_as::<_, ExamListItem>(
        "SELECT e.id, e.title, e.difficulty, COUNT(q.id) AS question_count, e.created_at
         FROM exams e
         LEFT JOIN questions q ON q.exam_id = e.id
         GROUP BY e.id
         ORDER BY e.id DESC",
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list exams: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(exams))
}

/// Fetches a single exam with its questions for taking.
/// Correct answers are stripped out by the public DTO.
pub async fn get_exam(
    State(pool): State<PgPool>,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let (exam, questions) = repo::fetch_exam_with_questions(&pool, exam_id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    Ok(Json(ExamResponse {
        id: exam.id,
        title: exam.title,
        difficulty: exam.difficulty,
        questions: questions.into_iter().map(Into::into).collect(),
    }))
}

/// Submits a user's exam answers and records the attempt.
///
/// * The exam must exist; otherwise 404 and nothing is persisted.
/// * Scoring is one point per case-insensitive letter match; questions the
///   user skipped simply score nothing. An empty answers map is valid and
///   scores 0.
/// * Every submission appends a new attempt; resubmitting is allowed and
///   creates another row.
pub async fn submit_exam(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
    Json(req): Json<SubmitExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (exam, questions) = repo::fetch_exam_with_questions(&pool, exam_id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    let score = grading::score(&questions, &req.answers);

    let attempt = repo::persist_attempt(&pool, claims.user_id(), exam.id, score)
        .await
        .map_err(|e| {
            tracing::error!("Failed to persist attempt: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "attempt_id": attempt.id,
            "exam_id": attempt.exam_id,
            "score": attempt.score,
            "total_questions": questions.len(),
        })),
    ))
}

/// The calling user's attempt history, newest first.
pub async fn my_attempts(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = repo::fetch_attempts_for_user(&pool, claims.user_id())
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch attempt history: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(attempts))
}
