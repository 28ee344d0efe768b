// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    config::{DEFAULT_QUESTION_COUNT, MAX_QUESTION_COUNT},
    error::AppError,
    generator::{Difficulty, MathGenerator},
    models::{
        exam::CreateExamRequest,
        question::{CreateQuestionRequest, UpdateQuestionRequest},
        user::User,
    },
    utils::jwt::Claims,
};

/// Lists all users in the system.
/// Admin only.
pub async fn list_users(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, User>(
        "SELECT id, username, email, password, role, created_at
         FROM users
         ORDER BY id DESC",
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(users))
}

/// Deletes a user by ID.
/// Admin only. Prevents deleting self.
pub async fn delete_user(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if id == claims.user_id() {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete user: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Creates a new exam populated with generated math questions.
///
/// The difficulty label is forgiving (unknown values degrade to easy); the
/// question count defaults when omitted. Exam and questions land in one
/// transaction so a generation or insert failure leaves nothing behind.
pub async fn create_exam(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let difficulty = Difficulty::parse(payload.difficulty.as_deref().unwrap_or("easy"));
    let count = payload
        .question_count
        .unwrap_or(DEFAULT_QUESTION_COUNT)
        .min(MAX_QUESTION_COUNT);

    let questions = MathGenerator::new().generate(difficulty, count)?;

    let mut tx = pool.begin().await?;

    let exam_id: i64 = sqlx::query_scalar(
        "INSERT INTO exams (title, difficulty, created_by)
         VALUES ($1, $2, $3)
         RETURNING id",
    )
    .bind(&payload.title)
    .bind(difficulty.as_str())
    .bind(claims.user_id())
    .fetch_one(&mut *tx)
    .await?;

    for q in &questions {
        sqlx::query(
            "INSERT INTO questions (exam_id, text, option_a, option_b, option_c, option_d, answer)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(exam_id)
        .bind(&q.text)
        .bind(&q.option_a)
        .bind(&q.option_b)
        .bind(&q.option_c)
        .bind(&q.option_d)
        .bind(q.answer.to_string())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        exam_id,
        difficulty = difficulty.as_str(),
        count = questions.len(),
        "generated exam"
    );

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": exam_id,
            "difficulty": difficulty.as_str(),
            "question_count": questions.len(),
        })),
    ))
}

/// Deletes an exam (and, via cascade, its questions) by ID.
/// Admin only.
pub async fn delete_exam(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM exams WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete exam: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Manually adds a question to an existing exam.
/// Admin only. The answer letter is stored uppercased.
pub async fn create_question(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let exam_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM exams WHERE id = $1")
        .bind(payload.exam_id)
        .fetch_optional(&pool)
        .await?;

    if exam_exists.is_none() {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO questions (exam_id, text, option_a, option_b, option_c, option_d, answer)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING id",
    )
    .bind(payload.exam_id)
    .bind(&payload.text)
    .bind(&payload.option_a)
    .bind(&payload.option_b)
    .bind(&payload.option_c)
    .bind(&payload.option_d)
    .bind(payload.answer.to_ascii_uppercase())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// Updates a question by ID.
/// Admin only.
pub async fn update_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if payload.text.is_none()
        && payload.option_a.is_none()
        && payload.option_b.is_none()
        && payload.option_c.is_none()
        && payload.option_d.is_none()
        && payload.answer.is_none()
    {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE questions SET ");
    let mut separated = builder.separated(", ");

    if let Some(text) = payload.text {
        separated.push("text = ");
        separated.push_bind_unseparated(text);
    }

    if let Some(option_a) = payload.option_a {
        separated.push("option_a = ");
        separated.push_bind_unseparated(option_a);
    }

    if let Some(option_b) = payload.option_b {
        separated.push("option_b = ");
        separated.push_bind_unseparated(option_b);
    }

    if let Some(option_c) = payload.option_c {
        separated.push("option_c = ");
        separated.push_bind_unseparated(option_c);
    }

    if let Some(option_d) = payload.option_d {
        separated.push("option_d = ");
        separated.push_bind_unseparated(option_d);
    }

    if let Some(answer) = payload.answer {
        separated.push("answer = ");
        separated.push_bind_unseparated(answer.to_ascii_uppercase());
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a question by ID.
/// Admin only.
pub async fn delete_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
