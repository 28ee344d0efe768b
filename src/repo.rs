// src/repo.rs
//
// Data-access functions the exam flows are built on. Queries are bound at
// runtime so the crate builds without a live database.

use sqlx::PgPool;

use crate::models::{
    attempt::{Attempt, AttemptHistoryEntry},
    exam::Exam,
    question::Question,
};

/// Fetches an exam together with its full question set (answers included;
/// callers decide what to expose). Returns `None` when the exam does not
/// exist.
pub async fn fetch_exam_with_questions(
    pool: &PgPool,
    exam_id: i64,
) -> Result<Option<(Exam, Vec<Question>)>, sqlx::Error> {
    let exam = sqlx::query_as::<_, Exam>(
        "SELECT id, title, difficulty, created_by, created_at FROM exams WHERE id = $1",
    )
    .bind(exam_id)
    .fetch_optional(pool)
    .await?;

    let Some(exam) = exam else {
        return Ok(None);
    };

    let questions = sqlx::query_as::<_, Question>(
        "SELECT id, exam_id, text, option_a, option_b, option_c, option_d, answer, created_at
         FROM questions WHERE exam_id = $1 ORDER BY id",
    )
    .bind(exam_id)
    .fetch_all(pool)
    .await?;

    Ok(Some((exam, questions)))
}

/// Records a graded submission. Append-only: every call inserts a fresh
/// row, so submitting twice yields two attempts.
pub async fn persist_attempt(
    pool: &PgPool,
    user_id: i64,
    exam_id: i64,
    score: i64,
) -> Result<Attempt, sqlx::Error> {
    sqlx::query_as::<_, Attempt>(
        "INSERT INTO attempts (user_id, exam_id, score)
         VALUES ($1, $2, $3)
         RETURNING id, user_id, exam_id, score, created_at",
    )
    .bind(user_id)
    .bind(exam_id)
    .bind(score)
    .fetch_one(pool)
    .await
}

/// A user's attempt history, newest first. Callers rely on the descending
/// creation-time order; id breaks ties within a timestamp.
pub async fn fetch_attempts_for_user(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<AttemptHistoryEntry>, sqlx::Error> {
    sqlx::query_as::<_, AttemptHistoryEntry>(
        "SELECT a.id, a.exam_id, e.title AS exam_title, a.score, a.created_at
         FROM attempts a
         JOIN exams e ON e.id = a.exam_id
         WHERE a.user_id = $1
         ORDER BY a.created_at DESC, a.id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
