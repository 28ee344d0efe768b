// src/models/exam.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::question::PublicQuestion;

/// Represents the 'exams' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Exam {
    pub id: i64,

    pub title: String,

    /// Difficulty label the exam was generated at: 'easy', 'medium',
    /// 'hard' or 'expert'.
    pub difficulty: String,

    /// The admin who authored the exam, if still around.
    pub created_by: Option<i64>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Row for the exam list view, joined with its question count.
#[derive(Debug, Serialize, FromRow)]
pub struct ExamListItem {
    pub id: i64,
    pub title: String,
    pub difficulty: String,
    pub question_count: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Full exam payload for taking the exam; answers stay hidden.
#[derive(Debug, Serialize)]
pub struct ExamResponse {
    pub id: i64,
    pub title: String,
    pub difficulty: String,
    pub questions: Vec<PublicQuestion>,
}

/// DTO for authoring an exam with generated questions.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExamRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// Free-form difficulty label; unrecognized values degrade to 'easy'.
    pub difficulty: Option<String>,

    #[validate(range(min = 1, max = 50))]
    pub question_count: Option<u32>,
}

/// DTO for submitting an exam attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitExamRequest {
    /// User's answers map.
    /// Key: Question ID (i64)
    /// Value: User's selected option letter (String)
    pub answers: std::collections::HashMap<i64, String>,
}
