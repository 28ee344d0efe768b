// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'attempts' table in the database.
///
/// One row per submission, created exactly once and never updated;
/// retaking an exam appends a new row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub user_id: i64,
    pub exam_id: i64,
    pub score: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Attempt history row joined with the exam title.
#[derive(Debug, Serialize, FromRow)]
pub struct AttemptHistoryEntry {
    pub id: i64,
    pub exam_id: i64,
    pub exam_title: String,
    pub score: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}
