// src/grading.rs

use std::collections::HashMap;

use crate::models::question::Question;

/// Counts the questions whose submitted answer letter matches the stored
/// designator, case-insensitively.
///
/// Questions absent from the map simply score nothing, as do letters
/// outside A-D; neither is an error. The result is in `0..=questions.len()`
/// and the inputs are never mutated.
pub fn score(questions: &[Question], answers: &HashMap<i64, String>) -> i64 {
    questions
        .iter()
        .filter(|q| {
            answers
                .get(&q.id)
                .is_some_and(|submitted| submitted.eq_ignore_ascii_case(&q.answer))
        })
        .count() as i64
}
