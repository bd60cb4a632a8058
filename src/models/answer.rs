// src/models/answer.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Represents the 'user_answers' table. Immutable once written.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Answer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub test_id: Uuid,

    /// Not a foreign key: a submission naming a missing question is still recorded.
    pub question_id: Uuid,

    pub answer: String,
    pub point: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AnswerInput {
    pub question_id: Uuid,

    /// Empty means "not answered".
    #[serde(default)]
    #[validate(length(max = 100))]
    pub answer: String,
}

/// DTO for submitting a batch of answers.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswersRequest {
    pub test_id: Uuid,
    #[validate(nested)]
    pub answers: Vec<AnswerInput>,
}
