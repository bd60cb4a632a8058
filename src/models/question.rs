// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Fewest choices a question may ever be left with.
pub const MIN_CHOICES: usize = 2;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub test_id: Uuid,

    /// The prompt shown to participants.
    pub question: String,

    /// The canonical answer. Submissions must match it exactly.
    pub answer: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'question_choices' table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Choice {
    pub id: Uuid,
    pub question_id: Uuid,
    pub choice: String,

    /// 1-based ordinal within the question.
    pub key: i32,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A question and its choices, not yet persisted.
#[derive(Debug, Clone)]
pub struct QuestionDraft {
    pub question: Question,
    pub choices: Vec<Choice>,
}

/// Result of a capped question batch insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionBatch {
    /// Ids of the questions actually stored, in request order.
    pub created: Vec<Uuid>,
    /// Entries dropped because the test reached `total_question`.
    pub dropped: usize,
}

/// Outcome of a guarded choice deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceDeletion {
    Deleted,
    NotFound,
    BelowMinimum,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct NewChoice {
    #[validate(length(min = 1, max = 100))]
    pub choice: String,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct NewQuestion {
    #[validate(length(min = 1, max = 1000))]
    pub question: String,
    #[validate(length(min = 1, max = 100))]
    pub answer: String,
    #[validate(length(min = 2, message = "a question needs at least 2 choices"), nested)]
    pub choices: Vec<NewChoice>,
}

/// DTO for adding a batch of questions to a test.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionsRequest {
    pub test_id: Uuid,
    #[validate(length(min = 1), nested)]
    pub questions: Vec<NewQuestion>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    pub question_id: Uuid,
    #[validate(length(min = 1, max = 1000))]
    pub question: String,
    #[validate(length(min = 1, max = 100))]
    pub answer: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeleteQuestionRequest {
    pub question_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateChoiceRequest {
    pub question_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub choice: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateChoiceRequest {
    pub choice_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub choice: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeleteChoiceRequest {
    pub question_id: Uuid,
    pub choice_id: Uuid,
}

/// Question with its choices, for the admin detail view.
#[derive(Debug, Serialize)]
pub struct QuestionDetail {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub choices: Vec<Choice>,
}
