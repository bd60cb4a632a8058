// src/models/score.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::answer::Answer;

/// Represents the 'user_scores' table.
/// Append-only: every full submission adds a row, the newest one wins.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Score {
    pub id: Uuid,
    pub user_id: Uuid,
    pub test_id: Uuid,
    pub total_right_answered: i32,
    pub total_wrong_answered: i32,
    pub total_not_answered: i32,
    pub score: i32,

    /// Elapsed time of the attempt this submission finished. Filled in by
    /// the store; `None` when no attempt was open.
    pub time_complete: Option<String>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Everything one submission writes, committed as a unit by the store.
#[derive(Debug, Clone)]
pub struct Submission {
    pub user_id: Uuid,
    pub test_id: Uuid,
    pub answers: Vec<Answer>,
    pub score: Score,
    pub finished_at: chrono::DateTime<chrono::Utc>,
}

/// Response to a submission.
#[derive(Debug, Serialize)]
pub struct SubmissionReceipt {
    pub message: &'static str,
    pub total_right_answered: i32,
    pub total_wrong_answered: i32,
    pub total_not_answered: i32,
    pub score: i32,
    /// `None` when no attempt was open for the test.
    pub time_complete: Option<String>,
}

/// Result view for a (user, test) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub total_right_answered: i32,
    pub total_wrong_answered: i32,
    pub total_not_answered: i32,
    pub score: i32,
    pub time_complete: String,
}
