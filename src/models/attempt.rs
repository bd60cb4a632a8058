// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::utils::time::format_elapsed;

/// Represents the 'user_attempts' table.
/// One timed session of a user on a test.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Attempt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub test_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub is_finished: bool,

    /// Elapsed time as `HH:MM:SS`, set when the attempt finishes.
    pub finish_time: Option<String>,
}

impl Attempt {
    pub fn start(user_id: Uuid, test_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            test_id,
            started_at: now,
            ended_at: None,
            is_finished: false,
            finish_time: None,
        }
    }

    /// Marks the attempt finished at `ended_at` and records the elapsed time.
    pub fn finish(&mut self, ended_at: DateTime<Utc>) {
        self.is_finished = true;
        self.ended_at = Some(ended_at);
        self.finish_time = Some(format_elapsed(ended_at - self.started_at));
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct StartAttemptRequest {
    pub test_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn new_attempt_is_open() {
        let attempt = Attempt::start(Uuid::new_v4(), Uuid::new_v4(), Utc::now());
        assert!(!attempt.is_finished);
        assert!(attempt.ended_at.is_none());
        assert!(attempt.finish_time.is_none());
    }

    #[test]
    fn finish_records_elapsed_time() {
        let start = Utc::now();
        let mut attempt = Attempt::start(Uuid::new_v4(), Uuid::new_v4(), start);

        let end = start + TimeDelta::minutes(12) + TimeDelta::seconds(7);
        attempt.finish(end);

        assert!(attempt.is_finished);
        assert_eq!(attempt.ended_at, Some(end));
        assert_eq!(attempt.finish_time.as_deref(), Some("00:12:07"));
    }
}
