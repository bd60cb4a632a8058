// src/services/result_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::score::TestResult,
    store::Store,
};

/// Read-only view over the latest score of a (user, test) pair.
#[derive(Clone)]
pub struct ResultService {
    store: Arc<dyn Store>,
}

impl ResultService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Latest score with the elapsed time of the attempt it finished.
    /// `NotFound` when the user never submitted to this test.
    pub async fn get_result(&self, user_id: Uuid, name: &str, test_id: Uuid) -> AppResult<TestResult> {
        let score = self
            .store
            .latest_score(user_id, test_id)
            .await?
            .ok_or_else(|| AppError::NotFound("cannot find result for this test".to_string()))?;

        Ok(TestResult {
            id: score.id,
            user_id: score.user_id,
            name: name.to_string(),
            total_right_answered: score.total_right_answered,
            total_wrong_answered: score.total_wrong_answered,
            total_not_answered: score.total_not_answered,
            score: score.score,
            time_complete: score.time_complete.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::score::{Score, Submission},
        store::{AttemptStore, MemoryStore},
    };
    use chrono::{TimeDelta, Utc};

    fn submission(user_id: Uuid, test_id: Uuid, points: i32, at: chrono::DateTime<Utc>) -> Submission {
        Submission {
            user_id,
            test_id,
            answers: Vec::new(),
            score: Score {
                id: Uuid::new_v4(),
                user_id,
                test_id,
                total_right_answered: 0,
                total_wrong_answered: 0,
                total_not_answered: 0,
                score: points,
                time_complete: None,
                created_at: at,
            },
            finished_at: at,
        }
    }

    #[tokio::test]
    async fn no_submission_is_not_found() {
        let service = ResultService::new(Arc::new(MemoryStore::new()));
        let err = service
            .get_result(Uuid::new_v4(), "alice", Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn latest_score_wins() {
        let store = Arc::new(MemoryStore::new());
        let (user_id, test_id) = (Uuid::new_v4(), Uuid::new_v4());
        let now = Utc::now();

        store
            .record_submission(submission(user_id, test_id, 4, now))
            .await
            .unwrap();
        store
            .record_submission(submission(user_id, test_id, -2, now + TimeDelta::seconds(1)))
            .await
            .unwrap();

        let service = ResultService::new(store);
        let result = service.get_result(user_id, "alice", test_id).await.unwrap();
        assert_eq!(result.score, -2);
        assert_eq!(result.name, "alice");
        // no attempt was ever started
        assert_eq!(result.time_complete, "");
    }

    #[tokio::test]
    async fn repeated_reads_are_identical() {
        let store = Arc::new(MemoryStore::new());
        let (user_id, test_id) = (Uuid::new_v4(), Uuid::new_v4());
        store
            .record_submission(submission(user_id, test_id, 4, Utc::now()))
            .await
            .unwrap();

        let service = ResultService::new(store);
        let first = service.get_result(user_id, "alice", test_id).await.unwrap();
        let second = service.get_result(user_id, "alice", test_id).await.unwrap();
        assert_eq!(first, second);
    }
}
