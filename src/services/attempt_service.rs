// src/services/attempt_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::attempt::Attempt,
    store::Store,
    utils::time::Clock,
};

/// Opens and closes timed attempts.
#[derive(Clone)]
pub struct AttemptService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl AttemptService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Starts an attempt on an existing test. When one is already open for
    /// the pair, that attempt is returned instead.
    pub async fn start(&self, user_id: Uuid, test_id: Uuid) -> AppResult<Attempt> {
        if self.store.find_test(test_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Test {} not found", test_id)));
        }

        let attempt = self
            .store
            .start_attempt(Attempt::start(user_id, test_id, self.clock.now()))
            .await?;

        tracing::info!(
            "Attempt {} open for user={} test={}",
            attempt.id,
            user_id,
            test_id
        );
        Ok(attempt)
    }

    /// Finishes the open attempt now. `None` when nothing was open.
    pub async fn finish(&self, user_id: Uuid, test_id: Uuid) -> AppResult<Option<Attempt>> {
        let finished = self
            .store
            .finish_attempt(user_id, test_id, self.clock.now())
            .await?;

        if finished.is_none() {
            tracing::warn!("No open attempt to finish: user={} test={}", user_id, test_id);
        }
        Ok(finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::test::Test,
        store::{CatalogStore, MemoryStore},
        utils::time::FixedClock,
    };
    use chrono::{TimeDelta, Utc};

    async fn setup() -> (AttemptService, Arc<FixedClock>, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let test = store
            .create_test(Test {
                id: Uuid::new_v4(),
                name: "Geography".to_string(),
                description: "Capitals".to_string(),
                total_question: 1,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        let clock = Arc::new(FixedClock::new(Utc::now()));
        (AttemptService::new(store, clock.clone()), clock, test.id)
    }

    #[tokio::test]
    async fn start_on_missing_test_is_not_found() {
        let (service, _, _) = setup().await;
        let err = service.start(Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn start_then_finish_records_elapsed() {
        let (service, clock, test_id) = setup().await;
        let user_id = Uuid::new_v4();

        let attempt = service.start(user_id, test_id).await.unwrap();
        assert!(!attempt.is_finished);

        clock.advance(TimeDelta::hours(1) + TimeDelta::seconds(30));
        let finished = service.finish(user_id, test_id).await.unwrap().unwrap();

        assert_eq!(finished.id, attempt.id);
        assert_eq!(finished.finish_time.as_deref(), Some("01:00:30"));
    }

    #[tokio::test]
    async fn restart_reuses_open_attempt() {
        let (service, _, test_id) = setup().await;
        let user_id = Uuid::new_v4();

        let first = service.start(user_id, test_id).await.unwrap();
        let second = service.start(user_id, test_id).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn finish_without_start_is_none() {
        let (service, _, test_id) = setup().await;
        assert!(service.finish(Uuid::new_v4(), test_id).await.unwrap().is_none());
    }
}
