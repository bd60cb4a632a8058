// src/services/submission_service.rs

use std::{collections::HashMap, sync::Arc};

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        answer::{Answer, SubmitAnswersRequest},
        score::{Score, Submission, SubmissionReceipt},
    },
    services::scoring::{Tally, score_answer},
    store::Store,
    utils::time::Clock,
};

/// Grades a batch of answers and closes the attempt.
#[derive(Clone)]
pub struct SubmissionService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl SubmissionService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Scores every answer, appends a score row and finishes the open
    /// attempt. Nothing is written when the test does not exist.
    pub async fn submit(
        &self,
        user_id: Uuid,
        req: SubmitAnswersRequest,
    ) -> AppResult<SubmissionReceipt> {
        let test_id = req.test_id;
        if self.store.find_test(test_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Test {} not found", test_id)));
        }

        // canonical answers keyed by question id, for this test only
        let canonical: HashMap<Uuid, String> = self
            .store
            .list_questions(test_id)
            .await?
            .into_iter()
            .map(|q| (q.id, q.answer))
            .collect();

        let now = self.clock.now();
        let mut tally = Tally::default();
        let mut answers = Vec::with_capacity(req.answers.len());

        for input in req.answers {
            let expected = match canonical.get(&input.question_id) {
                Some(answer) => answer.as_str(),
                None => {
                    tracing::warn!(
                        "Answer for unknown question {} on test {} scored against an empty answer",
                        input.question_id,
                        test_id
                    );
                    ""
                }
            };

            let verdict = score_answer(expected, &input.answer);
            tally.record(verdict);

            answers.push(Answer {
                id: Uuid::new_v4(),
                user_id,
                test_id,
                question_id: input.question_id,
                answer: input.answer,
                point: verdict.points(),
                created_at: now,
            });
        }

        let score = Score {
            id: Uuid::new_v4(),
            user_id,
            test_id,
            total_right_answered: tally.right,
            total_wrong_answered: tally.wrong,
            total_not_answered: tally.not_answered,
            score: tally.points,
            time_complete: None,
            created_at: now,
        };

        let finished = self
            .store
            .record_submission(Submission {
                user_id,
                test_id,
                answers,
                score,
                finished_at: now,
            })
            .await?;

        tracing::info!(
            "Submission scored: user={} test={} score={} ({} answers)",
            user_id,
            test_id,
            tally.points,
            tally.answered()
        );

        Ok(SubmissionReceipt {
            message: "success submit answers",
            total_right_answered: tally.right,
            total_wrong_answered: tally.wrong,
            total_not_answered: tally.not_answered,
            score: tally.points,
            time_complete: finished.and_then(|attempt| attempt.finish_time),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            answer::AnswerInput,
            attempt::Attempt,
            question::{Question, QuestionDraft},
            test::Test,
        },
        services::result_service::ResultService,
        store::{AttemptStore, CatalogStore, MemoryStore},
        utils::time::FixedClock,
    };
    use chrono::{TimeDelta, Utc};

    struct Fixture {
        store: Arc<MemoryStore>,
        clock: Arc<FixedClock>,
        service: SubmissionService,
        test_id: Uuid,
        question_id: Uuid,
    }

    /// A test with one question whose canonical answer is "Paris".
    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(Utc::now()));
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

        let question = Question {
            id: Uuid::new_v4(),
            test_id: test.id,
            question: "Capital of France?".to_string(),
            answer: "Paris".to_string(),
            created_at: Utc::now(),
        };
        let question_id = question.id;
        store
            .insert_questions(
                test.id,
                vec![QuestionDraft {
                    question,
                    choices: Vec::new(),
                }],
            )
            .await
            .unwrap();

        Fixture {
            service: SubmissionService::new(store.clone(), clock.clone()),
            store,
            clock,
            test_id: test.id,
            question_id,
        }
    }

    fn request(test_id: Uuid, answers: &[(Uuid, &str)]) -> SubmitAnswersRequest {
        SubmitAnswersRequest {
            test_id,
            answers: answers
                .iter()
                .map(|(question_id, answer)| AnswerInput {
                    question_id: *question_id,
                    answer: answer.to_string(),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn right_answer_scores_four() {
        let f = fixture().await;
        let user_id = Uuid::new_v4();

        let receipt = f
            .service
            .submit(user_id, request(f.test_id, &[(f.question_id, "Paris")]))
            .await
            .unwrap();

        assert_eq!(receipt.total_right_answered, 1);
        assert_eq!(receipt.total_wrong_answered, 0);
        assert_eq!(receipt.total_not_answered, 0);
        assert_eq!(receipt.score, 4);
    }

    #[tokio::test]
    async fn empty_answer_scores_zero() {
        let f = fixture().await;

        let receipt = f
            .service
            .submit(Uuid::new_v4(), request(f.test_id, &[(f.question_id, "")]))
            .await
            .unwrap();

        assert_eq!(receipt.total_not_answered, 1);
        assert_eq!(receipt.score, 0);
    }

    #[tokio::test]
    async fn wrong_answer_scores_minus_two() {
        let f = fixture().await;

        let receipt = f
            .service
            .submit(Uuid::new_v4(), request(f.test_id, &[(f.question_id, "London")]))
            .await
            .unwrap();

        assert_eq!(receipt.total_wrong_answered, 1);
        assert_eq!(receipt.score, -2);
    }

    #[tokio::test]
    async fn unknown_question_does_not_abort_batch() {
        let f = fixture().await;
        let user_id = Uuid::new_v4();

        let receipt = f
            .service
            .submit(
                user_id,
                request(
                    f.test_id,
                    &[(Uuid::new_v4(), "Berlin"), (f.question_id, "Paris")],
                ),
            )
            .await
            .unwrap();

        assert_eq!(receipt.total_right_answered, 1);
        assert_eq!(receipt.total_wrong_answered, 1);
        assert_eq!(receipt.score, 2);

        let answers = f.store.list_answers(user_id, f.test_id).await.unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers.iter().map(|a| a.point).sum::<i32>(), receipt.score);
    }

    #[tokio::test]
    async fn missing_test_persists_nothing() {
        let f = fixture().await;
        let user_id = Uuid::new_v4();
        let missing = Uuid::new_v4();

        let err = f
            .service
            .submit(user_id, request(missing, &[(f.question_id, "Paris")]))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert!(f.store.list_answers(user_id, missing).await.unwrap().is_empty());
        assert!(f.store.list_scores(user_id, missing).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn submission_finishes_open_attempt() {
        let f = fixture().await;
        let user_id = Uuid::new_v4();

        f.store
            .start_attempt(Attempt::start(user_id, f.test_id, f.clock.now()))
            .await
            .unwrap();
        f.clock.advance(TimeDelta::minutes(5));

        let receipt = f
            .service
            .submit(user_id, request(f.test_id, &[(f.question_id, "Paris")]))
            .await
            .unwrap();

        assert_eq!(receipt.time_complete.as_deref(), Some("00:05:00"));
        let attempt = f
            .store
            .latest_finished_attempt(user_id, f.test_id)
            .await
            .unwrap()
            .unwrap();
        assert!(attempt.is_finished);
    }

    #[tokio::test]
    async fn submission_without_attempt_still_scores() {
        let f = fixture().await;

        let receipt = f
            .service
            .submit(Uuid::new_v4(), request(f.test_id, &[(f.question_id, "Paris")]))
            .await
            .unwrap();

        assert_eq!(receipt.score, 4);
        assert!(receipt.time_complete.is_none());
    }

    #[tokio::test]
    async fn resubmission_does_not_borrow_earlier_attempt_time() {
        let f = fixture().await;
        let user_id = Uuid::new_v4();
        let results = ResultService::new(f.store.clone());

        f.store
            .start_attempt(Attempt::start(user_id, f.test_id, f.clock.now()))
            .await
            .unwrap();
        f.clock.advance(TimeDelta::hours(2));
        f.service
            .submit(user_id, request(f.test_id, &[(f.question_id, "Paris")]))
            .await
            .unwrap();
        let first = results.get_result(user_id, "alice", f.test_id).await.unwrap();
        assert_eq!(first.time_complete, "02:00:00");

        f.clock.advance(TimeDelta::seconds(5));
        let receipt = f
            .service
            .submit(user_id, request(f.test_id, &[(f.question_id, "London")]))
            .await
            .unwrap();
        assert!(receipt.time_complete.is_none());

        let latest = results.get_result(user_id, "alice", f.test_id).await.unwrap();
        assert_eq!(latest.score, -2);
        assert_eq!(latest.time_complete, "");
    }
}
