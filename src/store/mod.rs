// src/store/mod.rs

//! Persistence seams. Services only see these traits; `postgres` backs them
//! with sqlx, `memory` with in-process maps for tests and local runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        answer::Answer,
        attempt::Attempt,
        question::{Choice, ChoiceDeletion, Question, QuestionBatch, QuestionDraft},
        score::{Score, Submission},
        test::Test,
        user::User,
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, user: User) -> AppResult<User>;
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Fails with `Conflict` when the name is taken.
    async fn create_test(&self, test: Test) -> AppResult<Test>;
    async fn find_test(&self, id: Uuid) -> AppResult<Option<Test>>;
    async fn list_tests(&self) -> AppResult<Vec<Test>>;
    /// Returns false when the test does not exist.
    async fn update_test(&self, test: &Test) -> AppResult<bool>;
    /// Removes the test with its questions, choices and attempt history.
    async fn delete_test(&self, id: Uuid) -> AppResult<bool>;

    /// Inserts drafts in order until the test holds `total_question`
    /// questions; the rest are dropped. `None` when the test is missing.
    async fn insert_questions(
        &self,
        test_id: Uuid,
        drafts: Vec<QuestionDraft>,
    ) -> AppResult<Option<QuestionBatch>>;
    async fn find_question(&self, id: Uuid) -> AppResult<Option<Question>>;
    async fn list_questions(&self, test_id: Uuid) -> AppResult<Vec<Question>>;
    async fn update_question(&self, question: &Question) -> AppResult<bool>;
    async fn delete_question(&self, id: Uuid) -> AppResult<bool>;

    /// Choices of a question ordered by key.
    async fn list_choices(&self, question_id: Uuid) -> AppResult<Vec<Choice>>;
    async fn find_choice(&self, id: Uuid) -> AppResult<Option<Choice>>;
    /// Appends a choice with the next free key. `None` when the question is missing.
    async fn append_choice(&self, question_id: Uuid, text: String) -> AppResult<Option<Choice>>;
    async fn update_choice(&self, choice: &Choice) -> AppResult<bool>;
    /// Deletes the choice only while the question holds more than `minimum` choices.
    async fn delete_choice(
        &self,
        question_id: Uuid,
        choice_id: Uuid,
        minimum: usize,
    ) -> AppResult<ChoiceDeletion>;
}

#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Inserts the attempt unless one is already open for the same
    /// (user, test); in that case the open one is returned untouched.
    async fn start_attempt(&self, attempt: Attempt) -> AppResult<Attempt>;

    /// Finishes the most recently started open attempt for the pair.
    async fn finish_attempt(
        &self,
        user_id: Uuid,
        test_id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> AppResult<Option<Attempt>>;

    /// Writes answers and score and finishes the open attempt atomically.
    /// Returns the finished attempt, if one was open.
    async fn record_submission(&self, submission: Submission) -> AppResult<Option<Attempt>>;

    async fn latest_score(&self, user_id: Uuid, test_id: Uuid) -> AppResult<Option<Score>>;
    async fn latest_finished_attempt(
        &self,
        user_id: Uuid,
        test_id: Uuid,
    ) -> AppResult<Option<Attempt>>;
    async fn list_answers(&self, user_id: Uuid, test_id: Uuid) -> AppResult<Vec<Answer>>;
    async fn list_scores(&self, user_id: Uuid, test_id: Uuid) -> AppResult<Vec<Score>>;
}

/// Full persistence surface handed to the application.
#[async_trait]
pub trait Store: UserStore + CatalogStore + AttemptStore {
    async fn health_check(&self) -> AppResult<()>;
}
