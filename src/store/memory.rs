// src/store/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        answer::Answer,
        attempt::Attempt,
        question::{Choice, ChoiceDeletion, Question, QuestionBatch, QuestionDraft},
        score::{Score, Submission},
        test::Test,
        user::User,
    },
    store::{AttemptStore, CatalogStore, Store, UserStore},
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    tests: HashMap<Uuid, Test>,
    questions: HashMap<Uuid, Question>,
    choices: HashMap<Uuid, Choice>,
    // insertion-ordered, later rows win ties
    attempts: Vec<Attempt>,
    answers: Vec<Answer>,
    scores: Vec<Score>,
}

impl Tables {
    fn finish_open_attempt(
        &mut self,
        user_id: Uuid,
        test_id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> Option<Attempt> {
        let attempt = self
            .attempts
            .iter_mut()
            .filter(|a| a.user_id == user_id && a.test_id == test_id && !a.is_finished)
            .max_by_key(|a| a.started_at)?;

        attempt.finish(ended_at);
        Some(attempt.clone())
    }

    fn question_count(&self, test_id: Uuid) -> i64 {
        self.questions
            .values()
            .filter(|q| q.test_id == test_id)
            .count() as i64
    }

    fn remove_question(&mut self, id: Uuid) -> bool {
        self.choices.retain(|_, c| c.question_id != id);
        self.questions.remove(&id).is_some()
    }
}

/// In-process store behind one lock. Every method takes the lock once, so
/// multi-row writes are atomic with respect to other callers.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: User) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(format!(
                "Email '{}' already registered",
                user.email
            )));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let email = email.to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn create_test(&self, test: Test) -> AppResult<Test> {
        let mut tables = self.tables.write().await;
        if tables.tests.values().any(|t| t.name == test.name) {
            return Err(AppError::Conflict("test name already exist".to_string()));
        }
        tables.tests.insert(test.id, test.clone());
        Ok(test)
    }

    async fn find_test(&self, id: Uuid) -> AppResult<Option<Test>> {
        Ok(self.tables.read().await.tests.get(&id).cloned())
    }

    async fn list_tests(&self) -> AppResult<Vec<Test>> {
        let tables = self.tables.read().await;
        let mut tests: Vec<Test> = tables.tests.values().cloned().collect();
        tests.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        Ok(tests)
    }

    async fn update_test(&self, test: &Test) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if tables
            .tests
            .values()
            .any(|t| t.id != test.id && t.name == test.name)
        {
            return Err(AppError::Conflict("test name already exist".to_string()));
        }
        match tables.tests.get_mut(&test.id) {
            Some(existing) => {
                existing.name = test.name.clone();
                existing.description = test.description.clone();
                existing.total_question = test.total_question;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_test(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.tests.remove(&id).is_none() {
            return Ok(false);
        }

        let question_ids: Vec<Uuid> = tables
            .questions
            .values()
            .filter(|q| q.test_id == id)
            .map(|q| q.id)
            .collect();
        for question_id in question_ids {
            tables.remove_question(question_id);
        }

        tables.attempts.retain(|a| a.test_id != id);
        tables.answers.retain(|a| a.test_id != id);
        tables.scores.retain(|s| s.test_id != id);
        Ok(true)
    }

    async fn insert_questions(
        &self,
        test_id: Uuid,
        drafts: Vec<QuestionDraft>,
    ) -> AppResult<Option<QuestionBatch>> {
        let mut tables = self.tables.write().await;
        let Some(test) = tables.tests.get(&test_id) else {
            return Ok(None);
        };

        let capacity = test.remaining_capacity(tables.question_count(test_id));
        let dropped = drafts.len().saturating_sub(capacity);

        let mut created = Vec::new();
        for draft in drafts.into_iter().take(capacity) {
            created.push(draft.question.id);
            tables.questions.insert(draft.question.id, draft.question);
            for choice in draft.choices {
                tables.choices.insert(choice.id, choice);
            }
        }

        Ok(Some(QuestionBatch { created, dropped }))
    }

    async fn find_question(&self, id: Uuid) -> AppResult<Option<Question>> {
        Ok(self.tables.read().await.questions.get(&id).cloned())
    }

    async fn list_questions(&self, test_id: Uuid) -> AppResult<Vec<Question>> {
        let tables = self.tables.read().await;
        let mut questions: Vec<Question> = tables
            .questions
            .values()
            .filter(|q| q.test_id == test_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| q.created_at);
        Ok(questions)
    }

    async fn update_question(&self, question: &Question) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.questions.get_mut(&question.id) {
            Some(existing) => {
                existing.question = question.question.clone();
                existing.answer = question.answer.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_question(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.tables.write().await.remove_question(id))
    }

    async fn list_choices(&self, question_id: Uuid) -> AppResult<Vec<Choice>> {
        let tables = self.tables.read().await;
        let mut choices: Vec<Choice> = tables
            .choices
            .values()
            .filter(|c| c.question_id == question_id)
            .cloned()
            .collect();
        choices.sort_by_key(|c| c.key);
        Ok(choices)
    }

    async fn find_choice(&self, id: Uuid) -> AppResult<Option<Choice>> {
        Ok(self.tables.read().await.choices.get(&id).cloned())
    }

    async fn append_choice(&self, question_id: Uuid, text: String) -> AppResult<Option<Choice>> {
        let mut tables = self.tables.write().await;
        if !tables.questions.contains_key(&question_id) {
            return Ok(None);
        }

        let next_key = tables
            .choices
            .values()
            .filter(|c| c.question_id == question_id)
            .map(|c| c.key)
            .max()
            .unwrap_or(0)
            + 1;

        let choice = Choice {
            id: Uuid::new_v4(),
            question_id,
            choice: text,
            key: next_key,
            created_at: Utc::now(),
        };
        tables.choices.insert(choice.id, choice.clone());
        Ok(Some(choice))
    }

    async fn update_choice(&self, choice: &Choice) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.choices.get_mut(&choice.id) {
            Some(existing) => {
                existing.choice = choice.choice.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_choice(
        &self,
        question_id: Uuid,
        choice_id: Uuid,
        minimum: usize,
    ) -> AppResult<ChoiceDeletion> {
        let mut tables = self.tables.write().await;

        let belongs = tables
            .choices
            .get(&choice_id)
            .is_some_and(|c| c.question_id == question_id);
        if !belongs {
            return Ok(ChoiceDeletion::NotFound);
        }

        let total = tables
            .choices
            .values()
            .filter(|c| c.question_id == question_id)
            .count();
        if total <= minimum {
            return Ok(ChoiceDeletion::BelowMinimum);
        }

        tables.choices.remove(&choice_id);
        Ok(ChoiceDeletion::Deleted)
    }
}

#[async_trait]
impl AttemptStore for MemoryStore {
    async fn start_attempt(&self, attempt: Attempt) -> AppResult<Attempt> {
        let mut tables = self.tables.write().await;
        if let Some(open) = tables.attempts.iter().find(|a| {
            a.user_id == attempt.user_id && a.test_id == attempt.test_id && !a.is_finished
        }) {
            return Ok(open.clone());
        }
        tables.attempts.push(attempt.clone());
        Ok(attempt)
    }

    async fn finish_attempt(
        &self,
        user_id: Uuid,
        test_id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> AppResult<Option<Attempt>> {
        let mut tables = self.tables.write().await;
        Ok(tables.finish_open_attempt(user_id, test_id, ended_at))
    }

    async fn record_submission(&self, submission: Submission) -> AppResult<Option<Attempt>> {
        let mut tables = self.tables.write().await;
        let finished = tables.finish_open_attempt(
            submission.user_id,
            submission.test_id,
            submission.finished_at,
        );

        let mut score = submission.score;
        score.time_complete = finished.as_ref().and_then(|a| a.finish_time.clone());

        tables.answers.extend(submission.answers);
        tables.scores.push(score);
        Ok(finished)
    }

    async fn latest_score(&self, user_id: Uuid, test_id: Uuid) -> AppResult<Option<Score>> {
        let tables = self.tables.read().await;
        Ok(tables
            .scores
            .iter()
            .filter(|s| s.user_id == user_id && s.test_id == test_id)
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn latest_finished_attempt(
        &self,
        user_id: Uuid,
        test_id: Uuid,
    ) -> AppResult<Option<Attempt>> {
        let tables = self.tables.read().await;
        Ok(tables
            .attempts
            .iter()
            .filter(|a| a.user_id == user_id && a.test_id == test_id && a.is_finished)
            .max_by_key(|a| a.ended_at)
            .cloned())
    }

    async fn list_answers(&self, user_id: Uuid, test_id: Uuid) -> AppResult<Vec<Answer>> {
        let tables = self.tables.read().await;
        Ok(tables
            .answers
            .iter()
            .filter(|a| a.user_id == user_id && a.test_id == test_id)
            .cloned()
            .collect())
    }

    async fn list_scores(&self, user_id: Uuid, test_id: Uuid) -> AppResult<Vec<Score>> {
        let tables = self.tables.read().await;
        Ok(tables
            .scores
            .iter()
            .filter(|s| s.user_id == user_id && s.test_id == test_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn test_named(name: &str, total_question: i32) -> Test {
        Test {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: "desc".to_string(),
            total_question,
            created_at: Utc::now(),
        }
    }

    fn draft(test_id: Uuid, choices: usize) -> QuestionDraft {
        let question = Question {
            id: Uuid::new_v4(),
            test_id,
            question: "Capital of France?".to_string(),
            answer: "Paris".to_string(),
            created_at: Utc::now(),
        };
        let choices = (0..choices)
            .map(|i| Choice {
                id: Uuid::new_v4(),
                question_id: question.id,
                choice: format!("option {}", i),
                key: i as i32 + 1,
                created_at: Utc::now(),
            })
            .collect();
        QuestionDraft { question, choices }
    }

    #[tokio::test]
    async fn duplicate_test_name_conflicts() {
        let store = MemoryStore::new();
        store.create_test(test_named("Math", 1)).await.unwrap();
        let err = store.create_test(test_named("Math", 1)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn insert_questions_stops_at_capacity() {
        let store = MemoryStore::new();
        let test = store.create_test(test_named("Math", 2)).await.unwrap();

        let batch = store
            .insert_questions(test.id, vec![draft(test.id, 2), draft(test.id, 2), draft(test.id, 2)])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(batch.created.len(), 2);
        assert_eq!(batch.dropped, 1);
        assert_eq!(store.list_questions(test.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn insert_questions_on_missing_test_is_none() {
        let store = MemoryStore::new();
        let missing = Uuid::new_v4();
        assert!(
            store
                .insert_questions(missing, vec![draft(missing, 2)])
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn delete_choice_respects_minimum() {
        let store = MemoryStore::new();
        let test = store.create_test(test_named("Math", 1)).await.unwrap();
        let d = draft(test.id, 2);
        let question_id = d.question.id;
        let first_choice = d.choices[0].id;
        store.insert_questions(test.id, vec![d]).await.unwrap();

        let outcome = store.delete_choice(question_id, first_choice, 2).await.unwrap();
        assert_eq!(outcome, ChoiceDeletion::BelowMinimum);
        assert_eq!(store.list_choices(question_id).await.unwrap().len(), 2);

        let added = store
            .append_choice(question_id, "option 3".to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(added.key, 3);

        let outcome = store.delete_choice(question_id, first_choice, 2).await.unwrap();
        assert_eq!(outcome, ChoiceDeletion::Deleted);
        assert_eq!(store.list_choices(question_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn choice_of_another_question_is_not_found() {
        let store = MemoryStore::new();
        let test = store.create_test(test_named("Math", 2)).await.unwrap();
        let a = draft(test.id, 3);
        let b = draft(test.id, 3);
        let (a_id, b_choice) = (a.question.id, b.choices[0].id);
        store.insert_questions(test.id, vec![a, b]).await.unwrap();

        let outcome = store.delete_choice(a_id, b_choice, 2).await.unwrap();
        assert_eq!(outcome, ChoiceDeletion::NotFound);
    }

    #[tokio::test]
    async fn second_start_returns_open_attempt() {
        let store = MemoryStore::new();
        let (user, test) = (Uuid::new_v4(), Uuid::new_v4());
        let now = Utc::now();

        let first = store.start_attempt(Attempt::start(user, test, now)).await.unwrap();
        let second = store
            .start_attempt(Attempt::start(user, test, now + TimeDelta::seconds(5)))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn finish_without_open_attempt_is_none() {
        let store = MemoryStore::new();
        let finished = store
            .finish_attempt(Uuid::new_v4(), Uuid::new_v4(), Utc::now())
            .await
            .unwrap();
        assert!(finished.is_none());
    }

    #[tokio::test]
    async fn delete_test_cascades() {
        let store = MemoryStore::new();
        let test = store.create_test(test_named("Math", 1)).await.unwrap();
        let d = draft(test.id, 2);
        let question_id = d.question.id;
        store.insert_questions(test.id, vec![d]).await.unwrap();
        store
            .start_attempt(Attempt::start(Uuid::new_v4(), test.id, Utc::now()))
            .await
            .unwrap();

        assert!(store.delete_test(test.id).await.unwrap());
        assert!(store.find_question(question_id).await.unwrap().is_none());
        assert!(store.list_choices(question_id).await.unwrap().is_empty());
        assert!(!store.delete_test(test.id).await.unwrap());
    }

    fn submission(user_id: Uuid, test_id: Uuid, points: i32, at: DateTime<Utc>) -> Submission {
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
    async fn equal_timestamps_resolve_to_last_insert() {
        let store = MemoryStore::new();
        let (user, test) = (Uuid::new_v4(), Uuid::new_v4());
        let now = Utc::now();

        store.record_submission(submission(user, test, 4, now)).await.unwrap();
        store.record_submission(submission(user, test, -2, now)).await.unwrap();

        let latest = store.latest_score(user, test).await.unwrap().unwrap();
        assert_eq!(latest.score, -2);
    }

    #[tokio::test]
    async fn score_keeps_time_of_the_attempt_it_finished() {
        let store = MemoryStore::new();
        let (user, test) = (Uuid::new_v4(), Uuid::new_v4());
        let start = Utc::now();

        store.start_attempt(Attempt::start(user, test, start)).await.unwrap();
        let first_at = start + TimeDelta::hours(2);
        store.record_submission(submission(user, test, 4, first_at)).await.unwrap();
        store
            .record_submission(submission(user, test, 4, first_at + TimeDelta::seconds(5)))
            .await
            .unwrap();

        let scores = store.list_scores(user, test).await.unwrap();
        assert_eq!(scores[0].time_complete.as_deref(), Some("02:00:00"));
        assert!(scores[1].time_complete.is_none());
    }
}
