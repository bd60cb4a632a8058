// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
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

const USER_COLUMNS: &str = "id, name, email, password, role, created_at";
const TEST_COLUMNS: &str = "id, name, description, total_question, created_at";
const QUESTION_COLUMNS: &str = "id, test_id, question, answer, created_at";
const CHOICE_COLUMNS: &str = "id, question_id, choice, key, created_at";
const ATTEMPT_COLUMNS: &str =
    "id, user_id, test_id, started_at, ended_at, is_finished, finish_time";
const ANSWER_COLUMNS: &str = "id, user_id, test_id, question_id, answer, point, created_at";
const SCORE_COLUMNS: &str = "id, user_id, test_id, total_right_answered, total_wrong_answered, \
                             total_not_answered, score, time_complete, created_at";

/// PostgreSQL-backed store. Each call acquires a pooled connection (or opens
/// a transaction) and gives it back on every exit path when dropped.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps a unique violation to a `Conflict` carrying `message`.
fn conflict_on_duplicate(err: sqlx::Error, message: String) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AppError::Conflict(message),
        _ => {
            tracing::error!("Store write failed: {:?}", err);
            AppError::from(err)
        }
    }
}

/// Finishes the most recently started open attempt for the pair, locking the
/// row for the rest of the surrounding transaction.
async fn finish_open_attempt(
    conn: &mut PgConnection,
    user_id: Uuid,
    test_id: Uuid,
    ended_at: DateTime<Utc>,
) -> Result<Option<Attempt>, sqlx::Error> {
    let open = sqlx::query_as::<_, Attempt>(&format!(
        "SELECT {ATTEMPT_COLUMNS} FROM user_attempts
         WHERE user_id = $1 AND test_id = $2 AND NOT is_finished
         ORDER BY started_at DESC
         LIMIT 1
         FOR UPDATE"
    ))
    .bind(user_id)
    .bind(test_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(mut attempt) = open else {
        return Ok(None);
    };

    attempt.finish(ended_at);

    sqlx::query(
        "UPDATE user_attempts SET is_finished = TRUE, ended_at = $1, finish_time = $2 WHERE id = $3",
    )
    .bind(attempt.ended_at)
    .bind(&attempt.finish_time)
    .bind(attempt.id)
    .execute(&mut *conn)
    .await?;

    Ok(Some(attempt))
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: User) -> AppResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, name, email, password, role, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.role)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_duplicate(e, format!("Email '{}' already registered", user.email)))
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn create_test(&self, test: Test) -> AppResult<Test> {
        sqlx::query_as::<_, Test>(&format!(
            "INSERT INTO tests (id, name, description, total_question, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {TEST_COLUMNS}"
        ))
        .bind(test.id)
        .bind(&test.name)
        .bind(&test.description)
        .bind(test.total_question)
        .bind(test.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_duplicate(e, "test name already exist".to_string()))
    }

    async fn find_test(&self, id: Uuid) -> AppResult<Option<Test>> {
        let test = sqlx::query_as::<_, Test>(&format!(
            "SELECT {TEST_COLUMNS} FROM tests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(test)
    }

    async fn list_tests(&self) -> AppResult<Vec<Test>> {
        let tests = sqlx::query_as::<_, Test>(&format!(
            "SELECT {TEST_COLUMNS} FROM tests ORDER BY created_at, name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(tests)
    }

    async fn update_test(&self, test: &Test) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE tests SET name = $1, description = $2, total_question = $3 WHERE id = $4",
        )
        .bind(&test.name)
        .bind(&test.description)
        .bind(test.total_question)
        .bind(test.id)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_duplicate(e, "test name already exist".to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_test(&self, id: Uuid) -> AppResult<bool> {
        // questions, choices, attempts, answers and scores go by ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM tests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_questions(
        &self,
        test_id: Uuid,
        drafts: Vec<QuestionDraft>,
    ) -> AppResult<Option<QuestionBatch>> {
        let mut tx = self.pool.begin().await?;

        // Lock the test so concurrent batches cannot overshoot the cap.
        let test = sqlx::query_as::<_, Test>(&format!(
            "SELECT {TEST_COLUMNS} FROM tests WHERE id = $1 FOR UPDATE"
        ))
        .bind(test_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(test) = test else {
            return Ok(None);
        };

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE test_id = $1")
            .bind(test_id)
            .fetch_one(&mut *tx)
            .await?;

        let capacity = test.remaining_capacity(existing);
        let dropped = drafts.len().saturating_sub(capacity);
        let mut created = Vec::new();

        for draft in drafts.into_iter().take(capacity) {
            let q = &draft.question;
            sqlx::query(
                "INSERT INTO questions (id, test_id, question, answer, created_at)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(q.id)
            .bind(q.test_id)
            .bind(&q.question)
            .bind(&q.answer)
            .bind(q.created_at)
            .execute(&mut *tx)
            .await?;

            for choice in &draft.choices {
                sqlx::query(
                    "INSERT INTO question_choices (id, question_id, choice, key, created_at)
                     VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(choice.id)
                .bind(choice.question_id)
                .bind(&choice.choice)
                .bind(choice.key)
                .bind(choice.created_at)
                .execute(&mut *tx)
                .await?;
            }

            created.push(q.id);
        }

        tx.commit().await?;
        Ok(Some(QuestionBatch { created, dropped }))
    }

    async fn find_question(&self, id: Uuid) -> AppResult<Option<Question>> {
        let question = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(question)
    }

    async fn list_questions(&self, test_id: Uuid) -> AppResult<Vec<Question>> {
        let questions = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE test_id = $1 ORDER BY created_at"
        ))
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }

    async fn update_question(&self, question: &Question) -> AppResult<bool> {
        let result = sqlx::query("UPDATE questions SET question = $1, answer = $2 WHERE id = $3")
            .bind(&question.question)
            .bind(&question.answer)
            .bind(question.id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_question(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_choices(&self, question_id: Uuid) -> AppResult<Vec<Choice>> {
        let choices = sqlx::query_as::<_, Choice>(&format!(
            "SELECT {CHOICE_COLUMNS} FROM question_choices WHERE question_id = $1 ORDER BY key"
        ))
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(choices)
    }

    async fn find_choice(&self, id: Uuid) -> AppResult<Option<Choice>> {
        let choice = sqlx::query_as::<_, Choice>(&format!(
            "SELECT {CHOICE_COLUMNS} FROM question_choices WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(choice)
    }

    async fn append_choice(&self, question_id: Uuid, text: String) -> AppResult<Option<Choice>> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM questions WHERE id = $1 FOR UPDATE")
                .bind(question_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let last_key: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(key), 0) FROM question_choices WHERE question_id = $1",
        )
        .bind(question_id)
        .fetch_one(&mut *tx)
        .await?;

        let choice = sqlx::query_as::<_, Choice>(&format!(
            "INSERT INTO question_choices (id, question_id, choice, key, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {CHOICE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(question_id)
        .bind(text)
        .bind(last_key + 1)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(choice))
    }

    async fn update_choice(&self, choice: &Choice) -> AppResult<bool> {
        let result = sqlx::query("UPDATE question_choices SET choice = $1 WHERE id = $2")
            .bind(&choice.choice)
            .bind(choice.id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_choice(
        &self,
        question_id: Uuid,
        choice_id: Uuid,
        minimum: usize,
    ) -> AppResult<ChoiceDeletion> {
        let mut tx = self.pool.begin().await?;

        // Serialize deletions per question so two callers cannot both pass the check.
        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM questions WHERE id = $1 FOR UPDATE")
                .bind(question_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(ChoiceDeletion::NotFound);
        }

        let belongs: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM question_choices WHERE id = $1 AND question_id = $2",
        )
        .bind(choice_id)
        .bind(question_id)
        .fetch_optional(&mut *tx)
        .await?;
        if belongs.is_none() {
            return Ok(ChoiceDeletion::NotFound);
        }

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM question_choices WHERE question_id = $1")
                .bind(question_id)
                .fetch_one(&mut *tx)
                .await?;
        if total <= minimum as i64 {
            return Ok(ChoiceDeletion::BelowMinimum);
        }

        sqlx::query("DELETE FROM question_choices WHERE id = $1")
            .bind(choice_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(ChoiceDeletion::Deleted)
    }
}

#[async_trait]
impl AttemptStore for PgStore {
    async fn start_attempt(&self, attempt: Attempt) -> AppResult<Attempt> {
        let inserted = sqlx::query_as::<_, Attempt>(&format!(
            "INSERT INTO user_attempts (id, user_id, test_id, started_at, ended_at, is_finished, finish_time)
             VALUES ($1, $2, $3, $4, NULL, FALSE, NULL)
             ON CONFLICT (user_id, test_id) WHERE NOT is_finished DO NOTHING
             RETURNING {ATTEMPT_COLUMNS}"
        ))
        .bind(attempt.id)
        .bind(attempt.user_id)
        .bind(attempt.test_id)
        .bind(attempt.started_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(attempt) = inserted {
            return Ok(attempt);
        }

        sqlx::query_as::<_, Attempt>(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM user_attempts
             WHERE user_id = $1 AND test_id = $2 AND NOT is_finished
             ORDER BY started_at DESC
             LIMIT 1"
        ))
        .bind(attempt.user_id)
        .bind(attempt.test_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Internal("open attempt vanished after conflict".to_string()))
    }

    async fn finish_attempt(
        &self,
        user_id: Uuid,
        test_id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> AppResult<Option<Attempt>> {
        let mut tx = self.pool.begin().await?;
        let finished = finish_open_attempt(&mut tx, user_id, test_id, ended_at).await?;
        tx.commit().await?;
        Ok(finished)
    }

    async fn record_submission(&self, submission: Submission) -> AppResult<Option<Attempt>> {
        let mut tx = self.pool.begin().await?;

        for answer in &submission.answers {
            sqlx::query(
                "INSERT INTO user_answers (id, user_id, test_id, question_id, answer, point, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(answer.id)
            .bind(answer.user_id)
            .bind(answer.test_id)
            .bind(answer.question_id)
            .bind(&answer.answer)
            .bind(answer.point)
            .bind(answer.created_at)
            .execute(&mut *tx)
            .await?;
        }

        let finished = finish_open_attempt(
            &mut tx,
            submission.user_id,
            submission.test_id,
            submission.finished_at,
        )
        .await?;
        let time_complete = finished.as_ref().and_then(|a| a.finish_time.as_deref());

        let score = &submission.score;
        sqlx::query(
            "INSERT INTO user_scores
             (id, user_id, test_id, total_right_answered, total_wrong_answered, total_not_answered,
              score, time_complete, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(score.id)
        .bind(score.user_id)
        .bind(score.test_id)
        .bind(score.total_right_answered)
        .bind(score.total_wrong_answered)
        .bind(score.total_not_answered)
        .bind(score.score)
        .bind(time_complete)
        .bind(score.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(finished)
    }

    async fn latest_score(&self, user_id: Uuid, test_id: Uuid) -> AppResult<Option<Score>> {
        let score = sqlx::query_as::<_, Score>(&format!(
            "SELECT {SCORE_COLUMNS} FROM user_scores
             WHERE user_id = $1 AND test_id = $2
             ORDER BY created_at DESC, seq DESC
             LIMIT 1"
        ))
        .bind(user_id)
        .bind(test_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(score)
    }

    async fn latest_finished_attempt(
        &self,
        user_id: Uuid,
        test_id: Uuid,
    ) -> AppResult<Option<Attempt>> {
        let attempt = sqlx::query_as::<_, Attempt>(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM user_attempts
             WHERE user_id = $1 AND test_id = $2 AND is_finished
             ORDER BY ended_at DESC
             LIMIT 1"
        ))
        .bind(user_id)
        .bind(test_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(attempt)
    }

    async fn list_answers(&self, user_id: Uuid, test_id: Uuid) -> AppResult<Vec<Answer>> {
        let answers = sqlx::query_as::<_, Answer>(&format!(
            "SELECT {ANSWER_COLUMNS} FROM user_answers
             WHERE user_id = $1 AND test_id = $2
             ORDER BY created_at"
        ))
        .bind(user_id)
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(answers)
    }

    async fn list_scores(&self, user_id: Uuid, test_id: Uuid) -> AppResult<Vec<Score>> {
        let scores = sqlx::query_as::<_, Score>(&format!(
            "SELECT {SCORE_COLUMNS} FROM user_scores
             WHERE user_id = $1 AND test_id = $2
             ORDER BY created_at, seq"
        ))
        .bind(user_id)
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(scores)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
