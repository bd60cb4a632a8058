// src/services/catalog_service.rs

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        question::{
            Choice, ChoiceDeletion, CreateChoiceRequest, CreateQuestionsRequest,
            DeleteChoiceRequest, MIN_CHOICES, NewQuestion, Question, QuestionBatch,
            QuestionDetail, QuestionDraft, UpdateChoiceRequest, UpdateQuestionRequest,
        },
        test::{CreateTestRequest, Test, TestDetail, TestList, UpdateTestRequest},
    },
    store::Store,
    utils::html::clean_field,
};

// column limits, checked again after sanitising
const NAME_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 255;
const QUESTION_MAX: usize = 1000;
const CHOICE_MAX: usize = 100;

/// Admin-side authoring of tests, questions and choices.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create_test(&self, req: CreateTestRequest) -> AppResult<Test> {
        let test = Test {
            id: Uuid::new_v4(),
            name: clean_field("name", &req.name, NAME_MAX)?,
            description: clean_field("description", &req.description, DESCRIPTION_MAX)?,
            total_question: req.total_question,
            created_at: Utc::now(),
        };

        let test = self.store.create_test(test).await?;
        tracing::info!("Test created: {} ({})", test.name, test.id);
        Ok(test)
    }

    pub async fn list_tests(&self) -> AppResult<TestList> {
        let data = self.store.list_tests().await?;
        Ok(TestList {
            total: data.len(),
            data,
        })
    }

    /// Test with every question, choice and canonical answer.
    pub async fn test_detail(&self, test_id: Uuid) -> AppResult<TestDetail> {
        let test = self.require_test(test_id).await?;

        let mut questions = Vec::new();
        for question in self.store.list_questions(test_id).await? {
            let choices = self.store.list_choices(question.id).await?;
            questions.push(QuestionDetail {
                id: question.id,
                question: question.question,
                answer: question.answer,
                choices,
            });
        }

        Ok(TestDetail { test, questions })
    }

    pub async fn update_test(&self, req: UpdateTestRequest) -> AppResult<Test> {
        let mut test = self.require_test(req.test_id).await?;
        test.name = clean_field("name", &req.name, NAME_MAX)?;
        test.description = clean_field("description", &req.description, DESCRIPTION_MAX)?;
        test.total_question = req.total_question;

        if !self.store.update_test(&test).await? {
            return Err(test_not_found(req.test_id));
        }
        Ok(test)
    }

    pub async fn delete_test(&self, test_id: Uuid) -> AppResult<()> {
        if !self.store.delete_test(test_id).await? {
            return Err(test_not_found(test_id));
        }
        tracing::info!("Test deleted: {}", test_id);
        Ok(())
    }

    /// Adds questions until the test reaches its declared total. Extra
    /// entries are dropped; a test with no room left rejects the batch.
    pub async fn create_questions(&self, req: CreateQuestionsRequest) -> AppResult<QuestionBatch> {
        let test_id = req.test_id;
        let now = Utc::now();
        let drafts: Vec<QuestionDraft> = req
            .questions
            .into_iter()
            .zip(0..)
            // distinct timestamps keep request order when listing
            .map(|(q, i)| draft_question(test_id, q, now + TimeDelta::microseconds(i)))
            .collect::<AppResult<_>>()?;

        let batch = self
            .store
            .insert_questions(test_id, drafts)
            .await?
            .ok_or_else(|| test_not_found(test_id))?;

        if batch.created.is_empty() {
            return Err(AppError::Conflict("question is full for this test".to_string()));
        }
        if batch.dropped > 0 {
            tracing::warn!(
                "Test {} reached its question limit, {} question(s) dropped",
                test_id,
                batch.dropped
            );
        }
        Ok(batch)
    }

    pub async fn update_question(&self, req: UpdateQuestionRequest) -> AppResult<Question> {
        let mut question = self.require_question(req.question_id).await?;
        question.question = clean_field("question", &req.question, QUESTION_MAX)?;
        question.answer = req.answer;

        if !self.store.update_question(&question).await? {
            return Err(question_not_found(req.question_id));
        }
        Ok(question)
    }

    pub async fn delete_question(&self, question_id: Uuid) -> AppResult<()> {
        if !self.store.delete_question(question_id).await? {
            return Err(question_not_found(question_id));
        }
        Ok(())
    }

    pub async fn add_choice(&self, req: CreateChoiceRequest) -> AppResult<Choice> {
        let text = clean_field("choice", &req.choice, CHOICE_MAX)?;
        self.store
            .append_choice(req.question_id, text)
            .await?
            .ok_or_else(|| question_not_found(req.question_id))
    }

    pub async fn update_choice(&self, req: UpdateChoiceRequest) -> AppResult<Choice> {
        let mut choice = self
            .store
            .find_choice(req.choice_id)
            .await?
            .ok_or_else(|| choice_not_found(req.choice_id))?;
        choice.choice = clean_field("choice", &req.choice, CHOICE_MAX)?;

        if !self.store.update_choice(&choice).await? {
            return Err(choice_not_found(req.choice_id));
        }
        Ok(choice)
    }

    /// Removes a choice while leaving at least `MIN_CHOICES` on the question.
    pub async fn delete_choice(&self, req: DeleteChoiceRequest) -> AppResult<()> {
        match self
            .store
            .delete_choice(req.question_id, req.choice_id, MIN_CHOICES)
            .await?
        {
            ChoiceDeletion::Deleted => Ok(()),
            ChoiceDeletion::NotFound => Err(AppError::NotFound(format!(
                "Choice {} not found on question {}",
                req.choice_id, req.question_id
            ))),
            ChoiceDeletion::BelowMinimum => Err(AppError::Conflict(
                "minimum total choices is 2. add choice first and then delete one".to_string(),
            )),
        }
    }

    async fn require_test(&self, test_id: Uuid) -> AppResult<Test> {
        self.store
            .find_test(test_id)
            .await?
            .ok_or_else(|| test_not_found(test_id))
    }

    async fn require_question(&self, question_id: Uuid) -> AppResult<Question> {
        self.store
            .find_question(question_id)
            .await?
            .ok_or_else(|| question_not_found(question_id))
    }
}

fn draft_question(
    test_id: Uuid,
    new: NewQuestion,
    now: chrono::DateTime<Utc>,
) -> AppResult<QuestionDraft> {
    let question_id = Uuid::new_v4();
    let choices: Vec<Choice> = new
        .choices
        .into_iter()
        .zip(1..)
        .map(|(c, key)| -> AppResult<Choice> {
            Ok(Choice {
                id: Uuid::new_v4(),
                question_id,
                choice: clean_field("choice", &c.choice, CHOICE_MAX)?,
                key,
                created_at: now,
            })
        })
        .collect::<AppResult<_>>()?;

    Ok(QuestionDraft {
        question: Question {
            id: question_id,
            test_id,
            question: clean_field("question", &new.question, QUESTION_MAX)?,
            // stored verbatim, scoring compares it byte for byte
            answer: new.answer,
            created_at: now,
        },
        choices,
    })
}

fn test_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Test {} not found", id))
}

fn question_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Question {} not found", id))
}

fn choice_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Choice {} not found", id))
}
