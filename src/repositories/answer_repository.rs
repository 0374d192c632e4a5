use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::{self, Database},
    errors::AppResult,
    models::domain::UserAnswer,
};

/// Answers are append-only; there is no update or delete.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnswerRepository: Send + Sync {
    async fn create(&self, answer: UserAnswer) -> AppResult<UserAnswer>;
    /// `(total, correct)` submissions for a question.
    async fn count_for_question(&self, question_id: &str) -> AppResult<(u64, u64)>;
    /// Newest first.
    async fn list_by_user_and_quiz(
        &self,
        user_id: &str,
        quiz_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<UserAnswer>, u64)>;
}

pub struct MongoAnswerRepository {
    collection: Collection<UserAnswer>,
}

impl MongoAnswerRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection(db::USER_ANSWERS);
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for user_answers collection");

        let question_index = IndexModel::builder()
            .keys(doc! { "question_id": 1, "is_correct": 1 })
            .options(IndexOptions::builder().name("question_correct".to_string()).build())
            .build();

        let user_quiz_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "quiz_id": 1, "time_answered": -1 })
            .options(IndexOptions::builder().name("user_quiz_time".to_string()).build())
            .build();

        self.collection.create_index(question_index).await?;
        self.collection.create_index(user_quiz_index).await?;

        log::info!("Successfully created indexes for user_answers collection");
        Ok(())
    }
}

#[async_trait]
impl AnswerRepository for MongoAnswerRepository {
    async fn create(&self, answer: UserAnswer) -> AppResult<UserAnswer> {
        self.collection.insert_one(&answer).await?;
        Ok(answer)
    }

    async fn count_for_question(&self, question_id: &str) -> AppResult<(u64, u64)> {
        let total = self
            .collection
            .count_documents(doc! { "question_id": question_id })
            .await?;
        let correct = self
            .collection
            .count_documents(doc! { "question_id": question_id, "is_correct": true })
            .await?;
        Ok((total, correct))
    }

    async fn list_by_user_and_quiz(
        &self,
        user_id: &str,
        quiz_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<UserAnswer>, u64)> {
        let filter = doc! { "user_id": user_id, "quiz_id": quiz_id };
        let total = self.collection.count_documents(filter.clone()).await?;

        let items = self
            .collection
            .find(filter)
            .sort(doc! { "time_answered": -1 })
            .skip(offset)
            .limit(limit as i64)
            .await?
            .try_collect()
            .await?;

        Ok((items, total))
    }
}
