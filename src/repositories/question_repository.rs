use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::{self, Database},
    errors::AppResult,
    models::domain::Question,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    async fn create_many(&self, questions: Vec<Question>) -> AppResult<Vec<Question>>;
    /// Questions of a quiz in display order.
    async fn list_by_quiz(&self, quiz_id: &str) -> AppResult<Vec<Question>>;
    async fn find_in_quiz(&self, quiz_id: &str, question_id: &str) -> AppResult<Option<Question>>;
    /// Questions of any of `quiz_ids`, easiest first.
    async fn list_for_quizzes(
        &self,
        quiz_ids: Vec<String>,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<Question>, u64)>;
}

pub struct MongoQuestionRepository {
    collection: Collection<Question>,
}

impl MongoQuestionRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection(db::QUESTIONS);
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for questions collection");

        let quiz_index = IndexModel::builder()
            .keys(doc! { "quiz_id": 1, "order": 1 })
            .options(IndexOptions::builder().name("quiz_order".to_string()).build())
            .build();

        self.collection.create_index(quiz_index).await?;

        log::info!("Successfully created indexes for questions collection");
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for MongoQuestionRepository {
    async fn create_many(&self, questions: Vec<Question>) -> AppResult<Vec<Question>> {
        if questions.is_empty() {
            return Ok(questions);
        }
        self.collection.insert_many(&questions).await?;
        Ok(questions)
    }

    async fn list_by_quiz(&self, quiz_id: &str) -> AppResult<Vec<Question>> {
        Ok(self
            .collection
            .find(doc! { "quiz_id": quiz_id })
            .sort(doc! { "order": 1 })
            .await?
            .try_collect()
            .await?)
    }

    async fn find_in_quiz(&self, quiz_id: &str, question_id: &str) -> AppResult<Option<Question>> {
        Ok(self
            .collection
            .find_one(doc! { "id": question_id, "quiz_id": quiz_id })
            .await?)
    }

    async fn list_for_quizzes(
        &self,
        quiz_ids: Vec<String>,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<Question>, u64)> {
        let filter = doc! { "quiz_id": { "$in": quiz_ids } };
        let total = self.collection.count_documents(filter.clone()).await?;

        let items = self
            .collection
            .find(filter)
            .sort(doc! { "difficulty": 1, "name": 1 })
            .skip(offset)
            .limit(limit as i64)
            .await?
            .try_collect()
            .await?;

        Ok((items, total))
    }
}
