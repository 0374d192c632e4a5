use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::{self, Database},
    errors::{AppError, AppResult},
    models::domain::QuizResult,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizResultRepository: Send + Sync {
    /// Fails with `AlreadyExists` on a second registration.
    async fn create(&self, result: QuizResult) -> AppResult<QuizResult>;
    async fn find(&self, quiz_id: &str, user_id: &str) -> AppResult<Option<QuizResult>>;
    /// Adds `question_id` to the solved set and bumps the counters in a
    /// single conditional update. Returns false when the question was
    /// already solved or the row does not exist.
    async fn record_solve(
        &self,
        quiz_id: &str,
        user_id: &str,
        question_id: &str,
        rating_delta: i32,
    ) -> AppResult<bool>;
    /// Every row of the quiz: solved desc, then rating_after desc, then
    /// username.
    async fn list_all_for_quiz(&self, quiz_id: &str) -> AppResult<Vec<QuizResult>>;
    /// Stores `place` unless the row already has one. Returns whether this
    /// call stored it.
    async fn claim_place(&self, id: &str, place: i32) -> AppResult<bool>;
    /// Newest registration first.
    async fn list_by_user(
        &self,
        user_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<QuizResult>, u64)>;
}

pub struct MongoQuizResultRepository {
    collection: Collection<QuizResult>,
}

impl MongoQuizResultRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection(db::QUIZ_RESULTS);
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for quiz_results collection");

        let pair_index = IndexModel::builder()
            .keys(doc! { "quiz_id": 1, "user_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("quiz_user_unique".to_string())
                    .build(),
            )
            .build();

        let standings_index = IndexModel::builder()
            .keys(doc! { "quiz_id": 1, "solved": -1, "rating_after": -1, "username": 1 })
            .options(IndexOptions::builder().name("standings".to_string()).build())
            .build();

        self.collection.create_index(pair_index).await?;
        self.collection.create_index(standings_index).await?;

        log::info!("Successfully created indexes for quiz_results collection");
        Ok(())
    }
}

#[async_trait]
impl QuizResultRepository for MongoQuizResultRepository {
    async fn create(&self, result: QuizResult) -> AppResult<QuizResult> {
        match self.collection.insert_one(&result).await {
            Ok(_) => Ok(result),
            Err(e) if db::is_duplicate_key(&e) => Err(AppError::AlreadyExists(format!(
                "User '{}' is already registered for quiz '{}'",
                result.username, result.quiz_id
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn find(&self, quiz_id: &str, user_id: &str) -> AppResult<Option<QuizResult>> {
        Ok(self
            .collection
            .find_one(doc! { "quiz_id": quiz_id, "user_id": user_id })
            .await?)
    }

    async fn record_solve(
        &self,
        quiz_id: &str,
        user_id: &str,
        question_id: &str,
        rating_delta: i32,
    ) -> AppResult<bool> {
        let result = self
            .collection
            .update_one(
                doc! {
                    "quiz_id": quiz_id,
                    "user_id": user_id,
                    "solved_question_ids": { "$ne": question_id },
                },
                doc! {
                    "$inc": { "solved": 1, "rating_after": rating_delta },
                    "$addToSet": { "solved_question_ids": question_id },
                },
            )
            .await?;
        Ok(result.modified_count == 1)
    }

    async fn list_all_for_quiz(&self, quiz_id: &str) -> AppResult<Vec<QuizResult>> {
        Ok(self
            .collection
            .find(doc! { "quiz_id": quiz_id })
            .sort(doc! { "solved": -1, "rating_after": -1, "username": 1 })
            .await?
            .try_collect()
            .await?)
    }

    async fn claim_place(&self, id: &str, place: i32) -> AppResult<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "id": id, "place": null },
                doc! { "$set": { "place": place } },
            )
            .await?;

        Ok(result.modified_count == 1)
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<QuizResult>, u64)> {
        let filter = doc! { "user_id": user_id };
        let total = self.collection.count_documents(filter.clone()).await?;

        let items = self
            .collection
            .find(filter)
            .sort(doc! { "registered_at": -1 })
            .skip(offset)
            .limit(limit as i64)
            .await?
            .try_collect()
            .await?;

        Ok((items, total))
    }
}
