use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{
    db::{self, Database},
    errors::{AppError, AppResult},
    models::domain::Quiz,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Quiz>>;
    /// Published quizzes that are public or belong to one of
    /// `member_of`, newest start first.
    async fn list_published(
        &self,
        member_of: Vec<String>,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<Quiz>, u64)>;
    async fn list_by_organization(
        &self,
        organization_id: &str,
        include_private: bool,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<Quiz>, u64)>;
    async fn update(&self, quiz: Quiz) -> AppResult<Quiz>;
    /// Flips `is_ended` on. Returns false when the quiz was already ended.
    async fn mark_ended(&self, id: &str) -> AppResult<bool>;
    /// Ids of ended, public, published quizzes.
    async fn list_archived_ids(&self) -> AppResult<Vec<String>>;
}

pub struct MongoQuizRepository {
    collection: Collection<Quiz>,
}

impl MongoQuizRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection(db::QUIZZES);
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for quizzes collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let organization_index = IndexModel::builder()
            .keys(doc! { "organization_id": 1, "start_time": -1 })
            .options(IndexOptions::builder().name("organization_start".to_string()).build())
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(organization_index).await?;

        log::info!("Successfully created indexes for quizzes collection");
        Ok(())
    }

    async fn list_page(
        &self,
        filter: Document,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<Quiz>, u64)> {
        let total = self.collection.count_documents(filter.clone()).await?;

        let items = self
            .collection
            .find(filter)
            .sort(doc! { "start_time": -1 })
            .skip(offset)
            .limit(limit as i64)
            .await?
            .try_collect()
            .await?;

        Ok((items, total))
    }
}

#[async_trait]
impl QuizRepository for MongoQuizRepository {
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz> {
        self.collection.insert_one(&quiz).await?;
        Ok(quiz)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Quiz>> {
        Ok(self.collection.find_one(doc! { "id": id }).await?)
    }

    async fn list_published(
        &self,
        member_of: Vec<String>,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<Quiz>, u64)> {
        let filter = doc! {
            "is_published": true,
            "$or": [
                { "is_private": false },
                { "organization_id": { "$in": member_of } },
            ],
        };
        self.list_page(filter, offset, limit).await
    }

    async fn list_by_organization(
        &self,
        organization_id: &str,
        include_private: bool,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<Quiz>, u64)> {
        let mut filter = doc! { "organization_id": organization_id, "is_published": true };
        if !include_private {
            filter.insert("is_private", false);
        }
        self.list_page(filter, offset, limit).await
    }

    async fn update(&self, quiz: Quiz) -> AppResult<Quiz> {
        let result = self
            .collection
            .replace_one(doc! { "id": quiz.id.as_str() }, &quiz)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!("Quiz with id '{}' not found", quiz.id)));
        }
        Ok(quiz)
    }

    async fn mark_ended(&self, id: &str) -> AppResult<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "id": id, "is_ended": { "$ne": true } },
                doc! { "$set": { "is_ended": true } },
            )
            .await?;
        Ok(result.modified_count == 1)
    }

    async fn list_archived_ids(&self) -> AppResult<Vec<String>> {
        let quizzes: Vec<Quiz> = self
            .collection
            .find(doc! { "is_ended": true, "is_private": false, "is_published": true })
            .await?
            .try_collect()
            .await?;

        Ok(quizzes.into_iter().map(|q| q.id).collect())
    }
}
