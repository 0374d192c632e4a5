use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::{self, Database},
    errors::AppResult,
    models::domain::{Comment, OrganizationPost},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create_post(&self, post: OrganizationPost) -> AppResult<OrganizationPost>;
    async fn find_post(&self, id: &str) -> AppResult<Option<OrganizationPost>>;
    /// Newest first.
    async fn list_posts(
        &self,
        organization_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<OrganizationPost>, u64)>;
    async fn create_comment(&self, comment: Comment) -> AppResult<Comment>;
    /// Oldest first.
    async fn list_comments(
        &self,
        post_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<Comment>, u64)>;
}

pub struct MongoPostRepository {
    posts: Collection<OrganizationPost>,
    comments: Collection<Comment>,
}

impl MongoPostRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            posts: db.get_collection(db::ORGANIZATION_POSTS),
            comments: db.get_collection(db::POST_COMMENTS),
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for posts and comments collections");

        let post_org_index = IndexModel::builder()
            .keys(doc! { "organization_id": 1, "created_at": -1 })
            .options(IndexOptions::builder().name("organization_created".to_string()).build())
            .build();

        let comment_post_index = IndexModel::builder()
            .keys(doc! { "post_id": 1, "created_at": 1 })
            .options(IndexOptions::builder().name("post_created".to_string()).build())
            .build();

        self.posts.create_index(post_org_index).await?;
        self.comments.create_index(comment_post_index).await?;

        log::info!("Successfully created indexes for posts and comments collections");
        Ok(())
    }
}

#[async_trait]
impl PostRepository for MongoPostRepository {
    async fn create_post(&self, post: OrganizationPost) -> AppResult<OrganizationPost> {
        self.posts.insert_one(&post).await?;
        Ok(post)
    }

    async fn find_post(&self, id: &str) -> AppResult<Option<OrganizationPost>> {
        Ok(self.posts.find_one(doc! { "id": id }).await?)
    }

    async fn list_posts(
        &self,
        organization_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<OrganizationPost>, u64)> {
        let filter = doc! { "organization_id": organization_id };
        let total = self.posts.count_documents(filter.clone()).await?;

        let posts = self
            .posts
            .find(filter)
            .sort(doc! { "created_at": -1 })
            .skip(offset)
            .limit(limit as i64)
            .await?
            .try_collect()
            .await?;

        Ok((posts, total))
    }

    async fn create_comment(&self, comment: Comment) -> AppResult<Comment> {
        self.comments.insert_one(&comment).await?;
        Ok(comment)
    }

    async fn list_comments(
        &self,
        post_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<Comment>, u64)> {
        let filter = doc! { "post_id": post_id };
        let total = self.comments.count_documents(filter.clone()).await?;

        let comments = self
            .comments
            .find(filter)
            .sort(doc! { "created_at": 1 })
            .skip(offset)
            .limit(limit as i64)
            .await?
            .try_collect()
            .await?;

        Ok((comments, total))
    }
}
