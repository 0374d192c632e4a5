use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::{self, Database},
    errors::{AppError, AppResult},
    models::domain::{Membership, Role},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Fails with `AlreadyExists` when the user already has a record in the
    /// organization.
    async fn create(&self, membership: Membership) -> AppResult<Membership>;
    async fn find(&self, organization_id: &str, user_id: &str) -> AppResult<Option<Membership>>;
    async fn list_by_organization(
        &self,
        organization_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<Membership>, u64)>;
    /// Every organization the user holds a record in, invitations included.
    async fn organization_ids_for_user(&self, user_id: &str) -> AppResult<Vec<String>>;
    async fn update_role(&self, organization_id: &str, user_id: &str, role: Role) -> AppResult<()>;
    async fn delete(&self, organization_id: &str, user_id: &str) -> AppResult<()>;
}

pub struct MongoMembershipRepository {
    collection: Collection<Membership>,
}

impl MongoMembershipRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection(db::ORGANIZATION_MEMBERS);
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for organization_members collection");

        let pair_index = IndexModel::builder()
            .keys(doc! { "organization_id": 1, "user_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("organization_user_unique".to_string())
                    .build(),
            )
            .build();

        let user_index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(IndexOptions::builder().name("user_id".to_string()).build())
            .build();

        self.collection.create_index(pair_index).await?;
        self.collection.create_index(user_index).await?;

        log::info!("Successfully created indexes for organization_members collection");
        Ok(())
    }
}

fn missing(organization_id: &str, user_id: &str) -> AppError {
    AppError::NotFound(format!(
        "User '{}' is not a member of organization '{}'",
        user_id, organization_id
    ))
}

#[async_trait]
impl MembershipRepository for MongoMembershipRepository {
    async fn create(&self, membership: Membership) -> AppResult<Membership> {
        match self.collection.insert_one(&membership).await {
            Ok(_) => Ok(membership),
            Err(e) if db::is_duplicate_key(&e) => Err(AppError::AlreadyExists(format!(
                "User '{}' already belongs to organization '{}'",
                membership.username, membership.organization_id
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn find(&self, organization_id: &str, user_id: &str) -> AppResult<Option<Membership>> {
        Ok(self
            .collection
            .find_one(doc! { "organization_id": organization_id, "user_id": user_id })
            .await?)
    }

    async fn list_by_organization(
        &self,
        organization_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<Membership>, u64)> {
        let filter = doc! { "organization_id": organization_id };
        let total = self.collection.count_documents(filter.clone()).await?;

        let members = self
            .collection
            .find(filter)
            .sort(doc! { "role": -1, "username": 1 })
            .skip(offset)
            .limit(limit as i64)
            .await?
            .try_collect()
            .await?;

        Ok((members, total))
    }

    async fn organization_ids_for_user(&self, user_id: &str) -> AppResult<Vec<String>> {
        let memberships: Vec<Membership> = self
            .collection
            .find(doc! { "user_id": user_id })
            .await?
            .try_collect()
            .await?;

        Ok(memberships.into_iter().map(|m| m.organization_id).collect())
    }

    async fn update_role(&self, organization_id: &str, user_id: &str, role: Role) -> AppResult<()> {
        let result = self
            .collection
            .update_one(
                doc! { "organization_id": organization_id, "user_id": user_id },
                doc! { "$set": { "role": role.as_i32() } },
            )
            .await?;

        if result.matched_count == 0 {
            return Err(missing(organization_id, user_id));
        }
        Ok(())
    }

    async fn delete(&self, organization_id: &str, user_id: &str) -> AppResult<()> {
        let result = self
            .collection
            .delete_one(doc! { "organization_id": organization_id, "user_id": user_id })
            .await?;

        if result.deleted_count == 0 {
            return Err(missing(organization_id, user_id));
        }
        Ok(())
    }
}
