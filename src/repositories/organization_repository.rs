use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, Document},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{
    db::{self, Database},
    errors::AppResult,
    models::{domain::Organization, dto::request::SearchCriteria},
};

/// Case-insensitive substring search over public organizations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationFilter {
    pub search: Option<String>,
    pub criteria: SearchCriteria,
}

impl OrganizationFilter {
    pub fn matches(&self, org: &Organization) -> bool {
        let Some(search) = self.search.as_deref() else {
            return true;
        };
        let needle = search.to_lowercase();
        let in_name = org.name.to_lowercase().contains(&needle);
        let in_description = org.description.to_lowercase().contains(&needle);
        match self.criteria {
            SearchCriteria::All => in_name || in_description,
            SearchCriteria::Name => in_name,
            SearchCriteria::Description => in_description,
        }
    }

    fn to_document(&self) -> Document {
        let Some(search) = self.search.as_deref() else {
            return doc! { "is_private": false };
        };
        let pattern = doc! { "$regex": regex::escape(search), "$options": "i" };
        match self.criteria {
            SearchCriteria::All => doc! {
                "is_private": false,
                "$or": [ { "name": pattern.clone() }, { "description": pattern } ],
            },
            SearchCriteria::Name => doc! { "is_private": false, "name": pattern },
            SearchCriteria::Description => doc! { "is_private": false, "description": pattern },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationListing {
    pub organization: Organization,
    pub member_count: u64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn create(&self, organization: Organization) -> AppResult<Organization>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Organization>>;
    /// Public organizations, most members first.
    async fn list_public(
        &self,
        filter: &OrganizationFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<OrganizationListing>, u64)>;
}

pub struct MongoOrganizationRepository {
    collection: Collection<Organization>,
}

impl MongoOrganizationRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection(db::ORGANIZATIONS);
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for organizations collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let privacy_index = IndexModel::builder()
            .keys(doc! { "is_private": 1 })
            .options(IndexOptions::builder().name("is_private".to_string()).build())
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(privacy_index).await?;

        log::info!("Successfully created indexes for organizations collection");
        Ok(())
    }
}

#[async_trait]
impl OrganizationRepository for MongoOrganizationRepository {
    async fn create(&self, organization: Organization) -> AppResult<Organization> {
        self.collection.insert_one(&organization).await?;
        Ok(organization)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Organization>> {
        Ok(self.collection.find_one(doc! { "id": id }).await?)
    }

    async fn list_public(
        &self,
        filter: &OrganizationFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<OrganizationListing>, u64)> {
        let filter = filter.to_document();
        let total = self.collection.count_documents(filter.clone()).await?;

        let pipeline = vec![
            doc! { "$match": filter },
            doc! { "$lookup": {
                "from": db::ORGANIZATION_MEMBERS,
                "localField": "id",
                "foreignField": "organization_id",
                "as": "members",
            } },
            doc! { "$addFields": { "member_count": { "$size": "$members" } } },
            doc! { "$project": { "members": 0 } },
            doc! { "$sort": { "member_count": -1, "name": 1 } },
            doc! { "$skip": offset as i64 },
            doc! { "$limit": limit as i64 },
        ];

        let documents: Vec<Document> = self
            .collection
            .aggregate(pipeline)
            .await?
            .try_collect()
            .await?;

        let mut listings = Vec::with_capacity(documents.len());
        for document in documents {
            let member_count = document.get_i32("member_count").unwrap_or(0).max(0) as u64;
            let organization: Organization = bson::from_document(document)?;
            listings.push(OrganizationListing {
                organization,
                member_count,
            });
        }

        Ok((listings, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org(name: &str, description: &str) -> Organization {
        Organization::new(name, description, false)
    }

    #[test]
    fn filter_without_search_matches_everything() {
        let filter = OrganizationFilter::default();
        assert!(filter.matches(&org("Anything", "")));
    }

    #[test]
    fn filter_respects_criteria() {
        let chess = org("Chess Club", "Weekly blitz");
        let by_name = OrganizationFilter {
            search: Some("chess".to_string()),
            criteria: SearchCriteria::Name,
        };
        let by_description = OrganizationFilter {
            search: Some("BLITZ".to_string()),
            criteria: SearchCriteria::Description,
        };
        let wrong_field = OrganizationFilter {
            search: Some("blitz".to_string()),
            criteria: SearchCriteria::Name,
        };

        assert!(by_name.matches(&chess));
        assert!(by_description.matches(&chess));
        assert!(!wrong_field.matches(&chess));
    }

    #[test]
    fn search_text_is_escaped_in_query() {
        let filter = OrganizationFilter {
            search: Some("c++".to_string()),
            criteria: SearchCriteria::Name,
        };
        let document = filter.to_document();
        let name = document.get_document("name").unwrap();
        assert_eq!(name.get_str("$regex").unwrap(), r"c\+\+");
        assert!(!document.get_bool("is_private").unwrap());
    }
}
