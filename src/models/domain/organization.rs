use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_private: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Organization {
    pub fn new(name: &str, description: &str, is_private: bool) -> Self {
        Organization {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.to_string(),
            is_private,
            created_at: Some(Utc::now()),
        }
    }
}

/// Announcement published by an organization. Visible to whoever can see
/// the organization itself.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct OrganizationPost {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub text: String,
    #[serde(
        default,
        with = "super::timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl OrganizationPost {
    pub fn new(organization_id: &str, name: &str, text: &str) -> Self {
        OrganizationPost {
            id: Uuid::new_v4().to_string(),
            organization_id: organization_id.to_string(),
            name: name.to_string(),
            text: text.to_string(),
            created_at: Some(Utc::now()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub username: String,
    pub text: String,
    #[serde(with = "super::timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(post_id: &str, user_id: &str, username: &str, text: &str) -> Self {
        Comment {
            id: Uuid::new_v4().to_string(),
            post_id: post_id.to_string(),
            user_id: user_id.to_string(),
            username: username.to_string(),
            text: text.to_string(),
            created_at: Utc::now(),
        }
    }
}
