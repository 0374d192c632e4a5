use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::QuizStatus;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,

    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, max = 150))]
    pub name: String,

    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchCriteria {
    #[default]
    All,
    Name,
    Description,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OrganizationSearchParams {
    pub page: Option<u64>,
    pub searched: Option<String>,
    #[serde(default, rename = "search_critery")]
    pub criteria: SearchCriteria,
}

impl OrganizationSearchParams {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Blank search text means no filtering.
    pub fn search_text(&self) -> Option<&str> {
        self.searched
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PageParams {
    pub page: Option<u64>,
}

impl PageParams {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InviteMemberRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 150))]
    pub name: String,

    #[validate(length(min = 1, max = 10000))]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub comment_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateVariantRequest {
    #[validate(length(min = 1, max = 150))]
    pub text: String,

    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(min = 1, max = 10000))]
    pub text: String,

    #[validate(range(min = 1, max = 100))]
    pub difficulty: i32,

    #[serde(default)]
    pub tags: Vec<String>,

    #[validate(length(min = 1, max = 20), nested)]
    pub variants: Vec<CreateVariantRequest>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: String,

    #[validate(length(max = 10000))]
    #[serde(default)]
    pub description: String,

    pub start_time: DateTime<Utc>,

    /// Minutes, at most one week.
    #[validate(range(min = 1, max = 10080))]
    pub duration: i64,

    #[serde(default)]
    pub is_private: bool,

    #[serde(default)]
    pub is_rated: bool,

    #[validate(length(min = 1, max = 100), nested)]
    pub questions: Vec<CreateQuestionRequest>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    #[validate(length(min = 1))]
    pub variant_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModerateQuizRequest {
    pub is_published: Option<bool>,
    pub status: Option<QuizStatus>,
}
