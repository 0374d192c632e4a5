use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::{
    Organization, Question, Quiz, QuizPhase, QuizResult, Role, User,
};

#[derive(Debug, Clone, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub num_pages: u64,
}

impl<T: Serialize> Page<T> {
    pub fn new(items: Vec<T>, page: u64, page_size: u64, total: u64) -> Self {
        let num_pages = if page_size == 0 {
            0
        } else {
            total.div_ceil(page_size)
        };
        Page {
            items,
            page,
            page_size,
            total,
            num_pages,
        }
    }

    pub fn map<U: Serialize>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
            num_pages: self.num_pages,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserDto {
    pub id: String,
    pub username: String,
    pub email: String,
    pub rating: i32,
    pub is_staff: bool,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        UserDto {
            id: user.id,
            username: user.username,
            email: user.email,
            rating: user.rating,
            is_staff: user.is_staff,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserDto,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizationSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub member_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizationDetail {
    #[serde(flatten)]
    pub organization: Organization,
    pub is_member: bool,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberDto {
    pub user_id: String,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizDetail {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub phase: QuizPhase,
    pub end_time: DateTime<Utc>,
    pub can_participate: bool,
    pub can_access_questions: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionSummary {
    pub id: String,
    pub name: String,
    pub difficulty: i32,
    pub total_answers: u64,
    pub success_answers: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariantForTaking {
    pub id: String,
    pub text: String,
}

/// Question as shown to participants, without the answer key.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionForTaking {
    pub id: String,
    pub quiz_id: String,
    pub name: String,
    pub text: String,
    pub difficulty: i32,
    pub tags: Vec<String>,
    pub variants: Vec<VariantForTaking>,
}

impl From<Question> for QuestionForTaking {
    fn from(question: Question) -> Self {
        QuestionForTaking {
            id: question.id,
            quiz_id: question.quiz_id,
            name: question.name,
            text: question.text,
            difficulty: question.difficulty,
            tags: question.tags,
            variants: question
                .variants
                .into_iter()
                .map(|v| VariantForTaking {
                    id: v.id,
                    text: v.text,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchivedQuestion {
    pub id: String,
    pub quiz_id: String,
    pub name: String,
    pub difficulty: i32,
}

impl From<Question> for ArchivedQuestion {
    fn from(question: Question) -> Self {
        ArchivedQuestion {
            id: question.id,
            quiz_id: question.quiz_id,
            name: question.name,
            difficulty: question.difficulty,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionResponse {
    pub answer_id: String,
    pub is_correct: bool,
    /// False for repeated or out-of-window correct answers.
    pub scored: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StandingRow {
    pub place: i32,
    pub user_id: String,
    pub username: String,
    pub solved: i32,
    pub rating_before: i32,
    pub rating_after: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipationDto {
    pub quiz_id: String,
    pub quiz_name: String,
    pub start_time: DateTime<Utc>,
    pub solved: i32,
    pub place: Option<i32>,
    pub rating_before: i32,
    pub rating_after: i32,
}

impl ParticipationDto {
    pub fn new(result: QuizResult, quiz: &Quiz) -> Self {
        ParticipationDto {
            quiz_id: result.quiz_id,
            quiz_name: quiz.name.clone(),
            start_time: quiz.start_time,
            solved: result.solved,
            place: result.place,
            rating_before: result.rating_before,
            rating_after: result.rating_after,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

/// User-visible note sent along with a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub message: String,
}

impl FlashMessage {
    pub fn success(message: impl Into<String>) -> Self {
        FlashMessage {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        FlashMessage {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }
}
