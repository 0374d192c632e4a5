use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One submission. Never updated after insertion.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserAnswer {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub quiz_id: String,
    pub question_id: String,
    pub question_name: String,
    pub variant_id: String,
    pub is_correct: bool,
    #[serde(with = "super::timestamp")]
    pub time_answered: DateTime<Utc>,
}

impl UserAnswer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: &str,
        username: &str,
        quiz_id: &str,
        question_id: &str,
        question_name: &str,
        variant_id: &str,
        is_correct: bool,
        time_answered: DateTime<Utc>,
    ) -> Self {
        UserAnswer {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            username: username.to_string(),
            quiz_id: quiz_id.to_string(),
            question_id: question_id.to_string(),
            question_name: question_name.to_string(),
            variant_id: variant_id.to_string(),
            is_correct,
            time_answered,
        }
    }
}
