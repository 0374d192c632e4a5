use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Scoreboard row of one participant in one quiz. Created at registration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizResult {
    pub id: String,
    pub quiz_id: String,
    pub user_id: String,
    pub username: String,
    pub rating_before: i32,
    pub rating_after: i32,
    pub solved: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place: Option<i32>,
    #[serde(default)]
    pub solved_question_ids: Vec<String>,
    #[serde(with = "super::timestamp")]
    pub registered_at: DateTime<Utc>,
}

impl QuizResult {
    pub fn register(quiz_id: &str, user_id: &str, username: &str, rating: i32) -> Self {
        QuizResult {
            id: Uuid::new_v4().to_string(),
            quiz_id: quiz_id.to_string(),
            user_id: user_id.to_string(),
            username: username.to_string(),
            rating_before: rating,
            rating_after: rating,
            solved: 0,
            place: None,
            solved_question_ids: Vec::new(),
            registered_at: Utc::now(),
        }
    }

    pub fn has_solved(&self, question_id: &str) -> bool {
        self.solved_question_ids.iter().any(|id| id == question_id)
    }

    /// Rating earned in this quiz.
    pub fn rating_gain(&self) -> i32 {
        self.rating_after - self.rating_before
    }

    /// Counts `question_id` as solved unless it already is. Returns whether
    /// the row changed.
    pub fn apply_solve(&mut self, question_id: &str, rating_delta: i32) -> bool {
        if self.has_solved(question_id) {
            return false;
        }
        self.solved_question_ids.push(question_id.to_string());
        self.solved += 1;
        self.rating_after += rating_delta;
        true
    }
}
