use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted status, edited by moderators only. Participant access never
/// reads it; see [`QuizPhase`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuizStatus {
    #[default]
    NotStarted,
    GoesOn,
    Finished,
}

/// Lifecycle phase derived from the wall clock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuizPhase {
    NotStarted,
    GoesOn,
    Finished,
}

impl QuizPhase {
    /// `[start, start + duration)` is the running window.
    pub fn at(start_time: DateTime<Utc>, duration: Duration, now: DateTime<Utc>) -> Self {
        if now < start_time {
            QuizPhase::NotStarted
        } else if now < start_time + duration {
            QuizPhase::GoesOn
        } else {
            QuizPhase::Finished
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Quiz {
    pub id: String,
    pub name: String,
    pub description: String,
    pub organization_id: String,
    pub creator_id: String,
    pub status: QuizStatus,
    #[serde(with = "super::timestamp")]
    pub start_time: DateTime<Utc>,
    /// Minutes.
    pub duration: i64,
    pub is_private: bool,
    pub is_published: bool,
    pub is_rated: bool,
    /// Set once standings are finalized.
    #[serde(default)]
    pub is_ended: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Quiz {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        description: &str,
        organization_id: &str,
        creator_id: &str,
        start_time: DateTime<Utc>,
        duration: i64,
        is_private: bool,
        is_rated: bool,
    ) -> Self {
        Quiz {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.to_string(),
            organization_id: organization_id.to_string(),
            creator_id: creator_id.to_string(),
            status: QuizStatus::NotStarted,
            start_time,
            duration,
            is_private,
            is_published: false,
            is_rated,
            is_ended: false,
            created_at: Some(Utc::now()),
        }
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + Duration::minutes(self.duration)
    }

    pub fn phase_at(&self, now: DateTime<Utc>) -> QuizPhase {
        QuizPhase::at(self.start_time, Duration::minutes(self.duration), now)
    }
}
