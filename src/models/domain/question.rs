use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Question {
    pub id: String,
    pub quiz_id: String,
    pub name: String,
    pub text: String,
    /// Weight added to `rating_after` when solved in a rated quiz.
    pub difficulty: i32,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Display order inside the quiz.
    pub order: i32,
    pub variants: Vec<Variant>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Variant {
    pub id: String,
    pub text: String,
    pub is_correct: bool,
}

impl Variant {
    pub fn new(text: &str, is_correct: bool) -> Self {
        Variant {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            is_correct,
        }
    }
}

impl Question {
    pub fn new(
        quiz_id: &str,
        name: &str,
        text: &str,
        difficulty: i32,
        order: i32,
        tags: Vec<String>,
        variants: Vec<Variant>,
    ) -> Self {
        Question {
            id: Uuid::new_v4().to_string(),
            quiz_id: quiz_id.to_string(),
            name: name.to_string(),
            text: text.to_string(),
            difficulty,
            tags,
            order,
            variants,
        }
    }

    pub fn variant(&self, variant_id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }

    pub fn has_correct_variant(&self) -> bool {
        self.variants.iter().any(|v| v.is_correct)
    }
}
