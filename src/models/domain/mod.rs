pub mod membership;
pub mod organization;
pub mod question;
pub mod quiz;
pub mod quiz_result;
pub mod timestamp;
pub mod user;
pub mod user_answer;

pub use membership::{Membership, Role};
pub use organization::{Comment, Organization, OrganizationPost};
pub use question::{Question, Variant};
pub use quiz::{Quiz, QuizPhase, QuizStatus};
pub use quiz_result::QuizResult;
pub use user::User;
pub use user_answer::UserAnswer;
