pub mod answer_repository;
pub mod membership_repository;
pub mod organization_repository;
pub mod post_repository;
pub mod question_repository;
pub mod quiz_repository;
pub mod quiz_result_repository;
pub mod user_repository;

pub use answer_repository::{AnswerRepository, MongoAnswerRepository};
pub use membership_repository::{MembershipRepository, MongoMembershipRepository};
pub use organization_repository::{
    MongoOrganizationRepository, OrganizationFilter, OrganizationListing, OrganizationRepository,
};
pub use post_repository::{MongoPostRepository, PostRepository};
pub use question_repository::{MongoQuestionRepository, QuestionRepository};
pub use quiz_repository::{MongoQuizRepository, QuizRepository};
pub use quiz_result_repository::{MongoQuizResultRepository, QuizResultRepository};
pub use user_repository::{MongoUserRepository, UserRepository};
