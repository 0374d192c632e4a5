pub mod organization_service;
pub mod quiz_service;
pub mod scoring;
pub mod user_service;

pub use organization_service::OrganizationService;
pub use quiz_service::QuizService;
pub use user_service::UserService;
