use std::sync::Arc;

use crate::{
    auth::JwtService,
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{
        AnswerRepository, MembershipRepository, MongoAnswerRepository, MongoMembershipRepository,
        MongoOrganizationRepository, MongoPostRepository, MongoQuestionRepository,
        MongoQuizRepository, MongoQuizResultRepository, MongoUserRepository,
        OrganizationRepository, PostRepository, QuestionRepository, QuizRepository,
        QuizResultRepository, UserRepository,
    },
    services::{OrganizationService, QuizService, UserService},
};

/// One handle per collection.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub organizations: Arc<dyn OrganizationRepository>,
    pub memberships: Arc<dyn MembershipRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub answers: Arc<dyn AnswerRepository>,
    pub results: Arc<dyn QuizResultRepository>,
}

impl Repositories {
    /// MongoDB-backed repositories with their indexes in place.
    pub async fn mongo(db: &Database) -> AppResult<Self> {
        let users = MongoUserRepository::new(db);
        let organizations = MongoOrganizationRepository::new(db);
        let memberships = MongoMembershipRepository::new(db);
        let posts = MongoPostRepository::new(db);
        let quizzes = MongoQuizRepository::new(db);
        let questions = MongoQuestionRepository::new(db);
        let answers = MongoAnswerRepository::new(db);
        let results = MongoQuizResultRepository::new(db);

        users.ensure_indexes().await?;
        organizations.ensure_indexes().await?;
        memberships.ensure_indexes().await?;
        posts.ensure_indexes().await?;
        quizzes.ensure_indexes().await?;
        questions.ensure_indexes().await?;
        answers.ensure_indexes().await?;
        results.ensure_indexes().await?;

        Ok(Self {
            users: Arc::new(users),
            organizations: Arc::new(organizations),
            memberships: Arc::new(memberships),
            posts: Arc::new(posts),
            quizzes: Arc::new(quizzes),
            questions: Arc::new(questions),
            answers: Arc::new(answers),
            results: Arc::new(results),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub organization_service: Arc<OrganizationService>,
    pub quiz_service: Arc<QuizService>,
    /// Absent when running on non-Mongo repositories.
    pub db: Option<Database>,
}

impl AppState {
    pub async fn new(config: &Config, jwt: Arc<JwtService>) -> AppResult<Self> {
        let db = Database::connect(config).await?;
        let repositories = Repositories::mongo(&db).await?;

        let mut state = Self::from_repositories(repositories, jwt);
        state.db = Some(db);
        Ok(state)
    }

    pub fn from_repositories(repositories: Repositories, jwt: Arc<JwtService>) -> Self {
        let Repositories {
            users,
            organizations,
            memberships,
            posts,
            quizzes,
            questions,
            answers,
            results,
        } = repositories;

        let user_service = UserService::new(
            users.clone(),
            results.clone(),
            quizzes.clone(),
            jwt,
        );
        let organization_service = OrganizationService::new(
            organizations.clone(),
            memberships.clone(),
            posts,
            users.clone(),
        );
        let quiz_service = QuizService::new(
            quizzes,
            questions,
            answers,
            results,
            organizations,
            memberships,
            users,
        );

        Self {
            user_service: Arc::new(user_service),
            organization_service: Arc::new(organization_service),
            quiz_service: Arc::new(quiz_service),
            db: None,
        }
    }
}
