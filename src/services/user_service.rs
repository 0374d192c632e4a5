use std::sync::Arc;

use validator::Validate;

use crate::{
    auth::{
        password::{hash_password, verify_password},
        JwtService,
    },
    constants::RESULTS_PAGE_SIZE,
    db::page_offset,
    errors::{AppError, AppResult},
    models::{
        domain::User,
        dto::{
            request::{LoginRequest, SignupRequest},
            response::{AuthResponse, Page, ParticipationDto, UserDto},
        },
    },
    repositories::{QuizRepository, QuizResultRepository, UserRepository},
};

pub struct UserService {
    users: Arc<dyn UserRepository>,
    results: Arc<dyn QuizResultRepository>,
    quizzes: Arc<dyn QuizRepository>,
    jwt: Arc<JwtService>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        results: Arc<dyn QuizResultRepository>,
        quizzes: Arc<dyn QuizRepository>,
        jwt: Arc<JwtService>,
    ) -> Self {
        Self {
            users,
            results,
            quizzes,
            jwt,
        }
    }

    pub async fn signup(&self, request: SignupRequest) -> AppResult<AuthResponse> {
        request.validate()?;

        let password_hash = hash_password(&request.password)?;
        let user = self
            .users
            .create(User::new(&request.username, &request.email, &password_hash))
            .await?;

        log::info!("Registered user {}", user.username);
        self.issue_token(user)
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        request.validate()?;

        let user = self.users.find_by_username(&request.username).await?;
        match user {
            Some(user) if verify_password(&request.password, &user.password_hash) => {
                self.issue_token(user)
            }
            _ => Err(AppError::Unauthorized(
                "Invalid username or password".to_string(),
            )),
        }
    }

    pub async fn get_profile(&self, user_id: &str) -> AppResult<UserDto> {
        self.find_user(user_id).await.map(UserDto::from)
    }

    /// Quiz results of `user_id`. Other viewers only see rows of public
    /// quizzes.
    pub async fn list_results(
        &self,
        user_id: &str,
        viewer_id: &str,
        page: u64,
    ) -> AppResult<Page<ParticipationDto>> {
        self.find_user(user_id).await?;

        let (results, total) = self
            .results
            .list_by_user(user_id, page_offset(page, RESULTS_PAGE_SIZE), RESULTS_PAGE_SIZE)
            .await?;

        let mut items = Vec::with_capacity(results.len());
        for result in results {
            let Some(quiz) = self.quizzes.find_by_id(&result.quiz_id).await? else {
                log::warn!("Quiz result {} points at a missing quiz", result.id);
                continue;
            };
            if quiz.is_private && user_id != viewer_id {
                continue;
            }
            items.push(ParticipationDto::new(result, &quiz));
        }

        Ok(Page::new(items, page, RESULTS_PAGE_SIZE, total))
    }

    async fn find_user(&self, user_id: &str) -> AppResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id '{}' not found", user_id)))
    }

    fn issue_token(&self, user: User) -> AppResult<AuthResponse> {
        let token = self.jwt.create_token(&user)?;
        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }
}
