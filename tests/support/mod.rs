#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::RwLock;

use arena_server::{
    app_state::{AppState, Repositories},
    auth::{password::hash_password, JwtService},
    errors::{AppError, AppResult},
    models::domain::{
        Comment, Membership, Organization, OrganizationPost, Question, Quiz, QuizResult, Role,
        User, UserAnswer,
    },
    repositories::{
        AnswerRepository, MembershipRepository, OrganizationFilter, OrganizationListing,
        OrganizationRepository, PostRepository, QuestionRepository, QuizRepository,
        QuizResultRepository, UserRepository,
    },
};

pub const TEST_SECRET: &str = "integration-test-secret-that-is-long-enough";

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    organizations: HashMap<String, Organization>,
    memberships: Vec<Membership>,
    posts: Vec<OrganizationPost>,
    comments: Vec<Comment>,
    quizzes: HashMap<String, Quiz>,
    questions: Vec<Question>,
    answers: Vec<UserAnswer>,
    results: Vec<QuizResult>,
}

/// Every collection in memory behind one lock, so that conditional updates
/// are as atomic as their MongoDB counterparts.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

fn paginate<T: Clone>(items: Vec<T>, offset: u64, limit: u64) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let page = items
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect();
    (page, total)
}

fn standings_order(rows: &mut [QuizResult]) {
    rows.sort_by(|a, b| {
        b.solved
            .cmp(&a.solved)
            .then(b.rating_after.cmp(&a.rating_after))
            .then(a.username.cmp(&b.username))
    });
}

impl MemoryStore {
    pub fn repositories(&self) -> Repositories {
        let store = Arc::new(self.clone());
        Repositories {
            users: store.clone(),
            organizations: store.clone(),
            memberships: store.clone(),
            posts: store.clone(),
            quizzes: store.clone(),
            questions: store.clone(),
            answers: store.clone(),
            results: store,
        }
    }

    pub async fn insert_user(&self, user: User) {
        self.tables.write().await.users.insert(user.id.clone(), user);
    }

    pub async fn user(&self, id: &str) -> Option<User> {
        self.tables.read().await.users.get(id).cloned()
    }

    pub async fn insert_membership(&self, membership: Membership) {
        self.tables.write().await.memberships.push(membership);
    }

    pub async fn membership(&self, organization_id: &str, user_id: &str) -> Option<Membership> {
        self.tables
            .read()
            .await
            .memberships
            .iter()
            .find(|m| m.organization_id == organization_id && m.user_id == user_id)
            .cloned()
    }

    pub async fn quiz(&self, id: &str) -> Option<Quiz> {
        self.tables.read().await.quizzes.get(id).cloned()
    }

    pub async fn put_quiz(&self, quiz: Quiz) {
        self.tables.write().await.quizzes.insert(quiz.id.clone(), quiz);
    }

    pub async fn questions_of(&self, quiz_id: &str) -> Vec<Question> {
        let mut questions: Vec<Question> = self
            .tables
            .read()
            .await
            .questions
            .iter()
            .filter(|q| q.quiz_id == quiz_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| q.order);
        questions
    }

    pub async fn result(&self, quiz_id: &str, user_id: &str) -> Option<QuizResult> {
        self.tables
            .read()
            .await
            .results
            .iter()
            .find(|r| r.quiz_id == quiz_id && r.user_id == user_id)
            .cloned()
    }

    pub async fn result_count(&self, quiz_id: &str) -> usize {
        self.tables
            .read()
            .await
            .results
            .iter()
            .filter(|r| r.quiz_id == quiz_id)
            .count()
    }

    pub async fn answer_count(&self, quiz_id: &str) -> usize {
        self.tables
            .read()
            .await
            .answers
            .iter()
            .filter(|a| a.quiz_id == quiz_id)
            .count()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: User) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(AppError::AlreadyExists(format!(
                "User with username '{}' already exists",
                user.username
            )));
        }
        tables.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn add_rating(&self, id: &str, delta: i32) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("User with id '{}' not found", id)))?;
        user.rating += delta;
        Ok(())
    }
}

#[async_trait]
impl OrganizationRepository for MemoryStore {
    async fn create(&self, organization: Organization) -> AppResult<Organization> {
        self.tables
            .write()
            .await
            .organizations
            .insert(organization.id.clone(), organization.clone());
        Ok(organization)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Organization>> {
        Ok(self.tables.read().await.organizations.get(id).cloned())
    }

    async fn list_public(
        &self,
        filter: &OrganizationFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<OrganizationListing>, u64)> {
        let tables = self.tables.read().await;
        let mut listings: Vec<OrganizationListing> = tables
            .organizations
            .values()
            .filter(|o| !o.is_private && filter.matches(o))
            .map(|o| OrganizationListing {
                member_count: tables
                    .memberships
                    .iter()
                    .filter(|m| m.organization_id == o.id)
                    .count() as u64,
                organization: o.clone(),
            })
            .collect();
        listings.sort_by(|a, b| {
            b.member_count
                .cmp(&a.member_count)
                .then(a.organization.name.cmp(&b.organization.name))
        });
        Ok(paginate(listings, offset, limit))
    }
}

#[async_trait]
impl MembershipRepository for MemoryStore {
    async fn create(&self, membership: Membership) -> AppResult<Membership> {
        let mut tables = self.tables.write().await;
        if tables.memberships.iter().any(|m| {
            m.organization_id == membership.organization_id && m.user_id == membership.user_id
        }) {
            return Err(AppError::AlreadyExists(format!(
                "User '{}' already belongs to organization '{}'",
                membership.username, membership.organization_id
            )));
        }
        tables.memberships.push(membership.clone());
        Ok(membership)
    }

    async fn find(&self, organization_id: &str, user_id: &str) -> AppResult<Option<Membership>> {
        Ok(self.membership(organization_id, user_id).await)
    }

    async fn list_by_organization(
        &self,
        organization_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<Membership>, u64)> {
        let mut members: Vec<Membership> = self
            .tables
            .read()
            .await
            .memberships
            .iter()
            .filter(|m| m.organization_id == organization_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| b.role.cmp(&a.role).then(a.username.cmp(&b.username)));
        Ok(paginate(members, offset, limit))
    }

    async fn organization_ids_for_user(&self, user_id: &str) -> AppResult<Vec<String>> {
        Ok(self
            .tables
            .read()
            .await
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.organization_id.clone())
            .collect())
    }

    async fn update_role(&self, organization_id: &str, user_id: &str, role: Role) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let membership = tables
            .memberships
            .iter_mut()
            .find(|m| m.organization_id == organization_id && m.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("User '{}' is not a member", user_id)))?;
        membership.role = role;
        Ok(())
    }

    async fn delete(&self, organization_id: &str, user_id: &str) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let before = tables.memberships.len();
        tables
            .memberships
            .retain(|m| !(m.organization_id == organization_id && m.user_id == user_id));
        if tables.memberships.len() == before {
            return Err(AppError::NotFound(format!("User '{}' is not a member", user_id)));
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create_post(&self, post: OrganizationPost) -> AppResult<OrganizationPost> {
        self.tables.write().await.posts.push(post.clone());
        Ok(post)
    }

    async fn find_post(&self, id: &str) -> AppResult<Option<OrganizationPost>> {
        Ok(self
            .tables
            .read()
            .await
            .posts
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn list_posts(
        &self,
        organization_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<OrganizationPost>, u64)> {
        let posts: Vec<OrganizationPost> = self
            .tables
            .read()
            .await
            .posts
            .iter()
            .rev()
            .filter(|p| p.organization_id == organization_id)
            .cloned()
            .collect();
        Ok(paginate(posts, offset, limit))
    }

    async fn create_comment(&self, comment: Comment) -> AppResult<Comment> {
        self.tables.write().await.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(
        &self,
        post_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<Comment>, u64)> {
        let comments: Vec<Comment> = self
            .tables
            .read()
            .await
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        Ok(paginate(comments, offset, limit))
    }
}

#[async_trait]
impl QuizRepository for MemoryStore {
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz> {
        self.put_quiz(quiz.clone()).await;
        Ok(quiz)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Quiz>> {
        Ok(self.quiz(id).await)
    }

    async fn list_published(
        &self,
        member_of: Vec<String>,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<Quiz>, u64)> {
        let mut quizzes: Vec<Quiz> = self
            .tables
            .read()
            .await
            .quizzes
            .values()
            .filter(|q| q.is_published && (!q.is_private || member_of.contains(&q.organization_id)))
            .cloned()
            .collect();
        quizzes.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(paginate(quizzes, offset, limit))
    }

    async fn list_by_organization(
        &self,
        organization_id: &str,
        include_private: bool,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<Quiz>, u64)> {
        let mut quizzes: Vec<Quiz> = self
            .tables
            .read()
            .await
            .quizzes
            .values()
            .filter(|q| {
                q.organization_id == organization_id
                    && q.is_published
                    && (include_private || !q.is_private)
            })
            .cloned()
            .collect();
        quizzes.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(paginate(quizzes, offset, limit))
    }

    async fn update(&self, quiz: Quiz) -> AppResult<Quiz> {
        let mut tables = self.tables.write().await;
        if !tables.quizzes.contains_key(&quiz.id) {
            return Err(AppError::NotFound(format!("Quiz with id '{}' not found", quiz.id)));
        }
        tables.quizzes.insert(quiz.id.clone(), quiz.clone());
        Ok(quiz)
    }

    async fn mark_ended(&self, id: &str) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.quizzes.get_mut(id) {
            Some(quiz) if !quiz.is_ended => {
                quiz.is_ended = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_archived_ids(&self) -> AppResult<Vec<String>> {
        Ok(self
            .tables
            .read()
            .await
            .quizzes
            .values()
            .filter(|q| q.is_ended && !q.is_private && q.is_published)
            .map(|q| q.id.clone())
            .collect())
    }
}

#[async_trait]
impl QuestionRepository for MemoryStore {
    async fn create_many(&self, questions: Vec<Question>) -> AppResult<Vec<Question>> {
        self.tables
            .write()
            .await
            .questions
            .extend(questions.iter().cloned());
        Ok(questions)
    }

    async fn list_by_quiz(&self, quiz_id: &str) -> AppResult<Vec<Question>> {
        Ok(self.questions_of(quiz_id).await)
    }

    async fn find_in_quiz(&self, quiz_id: &str, question_id: &str) -> AppResult<Option<Question>> {
        Ok(self
            .tables
            .read()
            .await
            .questions
            .iter()
            .find(|q| q.quiz_id == quiz_id && q.id == question_id)
            .cloned())
    }

    async fn list_for_quizzes(
        &self,
        quiz_ids: Vec<String>,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<Question>, u64)> {
        let mut questions: Vec<Question> = self
            .tables
            .read()
            .await
            .questions
            .iter()
            .filter(|q| quiz_ids.contains(&q.quiz_id))
            .cloned()
            .collect();
        questions.sort_by(|a, b| a.difficulty.cmp(&b.difficulty).then(a.name.cmp(&b.name)));
        Ok(paginate(questions, offset, limit))
    }
}

#[async_trait]
impl AnswerRepository for MemoryStore {
    async fn create(&self, answer: UserAnswer) -> AppResult<UserAnswer> {
        self.tables.write().await.answers.push(answer.clone());
        Ok(answer)
    }

    async fn count_for_question(&self, question_id: &str) -> AppResult<(u64, u64)> {
        let tables = self.tables.read().await;
        let answers = tables.answers.iter().filter(|a| a.question_id == question_id);
        let (total, correct) = answers.fold((0, 0), |(total, correct), a| {
            (total + 1, correct + u64::from(a.is_correct))
        });
        Ok((total, correct))
    }

    async fn list_by_user_and_quiz(
        &self,
        user_id: &str,
        quiz_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<UserAnswer>, u64)> {
        let answers: Vec<UserAnswer> = self
            .tables
            .read()
            .await
            .answers
            .iter()
            .rev()
            .filter(|a| a.user_id == user_id && a.quiz_id == quiz_id)
            .cloned()
            .collect();
        Ok(paginate(answers, offset, limit))
    }
}

#[async_trait]
impl QuizResultRepository for MemoryStore {
    async fn create(&self, result: QuizResult) -> AppResult<QuizResult> {
        let mut tables = self.tables.write().await;
        if tables
            .results
            .iter()
            .any(|r| r.quiz_id == result.quiz_id && r.user_id == result.user_id)
        {
            return Err(AppError::AlreadyExists(format!(
                "User '{}' is already registered for quiz '{}'",
                result.username, result.quiz_id
            )));
        }
        tables.results.push(result.clone());
        Ok(result)
    }

    async fn find(&self, quiz_id: &str, user_id: &str) -> AppResult<Option<QuizResult>> {
        Ok(self.result(quiz_id, user_id).await)
    }

    async fn record_solve(
        &self,
        quiz_id: &str,
        user_id: &str,
        question_id: &str,
        rating_delta: i32,
    ) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .results
            .iter_mut()
            .find(|r| r.quiz_id == quiz_id && r.user_id == user_id)
            .is_some_and(|r| r.apply_solve(question_id, rating_delta)))
    }

    async fn list_all_for_quiz(&self, quiz_id: &str) -> AppResult<Vec<QuizResult>> {
        let mut rows: Vec<QuizResult> = self
            .tables
            .read()
            .await
            .results
            .iter()
            .filter(|r| r.quiz_id == quiz_id)
            .cloned()
            .collect();
        standings_order(&mut rows);
        Ok(rows)
    }

    async fn claim_place(&self, id: &str, place: i32) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.results.iter_mut().find(|r| r.id == id) {
            Some(row) if row.place.is_none() => {
                row.place = Some(place);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<QuizResult>, u64)> {
        let rows: Vec<QuizResult> = self
            .tables
            .read()
            .await
            .results
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        Ok(paginate(rows, offset, limit))
    }
}

pub fn jwt() -> Arc<JwtService> {
    Arc::new(JwtService::new(&SecretString::from(TEST_SECRET.to_string()), 1))
}

pub struct TestApp {
    pub store: MemoryStore,
    pub state: AppState,
    pub jwt: Arc<JwtService>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = MemoryStore::default();
        let jwt = jwt();
        let state = AppState::from_repositories(store.repositories(), jwt.clone());
        TestApp { store, state, jwt }
    }

    /// Stores a user whose password is `password` and whose id is
    /// `<username>-id`.
    pub async fn user(&self, username: &str) -> User {
        let hash = hash_password("password").expect("hashing should succeed");
        let mut user = User::new(username, &format!("{}@example.com", username), &hash);
        user.id = format!("{}-id", username);
        self.store.insert_user(user.clone()).await;
        user
    }

    pub async fn staff(&self, username: &str) -> User {
        let mut user = self.user(username).await;
        user.is_staff = true;
        self.store.insert_user(user.clone()).await;
        user
    }

    pub fn token(&self, user: &User) -> String {
        self.jwt.create_token(user).expect("token should be issued")
    }
}
