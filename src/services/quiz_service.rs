use std::sync::Arc;

use chrono::{DateTime, Utc};
use validator::Validate;

use crate::{
    auth::{policy, Claims},
    constants::{
        ANSWERS_PAGE_SIZE, ARCHIVE_PAGE_SIZE, ORGANIZATION_QUIZZES_PAGE_SIZE, QUIZZES_PAGE_SIZE,
        STANDINGS_PAGE_SIZE,
    },
    db::page_offset,
    errors::{AppError, AppResult},
    models::{
        domain::{Membership, Question, Quiz, QuizPhase, QuizResult, UserAnswer, Variant},
        dto::{
            request::{CreateQuizRequest, ModerateQuizRequest, SubmitAnswerRequest},
            response::{
                ArchivedQuestion, Page, QuestionForTaking, QuestionSummary, QuizDetail,
                StandingRow, SubmissionResponse,
            },
        },
    },
    repositories::{
        AnswerRepository, MembershipRepository, OrganizationRepository, QuestionRepository,
        QuizRepository, QuizResultRepository, UserRepository,
    },
    services::scoring,
};

/// A published quiz the caller may see, with the caller's standing in it.
struct QuizAccess {
    quiz: Quiz,
    membership: Option<Membership>,
    registration: Option<QuizResult>,
}

impl QuizAccess {
    fn can_access_questions(&self, now: DateTime<Utc>) -> bool {
        policy::can_access_questions(
            self.quiz.phase_at(now),
            &self.quiz,
            self.membership.as_ref(),
            self.registration.is_some(),
        )
    }
}

pub struct QuizService {
    quizzes: Arc<dyn QuizRepository>,
    questions: Arc<dyn QuestionRepository>,
    answers: Arc<dyn AnswerRepository>,
    results: Arc<dyn QuizResultRepository>,
    organizations: Arc<dyn OrganizationRepository>,
    memberships: Arc<dyn MembershipRepository>,
    users: Arc<dyn UserRepository>,
}

impl QuizService {
    pub fn new(
        quizzes: Arc<dyn QuizRepository>,
        questions: Arc<dyn QuestionRepository>,
        answers: Arc<dyn AnswerRepository>,
        results: Arc<dyn QuizResultRepository>,
        organizations: Arc<dyn OrganizationRepository>,
        memberships: Arc<dyn MembershipRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            quizzes,
            questions,
            answers,
            results,
            organizations,
            memberships,
            users,
        }
    }

    /// A published quiz with the caller's membership and registration,
    /// before any visibility rule is applied.
    async fn load(&self, quiz_id: &str, user_id: &str) -> AppResult<QuizAccess> {
        let quiz = self
            .quizzes
            .find_by_id(quiz_id)
            .await?
            .filter(|quiz| quiz.is_published)
            .ok_or_else(|| quiz_not_found(quiz_id))?;

        let membership = self.memberships.find(&quiz.organization_id, user_id).await?;
        let registration = self.results.find(quiz_id, user_id).await?;

        Ok(QuizAccess {
            quiz,
            membership,
            registration,
        })
    }

    async fn access(&self, quiz_id: &str, user_id: &str) -> AppResult<QuizAccess> {
        let access = self.load(quiz_id, user_id).await?;
        if !policy::can_access_quiz(&access.quiz, access.membership.as_ref()) {
            return Err(quiz_not_found(quiz_id));
        }
        Ok(access)
    }

    /// Questions, submissions and standings. A registered participant keeps
    /// access to a running quiz even without organization membership.
    async fn question_access(
        &self,
        quiz_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<QuizAccess> {
        let access = self.load(quiz_id, user_id).await?;
        if !access.can_access_questions(now) {
            return Err(AppError::NotFound(format!(
                "Questions of quiz '{}' are not available",
                quiz_id
            )));
        }
        Ok(access)
    }

    /// Published quizzes that are public or organized by one of the caller's
    /// organizations.
    pub async fn list(&self, user_id: &str, page: u64) -> AppResult<Page<Quiz>> {
        let member_of = self.memberships.organization_ids_for_user(user_id).await?;
        let (quizzes, total) = self
            .quizzes
            .list_published(
                member_of,
                page_offset(page, QUIZZES_PAGE_SIZE),
                QUIZZES_PAGE_SIZE,
            )
            .await?;
        Ok(Page::new(quizzes, page, QUIZZES_PAGE_SIZE, total))
    }

    pub async fn list_for_organization(
        &self,
        organization_id: &str,
        user_id: &str,
        page: u64,
    ) -> AppResult<Page<Quiz>> {
        let organization = self
            .organizations
            .find_by_id(organization_id)
            .await?
            .ok_or_else(|| organization_not_found(organization_id))?;
        let membership = self.memberships.find(organization_id, user_id).await?;
        if !policy::can_view_organization(&organization, membership.as_ref()) {
            return Err(organization_not_found(organization_id));
        }

        let (quizzes, total) = self
            .quizzes
            .list_by_organization(
                organization_id,
                membership.is_some(),
                page_offset(page, ORGANIZATION_QUIZZES_PAGE_SIZE),
                ORGANIZATION_QUIZZES_PAGE_SIZE,
            )
            .await?;
        Ok(Page::new(quizzes, page, ORGANIZATION_QUIZZES_PAGE_SIZE, total))
    }

    /// New quizzes wait for moderation before anyone sees them.
    pub async fn create(
        &self,
        organization_id: &str,
        creator: &Claims,
        request: CreateQuizRequest,
    ) -> AppResult<Quiz> {
        request.validate()?;
        if let Some(question) = request
            .questions
            .iter()
            .find(|q| !q.variants.iter().any(|v| v.is_correct))
        {
            return Err(AppError::ValidationError(format!(
                "Question '{}' has no correct variant",
                question.name
            )));
        }

        let organization = self
            .organizations
            .find_by_id(organization_id)
            .await?
            .ok_or_else(|| organization_not_found(organization_id))?;
        let membership = self
            .memberships
            .find(organization_id, creator.user_id())
            .await?;
        if !policy::can_view_organization(&organization, membership.as_ref()) {
            return Err(organization_not_found(organization_id));
        }
        if !policy::is_admin(membership.as_ref()) {
            return Err(AppError::PermissionDenied(
                "Only administrators can create quizzes".to_string(),
            ));
        }

        let quiz = Quiz::new(
            request.name.trim(),
            &request.description,
            organization_id,
            creator.user_id(),
            request.start_time,
            request.duration,
            request.is_private,
            request.is_rated,
        );

        let questions = request
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let variants = q
                    .variants
                    .iter()
                    .map(|v| Variant::new(&v.text, v.is_correct))
                    .collect();
                Question::new(
                    &quiz.id,
                    &q.name,
                    &q.text,
                    q.difficulty,
                    i as i32 + 1,
                    q.tags.clone(),
                    variants,
                )
            })
            .collect();

        // Questions first: a quiz document never exists without them.
        self.questions.create_many(questions).await?;
        let quiz = self.quizzes.create(quiz).await?;

        log::info!(
            "User {} created quiz {} in organization {}",
            creator.username,
            quiz.id,
            organization_id
        );
        Ok(quiz)
    }

    pub async fn detail(
        &self,
        quiz_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<QuizDetail> {
        let access = self.access(quiz_id, user_id).await?;
        let can_access_questions = access.can_access_questions(now);

        Ok(QuizDetail {
            phase: access.quiz.phase_at(now),
            end_time: access.quiz.end_time(),
            can_participate: access.registration.is_some(),
            can_access_questions,
            quiz: access.quiz,
        })
    }

    /// Registration is open in every phase.
    pub async fn register(&self, quiz_id: &str, user_id: &str) -> AppResult<QuizResult> {
        let access = self.access(quiz_id, user_id).await?;
        if access.registration.is_some() {
            return Err(AppError::AlreadyExists(format!(
                "You are already registered for {}",
                access.quiz.name
            )));
        }

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))?;

        let result = self
            .results
            .create(QuizResult::register(
                quiz_id,
                &user.id,
                &user.username,
                user.rating,
            ))
            .await?;

        log::info!("User {} registered for quiz {}", user.username, quiz_id);
        Ok(result)
    }

    pub async fn questions(
        &self,
        quiz_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<QuestionSummary>> {
        self.question_access(quiz_id, user_id, now).await?;

        let questions = self.questions.list_by_quiz(quiz_id).await?;
        let mut summaries = Vec::with_capacity(questions.len());
        for question in questions {
            let (total_answers, success_answers) =
                self.answers.count_for_question(&question.id).await?;
            summaries.push(QuestionSummary {
                id: question.id,
                name: question.name,
                difficulty: question.difficulty,
                total_answers,
                success_answers,
            });
        }
        Ok(summaries)
    }

    pub async fn question(
        &self,
        quiz_id: &str,
        question_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<QuestionForTaking> {
        self.question_access(quiz_id, user_id, now).await?;
        self.find_question(quiz_id, question_id)
            .await
            .map(QuestionForTaking::from)
    }

    /// Records the answer, then scores it when it is the participant's first
    /// correct answer to the question while the quiz runs.
    pub async fn submit_answer(
        &self,
        quiz_id: &str,
        question_id: &str,
        user: &Claims,
        request: SubmitAnswerRequest,
        now: DateTime<Utc>,
    ) -> AppResult<SubmissionResponse> {
        request.validate()?;

        let access = self.question_access(quiz_id, user.user_id(), now).await?;
        let question = self.find_question(quiz_id, question_id).await?;
        let variant = question.variant(&request.variant_id).ok_or_else(|| {
            AppError::ValidationError(format!(
                "Variant '{}' does not belong to question '{}'",
                request.variant_id, question_id
            ))
        })?;
        let is_correct = variant.is_correct;

        let answer = self
            .answers
            .create(UserAnswer::new(
                user.user_id(),
                &user.username,
                quiz_id,
                question_id,
                &question.name,
                &variant.id,
                is_correct,
                now,
            ))
            .await?;

        let phase = access.quiz.phase_at(now);
        let scored = if scoring::should_score(phase, access.registration.is_some(), is_correct) {
            self.results
                .record_solve(
                    quiz_id,
                    user.user_id(),
                    question_id,
                    scoring::rating_delta(&access.quiz, &question),
                )
                .await?
        } else {
            false
        };

        log::debug!(
            "Answer {} by {} to {}: correct={} scored={}",
            answer.id,
            user.username,
            question_id,
            is_correct,
            scored
        );

        Ok(SubmissionResponse {
            answer_id: answer.id,
            is_correct,
            scored,
        })
    }

    pub async fn my_answers(
        &self,
        quiz_id: &str,
        user_id: &str,
        page: u64,
        now: DateTime<Utc>,
    ) -> AppResult<Page<UserAnswer>> {
        self.question_access(quiz_id, user_id, now).await?;

        let (answers, total) = self
            .answers
            .list_by_user_and_quiz(
                user_id,
                quiz_id,
                page_offset(page, ANSWERS_PAGE_SIZE),
                ANSWERS_PAGE_SIZE,
            )
            .await?;
        Ok(Page::new(answers, page, ANSWERS_PAGE_SIZE, total))
    }

    /// Places come from finalization when every row has one, otherwise they
    /// are computed from the current order.
    pub async fn standings(
        &self,
        quiz_id: &str,
        user_id: &str,
        page: u64,
        now: DateTime<Utc>,
    ) -> AppResult<Page<StandingRow>> {
        self.question_access(quiz_id, user_id, now).await?;

        let results = self.results.list_all_for_quiz(quiz_id).await?;
        let places: Vec<i32> = if results.iter().all(|r| r.place.is_some()) {
            results.iter().filter_map(|r| r.place).collect()
        } else {
            scoring::competition_places(&results)
        };

        let total = results.len() as u64;
        let offset = page_offset(page, STANDINGS_PAGE_SIZE) as usize;
        let items = results
            .into_iter()
            .zip(places)
            .skip(offset)
            .take(STANDINGS_PAGE_SIZE as usize)
            .map(|(result, place)| StandingRow {
                place,
                user_id: result.user_id,
                username: result.username,
                solved: result.solved,
                rating_before: result.rating_before,
                rating_after: result.rating_after,
            })
            .collect();

        Ok(Page::new(items, page, STANDINGS_PAGE_SIZE, total))
    }

    /// Freezes the standings of a finished quiz. For rated quizzes every
    /// participant's rating grows by what they gained in this quiz. Returns
    /// the number of participants.
    ///
    /// Each row is claimed through its place, so a rerun after a failure
    /// only finishes the rows left without one and never applies a gain
    /// twice. The quiz is marked ended last.
    pub async fn finalize(
        &self,
        quiz_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<usize> {
        let access = self.access(quiz_id, user_id).await?;
        if !policy::is_admin(access.membership.as_ref()) {
            return Err(AppError::PermissionDenied(
                "Only organization administrators can finalize a quiz".to_string(),
            ));
        }
        if access.quiz.phase_at(now) != QuizPhase::Finished {
            return Err(AppError::ValidationError(format!(
                "Quiz '{}' has not finished yet",
                access.quiz.name
            )));
        }
        if access.quiz.is_ended {
            return Err(AppError::ValidationError(format!(
                "Standings of quiz '{}' are already final",
                access.quiz.name
            )));
        }

        let results = self.results.list_all_for_quiz(quiz_id).await?;
        let places = scoring::competition_places(&results);
        for (result, place) in results.iter().zip(places) {
            if result.place.is_some() || !self.results.claim_place(&result.id, place).await? {
                continue;
            }
            let gain = result.rating_gain();
            if access.quiz.is_rated && gain != 0 {
                self.users.add_rating(&result.user_id, gain).await?;
            }
        }

        if !self.quizzes.mark_ended(quiz_id).await? {
            log::debug!("Quiz {} was already marked ended", quiz_id);
        }

        log::info!(
            "Quiz {} finalized with {} participants",
            quiz_id,
            results.len()
        );
        Ok(results.len())
    }

    /// Questions of ended public quizzes, easiest first.
    pub async fn archive(&self, page: u64) -> AppResult<Page<ArchivedQuestion>> {
        let quiz_ids = self.quizzes.list_archived_ids().await?;
        if quiz_ids.is_empty() {
            return Ok(Page::new(Vec::new(), page, ARCHIVE_PAGE_SIZE, 0));
        }

        let (questions, total) = self
            .questions
            .list_for_quizzes(
                quiz_ids,
                page_offset(page, ARCHIVE_PAGE_SIZE),
                ARCHIVE_PAGE_SIZE,
            )
            .await?;

        Ok(Page::new(questions, page, ARCHIVE_PAGE_SIZE, total).map(ArchivedQuestion::from))
    }

    /// Staff-only edits of publication and the persisted status.
    pub async fn moderate(
        &self,
        quiz_id: &str,
        moderator: &Claims,
        request: ModerateQuizRequest,
    ) -> AppResult<Quiz> {
        if !moderator.is_staff {
            return Err(AppError::PermissionDenied(
                "Only moderators can review quizzes".to_string(),
            ));
        }

        let mut quiz = self
            .quizzes
            .find_by_id(quiz_id)
            .await?
            .ok_or_else(|| quiz_not_found(quiz_id))?;

        if let Some(is_published) = request.is_published {
            quiz.is_published = is_published;
        }
        if let Some(status) = request.status {
            quiz.status = status;
        }

        let quiz = self.quizzes.update(quiz).await?;
        log::info!(
            "Moderator {} set quiz {} published={} status={:?}",
            moderator.username,
            quiz.id,
            quiz.is_published,
            quiz.status
        );
        Ok(quiz)
    }

    async fn find_question(&self, quiz_id: &str, question_id: &str) -> AppResult<Question> {
        self.questions
            .find_in_quiz(quiz_id, question_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Question with id '{}' not found", question_id))
            })
    }
}

fn quiz_not_found(quiz_id: &str) -> AppError {
    AppError::NotFound(format!("Quiz with id '{}' not found", quiz_id))
}

fn organization_not_found(organization_id: &str) -> AppError {
    AppError::NotFound(format!(
        "Organization with id '{}' not found",
        organization_id
    ))
}
