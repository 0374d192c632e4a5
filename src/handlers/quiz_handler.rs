use actix_web::{get, post, put, web, HttpResponse};
use chrono::Utc;

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    handlers::flash_redirect,
    models::dto::request::{ModerateQuizRequest, PageParams, SubmitAnswerRequest},
};

#[get("/quizzes")]
pub async fn list_quizzes(
    state: web::Data<AppState>,
    query: web::Query<PageParams>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let page = state
        .quiz_service
        .list(auth.user_id(), query.page())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/quizzes/{pk}")]
pub async fn get_quiz(
    state: web::Data<AppState>,
    pk: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let detail = state
        .quiz_service
        .detail(&pk, auth.user_id(), Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[get("/quizzes/{pk}/register")]
pub async fn register(
    state: web::Data<AppState>,
    pk: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let outcome = state
        .quiz_service
        .register(&pk, auth.user_id())
        .await
        .map(|_| "You are registered for the quiz".to_string());

    flash_redirect(&format!("/api/quizzes/{}", pk), outcome)
}

#[get("/quizzes/{pk}/questions")]
pub async fn list_questions(
    state: web::Data<AppState>,
    pk: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let questions = state
        .quiz_service
        .questions(&pk, auth.user_id(), Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(questions))
}

#[get("/quizzes/{pk}/questions/{question_pk}")]
pub async fn get_question(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (pk, question_pk) = path.into_inner();
    let question = state
        .quiz_service
        .question(&pk, &question_pk, auth.user_id(), Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(question))
}

#[post("/quizzes/{pk}/questions/{question_pk}")]
pub async fn submit_answer(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    request: web::Json<SubmitAnswerRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (pk, question_pk) = path.into_inner();
    let response = state
        .quiz_service
        .submit_answer(&pk, &question_pk, &auth.0, request.into_inner(), Utc::now())
        .await?;
    Ok(HttpResponse::Created().json(response))
}

#[get("/quizzes/{pk}/answers")]
pub async fn my_answers(
    state: web::Data<AppState>,
    pk: web::Path<String>,
    query: web::Query<PageParams>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let page = state
        .quiz_service
        .my_answers(&pk, auth.user_id(), query.page(), Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/quizzes/{pk}/standings")]
pub async fn standings(
    state: web::Data<AppState>,
    pk: web::Path<String>,
    query: web::Query<PageParams>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let page = state
        .quiz_service
        .standings(&pk, auth.user_id(), query.page(), Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/quizzes/{pk}/finalize")]
pub async fn finalize(
    state: web::Data<AppState>,
    pk: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let participants = state
        .quiz_service
        .finalize(&pk, auth.user_id(), Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "quiz_id": pk.as_str(),
        "participants": participants,
    })))
}

#[get("/questions/archive")]
pub async fn archive(
    state: web::Data<AppState>,
    query: web::Query<PageParams>,
    _auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let page = state.quiz_service.archive(query.page()).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[put("/moderation/quizzes/{pk}")]
pub async fn moderate(
    state: web::Data<AppState>,
    pk: web::Path<String>,
    request: web::Json<ModerateQuizRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let quiz = state
        .quiz_service
        .moderate(&pk, &auth.0, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(quiz))
}
