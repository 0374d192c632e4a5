pub mod auth_handler;
pub mod health_handler;
pub mod organization_handler;
pub mod quiz_handler;
pub mod user_handler;

use actix_web::{http::header, web, HttpResponse};

use crate::{
    auth::AuthMiddleware,
    errors::{AppError, AppResult},
    models::dto::response::FlashMessage,
};

/// Mounts every route under `/api`. Everything except auth and health sits
/// behind [`AuthMiddleware`].
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auth")
            .service(auth_handler::signup)
            .service(auth_handler::login),
    )
    .service(
        web::scope("/api/health")
            .service(health_handler::health_check)
            .service(health_handler::health_check_ready),
    )
    .service(
        web::scope("/api")
            .wrap(AuthMiddleware)
            .service(user_handler::me)
            .service(user_handler::results)
            .service(organization_handler::list_organizations)
            .service(organization_handler::create_organization)
            .service(organization_handler::get_organization)
            .service(organization_handler::join_organization)
            .service(organization_handler::list_members)
            .service(organization_handler::invite_member)
            .service(organization_handler::remove_member)
            .service(organization_handler::change_role)
            .service(organization_handler::list_posts)
            .service(organization_handler::create_post)
            .service(organization_handler::get_post)
            .service(organization_handler::list_comments)
            .service(organization_handler::add_comment)
            .service(organization_handler::list_organization_quizzes)
            .service(organization_handler::create_quiz)
            .service(quiz_handler::list_quizzes)
            .service(quiz_handler::archive)
            .service(quiz_handler::get_quiz)
            .service(quiz_handler::register)
            .service(quiz_handler::list_questions)
            .service(quiz_handler::get_question)
            .service(quiz_handler::submit_answer)
            .service(quiz_handler::my_answers)
            .service(quiz_handler::standings)
            .service(quiz_handler::finalize)
            .service(quiz_handler::moderate),
    );
}

pub fn see_other(location: &str, flash: FlashMessage) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .json(flash)
}

/// Redirects with a flash note. Refusals the user can act on become an
/// error flash; anything else is returned as a regular error response.
pub fn flash_redirect(location: &str, outcome: AppResult<String>) -> Result<HttpResponse, AppError> {
    match outcome {
        Ok(message) => Ok(see_other(location, FlashMessage::success(message))),
        Err(AppError::PermissionDenied(message)) | Err(AppError::AlreadyExists(message)) => {
            Ok(see_other(location, FlashMessage::error(message)))
        }
        Err(err) => Err(err),
    }
}
