use actix_web::{get, web, HttpResponse};

use crate::{
    app_state::AppState, auth::AuthenticatedUser, errors::AppError,
    models::dto::request::PageParams,
};

#[get("/users/me")]
pub async fn me(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let profile = state.user_service.get_profile(auth.user_id()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[get("/users/{user_pk}/results")]
pub async fn results(
    state: web::Data<AppState>,
    user_pk: web::Path<String>,
    query: web::Query<PageParams>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let page = state
        .user_service
        .list_results(&user_pk, auth.user_id(), query.page())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}
