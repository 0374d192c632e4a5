use actix_web::{get, post, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    handlers::flash_redirect,
    models::{
        domain::Role,
        dto::{
            request::{
                CreateCommentRequest, CreateOrganizationRequest, CreatePostRequest,
                CreateQuizRequest, InviteMemberRequest, OrganizationSearchParams, PageParams,
            },
            response::MemberDto,
        },
    },
};

#[get("/organizations")]
pub async fn list_organizations(
    state: web::Data<AppState>,
    query: web::Query<OrganizationSearchParams>,
    _auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let page = state.organization_service.list(&query).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/organizations")]
pub async fn create_organization(
    state: web::Data<AppState>,
    request: web::Json<CreateOrganizationRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let organization = state
        .organization_service
        .create(request.into_inner(), &auth.0)
        .await?;
    Ok(HttpResponse::Created().json(organization))
}

#[get("/organizations/{pk}")]
pub async fn get_organization(
    state: web::Data<AppState>,
    pk: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let detail = state.organization_service.detail(&pk, auth.user_id()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[post("/organizations/{pk}/join")]
pub async fn join_organization(
    state: web::Data<AppState>,
    pk: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let membership = state.organization_service.join(&pk, &auth.0).await?;
    Ok(HttpResponse::Created().json(MemberDto {
        user_id: membership.user_id,
        username: membership.username,
        role: membership.role,
    }))
}

#[get("/organizations/{pk}/users")]
pub async fn list_members(
    state: web::Data<AppState>,
    pk: web::Path<String>,
    query: web::Query<PageParams>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let page = state
        .organization_service
        .members(&pk, auth.user_id(), query.page())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/organizations/{pk}/users")]
pub async fn invite_member(
    state: web::Data<AppState>,
    pk: web::Path<String>,
    request: web::Json<InviteMemberRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let member = state
        .organization_service
        .invite(&pk, auth.user_id(), request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(member))
}

#[get("/organizations/{pk}/users/{user_pk}/delete")]
pub async fn remove_member(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (pk, user_pk) = path.into_inner();
    let outcome = state
        .organization_service
        .remove_member(&pk, auth.user_id(), &user_pk)
        .await
        .map(|username| format!("{} was removed from the organization", username));

    flash_redirect(&format!("/api/organizations/{}/users", pk), outcome)
}

#[get("/organizations/{pk}/users/{user_pk}/role/{new_role}")]
pub async fn change_role(
    state: web::Data<AppState>,
    path: web::Path<(String, String, i32)>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (pk, user_pk, new_role) = path.into_inner();
    let new_role = Role::try_from(new_role).map_err(AppError::ValidationError)?;

    let outcome = state
        .organization_service
        .change_role(&pk, auth.user_id(), &user_pk, new_role)
        .await
        .map(|username| format!("{} is now {}", username, new_role));

    flash_redirect(&format!("/api/organizations/{}/users", pk), outcome)
}

#[get("/organizations/{pk}/posts")]
pub async fn list_posts(
    state: web::Data<AppState>,
    pk: web::Path<String>,
    query: web::Query<PageParams>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let page = state
        .organization_service
        .posts(&pk, auth.user_id(), query.page())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/organizations/{pk}/posts")]
pub async fn create_post(
    state: web::Data<AppState>,
    pk: web::Path<String>,
    request: web::Json<CreatePostRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let post = state
        .organization_service
        .create_post(&pk, auth.user_id(), request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(post))
}

#[get("/organizations/{pk}/posts/{post_pk}")]
pub async fn get_post(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (pk, post_pk) = path.into_inner();
    let post = state
        .organization_service
        .post(&pk, &post_pk, auth.user_id())
        .await?;
    Ok(HttpResponse::Ok().json(post))
}

#[get("/organizations/{pk}/posts/{post_pk}/comments")]
pub async fn list_comments(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    query: web::Query<PageParams>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (pk, post_pk) = path.into_inner();
    let page = state
        .organization_service
        .comments(&pk, &post_pk, auth.user_id(), query.page())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/organizations/{pk}/posts/{post_pk}/comments")]
pub async fn add_comment(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    request: web::Json<CreateCommentRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (pk, post_pk) = path.into_inner();
    let comment = state
        .organization_service
        .add_comment(&pk, &post_pk, &auth.0, request.into_inner())
        .await?;

    Ok(match comment {
        Some(comment) => HttpResponse::Created().json(comment),
        None => HttpResponse::NoContent().finish(),
    })
}

#[get("/organizations/{pk}/quizzes")]
pub async fn list_organization_quizzes(
    state: web::Data<AppState>,
    pk: web::Path<String>,
    query: web::Query<PageParams>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let page = state
        .quiz_service
        .list_for_organization(&pk, auth.user_id(), query.page())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/organizations/{pk}/quizzes")]
pub async fn create_quiz(
    state: web::Data<AppState>,
    pk: web::Path<String>,
    request: web::Json<CreateQuizRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let quiz = state
        .quiz_service
        .create(&pk, &auth.0, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(quiz))
}
