use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::{
    models::{ReviewPayload, ReviewResponse, UserInfo},
    services::{auth_service::Claims, review_service},
    state::AppState,
    utils::AppError,
};

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ReviewEnvelope {
    pub success: bool,
    pub message: String,
    pub review: ReviewResponse,
    pub redirect: String,
}

#[utoipa::path(
    post,
    path = "/listings/{id}/reviews",
    tag = "Reviews",
    params(("id" = String, Path, description = "Listing id")),
    request_body = ReviewPayload,
    responses(
        (status = 201, description = "Review created", body = ReviewEnvelope),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Listing does not exist")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    payload: web::Json<ReviewPayload>,
) -> Result<HttpResponse, AppError> {
    let author = claims.user_id()?;
    let review = review_service::create_review(&state, author, &path, &payload).await?;

    let author_info = state.users.get_user(&author).await?.as_ref().map(UserInfo::from);

    Ok(HttpResponse::Created().json(ReviewEnvelope {
        success: true,
        message: "New Review created!".to_string(),
        review: ReviewResponse::new(review, author_info),
        redirect: format!("/listings/{}", path.as_str()),
    }))
}

#[utoipa::path(
    delete,
    path = "/listings/{id}/reviews/{review_id}",
    tag = "Reviews",
    params(
        ("id" = String, Path, description = "Listing id"),
        ("review_id" = String, Path, description = "Review id")
    ),
    responses(
        (status = 200, description = "Review deleted"),
        (status = 403, description = "Not the author")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let requester = claims.user_id()?;
    let (listing_id, review_id) = path.into_inner();

    review_service::delete_review(&state, &requester, &listing_id, &review_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Review deleted!",
        "redirect": format!("/listings/{}", listing_id),
    })))
}
