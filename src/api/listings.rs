use actix_web::{http::header, web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::{
    models::{ListingDetails, ListingPayload, ListingResponse, CATEGORIES, PLACEHOLDER_IMAGE_URL},
    services::{
        auth_service::Claims,
        image_service,
        listing_service,
        search_service::{self, SearchError},
    },
    state::AppState,
    utils::{redirect_to, redirect_with_error, AppError},
};

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ListingsResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub count: usize,
    pub listings: Vec<ListingResponse>,
}

impl ListingsResponse {
    fn new(listings: Vec<crate::models::Listing>, message: Option<String>) -> Self {
        let listings: Vec<ListingResponse> = listings.into_iter().map(ListingResponse::from).collect();
        Self {
            success: true,
            message,
            count: listings.len(),
            listings,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ListingEnvelope {
    pub success: bool,
    pub message: String,
    pub listing: ListingResponse,
    pub redirect: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ListingDetailsResponse {
    pub success: bool,
    pub listing: ListingDetails,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct EditListingResponse {
    pub success: bool,
    pub listing: ListingResponse,
    pub original_image_url: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct NewListingForm {
    pub success: bool,
    pub categories: Vec<String>,
    pub placeholder_image: String,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Free text: title, category, country, location or a price ceiling
    pub q: Option<String>,
}

pub async fn root() -> HttpResponse {
    redirect_to("/listings")
}

#[utoipa::path(
    get,
    path = "/listings",
    tag = "Listings",
    responses(
        (status = 200, description = "All listings", body = ListingsResponse)
    )
)]
pub async fn index(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let listings = listing_service::list_listings(&state).await?;
    Ok(HttpResponse::Ok().json(ListingsResponse::new(listings, None)))
}

#[utoipa::path(
    get,
    path = "/listings/new",
    tag = "Listings",
    responses(
        (status = 200, description = "Form metadata for a new listing", body = NewListingForm),
        (status = 401, description = "Not logged in")
    ),
    security(("bearer_auth" = []))
)]
pub async fn new_form() -> HttpResponse {
    HttpResponse::Ok().json(NewListingForm {
        success: true,
        categories: CATEGORIES.iter().map(|c| c.to_string()).collect(),
        placeholder_image: PLACEHOLDER_IMAGE_URL.to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/listings",
    tag = "Listings",
    request_body = ListingPayload,
    responses(
        (status = 201, description = "Listing created", body = ListingEnvelope),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not logged in")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    payload: web::Json<ListingPayload>,
) -> Result<HttpResponse, AppError> {
    let owner = claims.user_id()?;
    log::info!("🏠 POST /listings - user: {}", claims.username);

    let listing = listing_service::create_listing(&state, owner, &payload).await?;
    let redirect = format!("/listings/{}", listing.id.map(|id| id.to_hex()).unwrap_or_default());

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, redirect.clone()))
        .json(ListingEnvelope {
            success: true,
            message: "New Listing is created!".to_string(),
            listing: listing.into(),
            redirect,
        }))
}

#[utoipa::path(
    get,
    path = "/listings/search",
    tag = "Listings",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching listings and how they matched", body = ListingsResponse),
        (status = 303, description = "Empty query or no match, back to /listings")
    )
)]
pub async fn search(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, AppError> {
    let raw = query.q.as_deref().unwrap_or_default();

    match search_service::search_listings(state.listings.as_ref(), raw).await {
        Ok(outcome) => Ok(HttpResponse::Ok().json(ListingsResponse::new(
            outcome.listings,
            Some(outcome.matched_by.message()),
        ))),
        Err(SearchError::Store(e)) => Err(e),
        Err(e) => Ok(redirect_with_error("/listings", e.to_string())),
    }
}

#[utoipa::path(
    get,
    path = "/listings/filter/{category}",
    tag = "Listings",
    params(("category" = String, Path, description = "Category slug, e.g. iconic-cities")),
    responses(
        (status = 200, description = "Listings in the category", body = ListingsResponse),
        (status = 303, description = "No listings for the category")
    )
)]
pub async fn filter(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let slug = path.into_inner();
    let listings = search_service::filter_by_category(state.listings.as_ref(), &slug).await?;

    if listings.is_empty() {
        return Ok(redirect_with_error(
            "/listings",
            format!("There are no listings for {}!", slug),
        ));
    }

    Ok(HttpResponse::Ok().json(ListingsResponse::new(
        listings,
        Some(format!("Listings Filtered by {}!", slug)),
    )))
}

#[utoipa::path(
    get,
    path = "/listings/{id}",
    tag = "Listings",
    params(("id" = String, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing with owner and reviews", body = ListingDetailsResponse),
        (status = 404, description = "Listing does not exist")
    )
)]
pub async fn show(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let details = listing_service::show_listing(&state, &path).await?;
    Ok(HttpResponse::Ok().json(ListingDetailsResponse {
        success: true,
        listing: details,
    }))
}

#[utoipa::path(
    get,
    path = "/listings/{id}/edit",
    tag = "Listings",
    params(("id" = String, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing and image preview", body = EditListingResponse),
        (status = 403, description = "Not the owner")
    ),
    security(("bearer_auth" = []))
)]
pub async fn edit(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let requester = claims.user_id()?;
    let (listing, preview) = listing_service::edit_listing(&state, &requester, &path).await?;

    Ok(HttpResponse::Ok().json(EditListingResponse {
        success: true,
        listing: listing.into(),
        original_image_url: preview,
    }))
}

#[utoipa::path(
    put,
    path = "/listings/{id}",
    tag = "Listings",
    params(("id" = String, Path, description = "Listing id")),
    request_body = ListingPayload,
    responses(
        (status = 200, description = "Listing updated", body = ListingEnvelope),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Not the owner")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    payload: web::Json<ListingPayload>,
) -> Result<HttpResponse, AppError> {
    let requester = claims.user_id()?;
    log::info!("✏️  PUT /listings/{} - user: {}", path.as_str(), claims.username);

    let listing = listing_service::update_listing(&state, &requester, &path, &payload).await?;

    Ok(HttpResponse::Ok().json(ListingEnvelope {
        success: true,
        message: "Listing updated!".to_string(),
        redirect: format!("/listings/{}", path.as_str()),
        listing: listing.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/listings/{id}",
    tag = "Listings",
    params(("id" = String, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing and its reviews deleted"),
        (status = 403, description = "Not the owner")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let requester = claims.user_id()?;
    log::info!("🗑️  DELETE /listings/{} - user: {}", path.as_str(), claims.username);

    let deleted = listing_service::delete_listing(&state, &requester, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Listing is Deleted",
        "id": deleted.id.map(|id| id.to_hex()),
        "redirect": "/listings",
    })))
}

#[utoipa::path(
    post,
    path = "/listings/{id}/reserve",
    tag = "Listings",
    params(("id" = String, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Reservation acknowledged"),
        (status = 404, description = "Listing does not exist")
    ),
    security(("bearer_auth" = []))
)]
pub async fn reserve(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let listing = listing_service::get_listing(&state, &path).await?;
    log::info!("📅 Reservation request for '{}' by {}", listing.title, claims.username);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Reservation details are sent to your email",
        "redirect": format!("/listings/{}", path.as_str()),
    })))
}

/// Serves files written by the local image store.
pub async fn upload(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let filename = path.into_inner();
    match state.images.load(&filename).await? {
        Some(bytes) => Ok(HttpResponse::Ok()
            .content_type(image_service::content_type_for(&filename))
            .insert_header((header::CACHE_CONTROL, "public, max-age=86400"))
            .body(bytes)),
        None => Ok(HttpResponse::NotFound().finish()),
    }
}
