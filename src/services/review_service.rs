use chrono::Utc;
use mongodb::bson::oid::ObjectId;

use crate::{
    models::{Review, ReviewPayload},
    services::{
        listing_service::{parse_listing_id, LISTING_NOT_FOUND},
        validation::validate_review,
    },
    state::AppState,
    utils::AppError,
};

pub const REVIEW_NOT_FOUND: &str = "Review you requested for does not exist";
pub const NOT_AUTHOR: &str = "You are not the author of this review";

fn parse_review_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| AppError::NotFound(REVIEW_NOT_FOUND.to_string()))
}

pub async fn create_review(
    state: &AppState,
    author: ObjectId,
    raw_listing_id: &str,
    payload: &ReviewPayload,
) -> Result<Review, AppError> {
    let listing_id = parse_listing_id(raw_listing_id)?;
    let draft = validate_review(payload)?;

    let review = Review {
        id: None,
        comment: draft.comment,
        rating: draft.rating,
        created_at: Utc::now().timestamp(),
        author: Some(author),
    };

    let created = state
        .listings
        .add_review(&listing_id, review)
        .await?
        .ok_or_else(|| AppError::NotFound(LISTING_NOT_FOUND.to_string()))?;

    log::info!("⭐ Review added to listing {} ({} stars)", listing_id, created.rating);
    Ok(created)
}

/// Author-only delete; the id is pulled from the listing as well.
pub async fn delete_review(
    state: &AppState,
    requester: &ObjectId,
    raw_listing_id: &str,
    raw_review_id: &str,
) -> Result<(), AppError> {
    let listing_id = parse_listing_id(raw_listing_id)?;
    let review_id = parse_review_id(raw_review_id)?;

    let listing = state
        .listings
        .get_listing(&listing_id)
        .await?
        .ok_or_else(|| AppError::NotFound(LISTING_NOT_FOUND.to_string()))?;

    // Review must hang off this listing
    if !listing.reviews.contains(&review_id) {
        return Err(AppError::NotFound(REVIEW_NOT_FOUND.to_string()));
    }

    let review = state
        .listings
        .get_review(&review_id)
        .await?
        .ok_or_else(|| AppError::NotFound(REVIEW_NOT_FOUND.to_string()))?;

    if review.author.as_ref() != Some(requester) {
        return Err(AppError::Forbidden(NOT_AUTHOR.to_string()));
    }

    if !state.listings.delete_review(&listing_id, &review_id).await? {
        return Err(AppError::NotFound(REVIEW_NOT_FOUND.to_string()));
    }

    log::info!("🗑️  Review {} deleted from listing {}", review_id, listing_id);
    Ok(())
}
