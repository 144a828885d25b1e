use mongodb::bson::oid::ObjectId;

use crate::{
    database::{ListingFilter, ListingOrder},
    models::{
        Geometry, Image, Listing, ListingChanges, ListingDetails, ListingPayload, ListingResponse,
        ReviewResponse, UserInfo,
    },
    services::{
        geocoding_service::GeocodeOutcome,
        image_service,
        validation::{validate_listing, validate_listing_changes},
    },
    state::AppState,
    utils::AppError,
};

pub const LISTING_NOT_FOUND: &str = "Listing you requested for does not exist";
pub const NOT_OWNER: &str = "You are not the owner of this listing";

/// Malformed ids are reported like unknown ones.
pub fn parse_listing_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| AppError::NotFound(LISTING_NOT_FOUND.to_string()))
}

pub async fn list_listings(state: &AppState) -> Result<Vec<Listing>, AppError> {
    state
        .listings
        .find_listings(&ListingFilter::All, ListingOrder::Natural)
        .await
}

pub async fn get_listing(state: &AppState, raw_id: &str) -> Result<Listing, AppError> {
    let id = parse_listing_id(raw_id)?;
    state
        .listings
        .get_listing(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(LISTING_NOT_FOUND.to_string()))
}

/// Loads the listing and checks that `requester` owns it.
pub async fn get_owned_listing(
    state: &AppState,
    requester: &ObjectId,
    raw_id: &str,
) -> Result<Listing, AppError> {
    let listing = get_listing(state, raw_id).await?;
    if !listing.is_owned_by(requester) {
        return Err(AppError::Forbidden(NOT_OWNER.to_string()));
    }
    Ok(listing)
}

/// Listing with owner and reviews (and their authors) resolved.
pub async fn show_listing(state: &AppState, raw_id: &str) -> Result<ListingDetails, AppError> {
    let listing = get_listing(state, raw_id).await?;
    let reviews = state.listings.find_reviews(&listing.reviews).await?;

    let mut user_ids: Vec<ObjectId> = reviews.iter().filter_map(|r| r.author).collect();
    user_ids.extend(listing.owner);
    user_ids.sort();
    user_ids.dedup();
    let users = state.users.find_users(&user_ids).await?;

    let info_for = |id: Option<ObjectId>| {
        id.and_then(|id| users.iter().find(|u| u.id == Some(id)))
            .map(UserInfo::from)
    };

    Ok(ListingDetails {
        owner_info: info_for(listing.owner),
        review_details: reviews
            .into_iter()
            .map(|r| {
                let author = info_for(r.author);
                ReviewResponse::new(r, author)
            })
            .collect(),
        listing: ListingResponse::from(listing),
    })
}

async fn geometry_for(state: &AppState, location: &str) -> GeocodeOutcome {
    let outcome = state.geocoder.forward(location).await;
    if let GeocodeOutcome::Unavailable(reason) = &outcome {
        log::warn!("⚠️  Geocoding failed for '{}': {}", location, reason);
    }
    outcome
}

pub async fn create_listing(
    state: &AppState,
    owner: ObjectId,
    payload: &ListingPayload,
) -> Result<Listing, AppError> {
    let draft = validate_listing(payload)?;

    let geometry = geometry_for(state, &draft.location)
        .await
        .located()
        .unwrap_or_else(Geometry::unlocated);

    let image = match &payload.upload {
        Some(upload) => state.images.store(upload).await?,
        None => {
            log::info!("No file uploaded, using placeholder image");
            Image::placeholder()
        }
    };

    let listing = Listing {
        id: None,
        title: draft.title,
        description: draft.description,
        image,
        price: draft.price,
        location: draft.location,
        country: draft.country,
        category: draft.category,
        geometry,
        owner: Some(owner),
        reviews: Vec::new(),
    };

    let created = state.listings.insert_listing(listing).await?;
    log::info!("✅ Listing created: {} ({:?})", created.title, created.id);
    Ok(created)
}

/// Geometry after an update: re-geocoded only when a location was sent.
fn next_geometry(current: &Listing, new_location: Option<&str>, outcome: Option<GeocodeOutcome>) -> Geometry {
    match (new_location, outcome) {
        (_, Some(GeocodeOutcome::Located(geometry))) => geometry,
        (Some(location), _) if location != current.location => Geometry::unlocated(),
        _ => current.geometry,
    }
}

fn apply_changes(listing: &mut Listing, changes: ListingChanges) {
    let ListingChanges {
        title,
        description,
        location,
        country,
        price,
        category,
    } = changes;

    if let Some(title) = title {
        listing.title = title;
    }
    if let Some(description) = description {
        listing.description = description;
    }
    if let Some(location) = location {
        listing.location = location;
    }
    if let Some(country) = country {
        listing.country = country;
    }
    if let Some(price) = price {
        listing.price = price;
    }
    if let Some(category) = category {
        listing.category = category;
    }
}

pub async fn update_listing(
    state: &AppState,
    requester: &ObjectId,
    raw_id: &str,
    payload: &ListingPayload,
) -> Result<Listing, AppError> {
    let mut listing = get_owned_listing(state, requester, raw_id).await?;
    let changes = validate_listing_changes(payload)?;

    let outcome = match &changes.location {
        Some(location) => Some(geometry_for(state, location).await),
        None => None,
    };
    let geometry = next_geometry(&listing, changes.location.as_deref(), outcome);

    apply_changes(&mut listing, changes);
    listing.geometry = geometry;

    let previous = match &payload.upload {
        Some(upload) => {
            let replacement = state.images.store(upload).await?;
            Some(std::mem::replace(&mut listing.image, replacement))
        }
        None => None,
    };

    let saved = match state.listings.save_listing(&listing).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(AppError::NotFound(LISTING_NOT_FOUND.to_string())),
        Err(e) => Err(e),
    };

    // Only one of the two images stays referenced
    if let Some(previous) = previous {
        match &saved {
            Ok(()) => state.images.remove(&previous).await,
            Err(_) => state.images.remove(&listing.image).await,
        };
    }
    saved?;

    log::info!("✏️  Listing updated: {} ({:?})", listing.title, listing.id);
    Ok(listing)
}

/// Listing plus the reduced-size image url used by the edit form.
pub async fn edit_listing(
    state: &AppState,
    requester: &ObjectId,
    raw_id: &str,
) -> Result<(Listing, String), AppError> {
    let listing = get_owned_listing(state, requester, raw_id).await?;
    let preview = image_service::preview_url(&listing.image.url);
    Ok((listing, preview))
}

/// Owner-only delete; the listing's reviews and stored image go with it.
pub async fn delete_listing(
    state: &AppState,
    requester: &ObjectId,
    raw_id: &str,
) -> Result<Listing, AppError> {
    let listing = get_owned_listing(state, requester, raw_id).await?;
    let id = listing
        .id
        .ok_or_else(|| AppError::NotFound(LISTING_NOT_FOUND.to_string()))?;

    let deleted = state
        .listings
        .delete_listing_with_reviews(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(LISTING_NOT_FOUND.to_string()))?;

    state.images.remove(&deleted.image).await;
    log::info!("🗑️  Listing deleted: {} ({})", deleted.title, id);
    Ok(deleted)
}
