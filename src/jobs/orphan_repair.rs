use mongodb::bson::oid::ObjectId;

use crate::{
    database::{ListingFilter, ListingOrder, ListingRepository, UserRepository},
    utils::AppError,
};

/// Assigns every listing without an owner to `owner_id`. Returns how many changed.
pub async fn repair_orphans(
    listings: &dyn ListingRepository,
    users: &dyn UserRepository,
    owner_id: &str,
) -> Result<u64, AppError> {
    let owner = ObjectId::parse_str(owner_id.trim())
        .map_err(|_| AppError::InvalidRequest(format!("ORPHAN_OWNER_ID '{}' is not a valid id", owner_id)))?;

    let orphans = listings
        .find_listings(&ListingFilter::Orphaned, ListingOrder::Natural)
        .await?;
    if orphans.is_empty() {
        log::info!("👍 No orphaned listings found");
        return Ok(0);
    }

    log::info!("🔧 Found {} listings without owners", orphans.len());
    for listing in &orphans {
        log::debug!("   - {} ({:?})", listing.title, listing.id);
    }

    let user = users
        .get_user(&owner)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with ID {} not found", owner)))?;

    let updated = listings.assign_owner_to_orphans(&owner).await?;
    log::info!("✅ Assigned {} listings to {}", updated, user.username);
    Ok(updated)
}
