use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use super::{ListingFilter, ListingOrder};
use crate::models::{Geometry, Listing, Review, RevokedToken, User};
use crate::utils::AppError;

/// Storage for listings and the reviews they own.
#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn find_listings(
        &self,
        filter: &ListingFilter,
        order: ListingOrder,
    ) -> Result<Vec<Listing>, AppError>;

    async fn get_listing(&self, id: &ObjectId) -> Result<Option<Listing>, AppError>;

    /// Returns the listing with its assigned id.
    async fn insert_listing(&self, listing: Listing) -> Result<Listing, AppError>;

    async fn insert_listings(&self, listings: Vec<Listing>) -> Result<usize, AppError>;

    /// Replaces the stored document. `false` when the id is unknown.
    async fn save_listing(&self, listing: &Listing) -> Result<bool, AppError>;

    async fn set_geometry(&self, id: &ObjectId, geometry: Geometry) -> Result<bool, AppError>;

    /// Gives every listing without an owner to `owner`; returns how many changed.
    async fn assign_owner_to_orphans(&self, owner: &ObjectId) -> Result<u64, AppError>;

    async fn count_listings(&self) -> Result<u64, AppError>;

    /// Deletes the listing and every review it references.
    async fn delete_listing_with_reviews(&self, id: &ObjectId) -> Result<Option<Listing>, AppError>;

    /// Stores the review and appends it to the listing. `None` when the listing is gone.
    async fn add_review(
        &self,
        listing_id: &ObjectId,
        review: Review,
    ) -> Result<Option<Review>, AppError>;

    async fn get_review(&self, id: &ObjectId) -> Result<Option<Review>, AppError>;

    /// Reviews in the order of `ids`; unknown ids are skipped.
    async fn find_reviews(&self, ids: &[ObjectId]) -> Result<Vec<Review>, AppError>;

    /// Pulls the review from the listing and deletes it. `false`, with nothing
    /// touched, when the listing does not reference the review.
    async fn delete_review(&self, listing_id: &ObjectId, review_id: &ObjectId)
        -> Result<bool, AppError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn get_user(&self, id: &ObjectId) -> Result<Option<User>, AppError>;

    async fn find_users(&self, ids: &[ObjectId]) -> Result<Vec<User>, AppError>;

    /// Fails with `Conflict` when the username is taken.
    async fn insert_user(&self, user: User) -> Result<User, AppError>;

    async fn revoke_token(&self, token: RevokedToken) -> Result<(), AppError>;

    async fn is_token_revoked(&self, jti: &str) -> Result<bool, AppError>;
}

pub const DUPLICATE_USERNAME: &str = "A user with the given username is already registered";
