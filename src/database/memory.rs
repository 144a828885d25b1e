use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::{ListingFilter, ListingOrder, ListingRepository, UserRepository, DUPLICATE_USERNAME};
use crate::models::{Geometry, Listing, Review, RevokedToken, User};
use crate::utils::AppError;

#[derive(Default)]
struct MemoryState {
    /// Insertion order
    listings: Vec<Listing>,
    reviews: HashMap<ObjectId, Review>,
    users: Vec<User>,
    /// jti -> expiry (unix millis)
    revoked: HashMap<String, i64>,
}

/// Process-local store used with `STORAGE=memory` and by the tests.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    listing_queries: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `find_listings` calls served so far.
    #[cfg(test)]
    pub fn listing_queries(&self) -> usize {
        self.listing_queries.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    pub async fn review_count(&self) -> usize {
        self.state.read().await.reviews.len()
    }
}

#[async_trait]
impl ListingRepository for MemoryStore {
    async fn find_listings(
        &self,
        filter: &ListingFilter,
        order: ListingOrder,
    ) -> Result<Vec<Listing>, AppError> {
        self.listing_queries.fetch_add(1, Ordering::Relaxed);
        let compiled = filter.compile()?;

        let state = self.state.read().await;
        let mut listings: Vec<Listing> = state
            .listings
            .iter()
            .filter(|l| compiled.matches(l))
            .cloned()
            .collect();
        order.apply(&mut listings);
        Ok(listings)
    }

    async fn get_listing(&self, id: &ObjectId) -> Result<Option<Listing>, AppError> {
        let state = self.state.read().await;
        Ok(state.listings.iter().find(|l| l.id.as_ref() == Some(id)).cloned())
    }

    async fn insert_listing(&self, mut listing: Listing) -> Result<Listing, AppError> {
        listing.id = Some(listing.id.unwrap_or_else(ObjectId::new));
        self.state.write().await.listings.push(listing.clone());
        Ok(listing)
    }

    async fn insert_listings(&self, listings: Vec<Listing>) -> Result<usize, AppError> {
        let count = listings.len();
        for listing in listings {
            self.insert_listing(listing).await?;
        }
        Ok(count)
    }

    async fn save_listing(&self, listing: &Listing) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        match state.listings.iter_mut().find(|l| l.id.is_some() && l.id == listing.id) {
            Some(stored) => {
                *stored = listing.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_geometry(&self, id: &ObjectId, geometry: Geometry) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        match state.listings.iter_mut().find(|l| l.id.as_ref() == Some(id)) {
            Some(stored) => {
                stored.geometry = geometry;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn assign_owner_to_orphans(&self, owner: &ObjectId) -> Result<u64, AppError> {
        let mut state = self.state.write().await;
        let mut changed = 0;
        for listing in state.listings.iter_mut().filter(|l| l.owner.is_none()) {
            listing.owner = Some(*owner);
            changed += 1;
        }
        Ok(changed)
    }

    async fn count_listings(&self) -> Result<u64, AppError> {
        Ok(self.state.read().await.listings.len() as u64)
    }

    async fn delete_listing_with_reviews(&self, id: &ObjectId) -> Result<Option<Listing>, AppError> {
        let mut state = self.state.write().await;
        let Some(position) = state.listings.iter().position(|l| l.id.as_ref() == Some(id)) else {
            return Ok(None);
        };
        let listing = state.listings.remove(position);
        for review_id in &listing.reviews {
            state.reviews.remove(review_id);
        }
        Ok(Some(listing))
    }

    async fn add_review(
        &self,
        listing_id: &ObjectId,
        mut review: Review,
    ) -> Result<Option<Review>, AppError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let review_id = review.id.unwrap_or_else(ObjectId::new);
        review.id = Some(review_id);

        let Some(listing) = state.listings.iter_mut().find(|l| l.id.as_ref() == Some(listing_id))
        else {
            return Ok(None);
        };
        listing.reviews.push(review_id);
        state.reviews.insert(review_id, review.clone());
        Ok(Some(review))
    }

    async fn get_review(&self, id: &ObjectId) -> Result<Option<Review>, AppError> {
        Ok(self.state.read().await.reviews.get(id).cloned())
    }

    async fn find_reviews(&self, ids: &[ObjectId]) -> Result<Vec<Review>, AppError> {
        let state = self.state.read().await;
        Ok(ids.iter().filter_map(|id| state.reviews.get(id).cloned()).collect())
    }

    async fn delete_review(
        &self,
        listing_id: &ObjectId,
        review_id: &ObjectId,
    ) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let Some(listing) = state
            .listings
            .iter_mut()
            .find(|l| l.id.as_ref() == Some(listing_id) && l.reviews.contains(review_id))
        else {
            return Ok(false);
        };
        listing.reviews.retain(|id| id != review_id);
        Ok(state.reviews.remove(review_id).is_some())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn get_user(&self, id: &ObjectId) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id.as_ref() == Some(id)).cloned())
    }

    async fn find_users(&self, ids: &[ObjectId]) -> Result<Vec<User>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .filter(|u| u.id.map(|id| ids.contains(&id)).unwrap_or(false))
            .cloned()
            .collect())
    }

    async fn insert_user(&self, mut user: User) -> Result<User, AppError> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(AppError::Conflict(DUPLICATE_USERNAME.to_string()));
        }
        user.id = Some(user.id.unwrap_or_else(ObjectId::new));
        state.users.push(user.clone());
        Ok(user)
    }

    async fn revoke_token(&self, token: RevokedToken) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        let now = chrono::Utc::now().timestamp_millis();
        state.revoked.retain(|_, expires_at| *expires_at > now);
        state.revoked.insert(token.jti, token.expires_at.timestamp_millis());
        Ok(())
    }

    async fn is_token_revoked(&self, jti: &str) -> Result<bool, AppError> {
        let state = self.state.read().await;
        Ok(state.revoked.contains_key(jti))
    }
}
