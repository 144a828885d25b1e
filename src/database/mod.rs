mod filter;
pub mod memory;
mod repository;

pub use filter::*;
pub use memory::MemoryStore;
pub use repository::*;

use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use std::error::Error;
use std::time::Duration;

use crate::models::{Geometry, Listing, Review, RevokedToken, User};
use crate::utils::AppError;

const DEFAULT_DATABASE: &str = "wanderlust";
const LISTINGS: &str = "listings";
const REVIEWS: &str = "reviews";
const USERS: &str = "users";
const REVOKED_TOKENS: &str = "revoked_tokens";

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Connection pool
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(Duration::from_secs(300));

        client_options.connect_timeout = Some(Duration::from_secs(5));
        client_options.server_selection_timeout = Some(Duration::from_secs(5));

        let db_name = client_options
            .default_database
            .clone()
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let client = Client::with_options(client_options)?;
        let db = client.database(&db_name);

        let mongodb = Self { db };

        // Test connection
        mongodb.health_check().await?;
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the indexes queries rely on
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        log::info!("🔧 Creating database indexes...");

        let listings = self.collection::<Document>(LISTINGS);
        for keys in [doc! { "owner": 1 }, doc! { "category": 1 }, doc! { "price": 1 }] {
            let label = keys.keys().cloned().collect::<Vec<_>>().join(", ");
            match listings.create_index(IndexModel::builder().keys(keys).build()).await {
                Ok(_) => log::info!("   ✅ Index created: listings({})", label),
                Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
            }
        }

        // Usernames are unique (mirrors the signup check)
        let users_index = IndexModel::builder()
            .keys(doc! { "username": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        match self.collection::<Document>(USERS).create_index(users_index).await {
            Ok(_) => log::info!("   ✅ Index created: users(username) unique"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        // Revoked tokens expire with the token itself
        let ttl_index = IndexModel::builder()
            .keys(doc! { "expires_at": 1 })
            .options(IndexOptions::builder().expire_after(Duration::from_secs(0)).build())
            .build();
        match self.collection::<Document>(REVOKED_TOKENS).create_index(ttl_index).await {
            Ok(_) => log::info!("   ✅ Index created: revoked_tokens(expires_at) TTL"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    fn listings(&self) -> Collection<Listing> {
        self.collection(LISTINGS)
    }

    fn reviews(&self) -> Collection<Review> {
        self.collection(REVIEWS)
    }

    fn users(&self) -> Collection<User> {
        self.collection(USERS)
    }
}

const DUPLICATE_KEY: i32 = 11000;

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY
    )
}

#[async_trait]
impl ListingRepository for MongoDB {
    async fn find_listings(
        &self,
        filter: &ListingFilter,
        order: ListingOrder,
    ) -> Result<Vec<Listing>, AppError> {
        let collection = self.listings();
        let mut find = collection.find(filter.to_document());
        if let Some(sort) = order.sort_document() {
            find = find.sort(sort);
        }
        let listings: Vec<Listing> = find.await?.try_collect().await?;
        Ok(listings)
    }

    async fn get_listing(&self, id: &ObjectId) -> Result<Option<Listing>, AppError> {
        Ok(self.listings().find_one(doc! { "_id": id }).await?)
    }

    async fn insert_listing(&self, mut listing: Listing) -> Result<Listing, AppError> {
        let result = self.listings().insert_one(&listing).await?;
        listing.id = result.inserted_id.as_object_id();
        Ok(listing)
    }

    async fn insert_listings(&self, listings: Vec<Listing>) -> Result<usize, AppError> {
        if listings.is_empty() {
            return Ok(0);
        }
        let result = self.listings().insert_many(&listings).await?;
        Ok(result.inserted_ids.len())
    }

    async fn save_listing(&self, listing: &Listing) -> Result<bool, AppError> {
        let id = listing
            .id
            .ok_or_else(|| AppError::Internal("Cannot save a listing without an id".into()))?;
        let result = self.listings().replace_one(doc! { "_id": id }, listing).await?;
        Ok(result.matched_count > 0)
    }

    async fn set_geometry(&self, id: &ObjectId, geometry: Geometry) -> Result<bool, AppError> {
        let result = self
            .listings()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "geometry": bson::to_bson(&geometry)? } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn assign_owner_to_orphans(&self, owner: &ObjectId) -> Result<u64, AppError> {
        let result = self
            .listings()
            .update_many(ListingFilter::Orphaned.to_document(), doc! { "$set": { "owner": owner } })
            .await?;
        Ok(result.modified_count)
    }

    async fn count_listings(&self) -> Result<u64, AppError> {
        Ok(self.listings().count_documents(doc! {}).await?)
    }

    async fn delete_listing_with_reviews(&self, id: &ObjectId) -> Result<Option<Listing>, AppError> {
        let deleted = self.listings().find_one_and_delete(doc! { "_id": id }).await?;

        if let Some(listing) = &deleted {
            if !listing.reviews.is_empty() {
                let result = self.reviews().delete_many(ids_filter(&listing.reviews)).await?;
                log::info!("🗑️  Deleted {} reviews of listing {}", result.deleted_count, id);
            }
        }

        Ok(deleted)
    }

    async fn add_review(
        &self,
        listing_id: &ObjectId,
        mut review: Review,
    ) -> Result<Option<Review>, AppError> {
        let result = self.reviews().insert_one(&review).await?;
        let review_id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| AppError::Internal("Review inserted without an ObjectId".into()))?;
        review.id = Some(review_id);

        let pushed = self
            .listings()
            .update_one(doc! { "_id": listing_id }, doc! { "$push": { "reviews": review_id } })
            .await?;

        if pushed.matched_count == 0 {
            // Listing disappeared between the check and the push
            self.reviews().delete_one(doc! { "_id": review_id }).await?;
            return Ok(None);
        }

        Ok(Some(review))
    }

    async fn get_review(&self, id: &ObjectId) -> Result<Option<Review>, AppError> {
        Ok(self.reviews().find_one(doc! { "_id": id }).await?)
    }

    async fn find_reviews(&self, ids: &[ObjectId]) -> Result<Vec<Review>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found: Vec<Review> = self.reviews().find(ids_filter(ids)).await?.try_collect().await?;
        Ok(ids
            .iter()
            .filter_map(|id| found.iter().find(|r| r.id.as_ref() == Some(id)).cloned())
            .collect())
    }

    async fn delete_review(
        &self,
        listing_id: &ObjectId,
        review_id: &ObjectId,
    ) -> Result<bool, AppError> {
        let pulled = self
            .listings()
            .update_one(
                doc! { "_id": listing_id, "reviews": review_id },
                doc! { "$pull": { "reviews": review_id } },
            )
            .await?;

        // Review belongs to another listing (or none)
        if pulled.matched_count == 0 {
            return Ok(false);
        }

        let result = self.reviews().delete_one(doc! { "_id": review_id }).await?;
        Ok(result.deleted_count > 0)
    }
}

#[async_trait]
impl UserRepository for MongoDB {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.users().find_one(doc! { "username": username }).await?)
    }

    async fn get_user(&self, id: &ObjectId) -> Result<Option<User>, AppError> {
        Ok(self.users().find_one(doc! { "_id": id }).await?)
    }

    async fn find_users(&self, ids: &[ObjectId]) -> Result<Vec<User>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.users().find(ids_filter(ids)).await?.try_collect().await?)
    }

    async fn insert_user(&self, mut user: User) -> Result<User, AppError> {
        if self.find_user_by_username(&user.username).await?.is_some() {
            return Err(AppError::Conflict(DUPLICATE_USERNAME.to_string()));
        }
        // The unique index settles concurrent signups
        let result = self.users().insert_one(&user).await.map_err(|e| {
            if is_duplicate_key(&e) {
                AppError::Conflict(DUPLICATE_USERNAME.to_string())
            } else {
                AppError::from(e)
            }
        })?;
        user.id = result.inserted_id.as_object_id();
        Ok(user)
    }

    async fn revoke_token(&self, token: RevokedToken) -> Result<(), AppError> {
        self.collection::<RevokedToken>(REVOKED_TOKENS)
            .insert_one(&token)
            .await?;
        Ok(())
    }

    async fn is_token_revoked(&self, jti: &str) -> Result<bool, AppError> {
        let count = self
            .collection::<RevokedToken>(REVOKED_TOKENS)
            .count_documents(doc! { "jti": jti })
            .await?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Image;

    async fn connect() -> MongoDB {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://127.0.0.1:27017/wanderlust_test".to_string());
        MongoDB::new(&uri).await.unwrap()
    }

    fn listing(title: &str) -> Listing {
        Listing {
            id: None,
            title: title.into(),
            description: "Test listing".into(),
            image: Image::placeholder(),
            price: 100.0,
            location: "Malibu".into(),
            country: "United States".into(),
            category: "Trending".into(),
            geometry: Geometry::unlocated(),
            owner: Some(ObjectId::new()),
            reviews: vec![],
        }
    }

    fn review(rating: i32) -> Review {
        Review {
            id: None,
            comment: "Great stay".into(),
            rating,
            created_at: 0,
            author: Some(ObjectId::new()),
        }
    }

    fn user(username: &str) -> User {
        User {
            id: None,
            username: username.into(),
            email: format!("{}@example.com", username),
            password_hash: "x".into(),
            created_at: 0,
        }
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_mongodb_connection() {
        let db = connect().await;
        assert!(db.health_check().await.is_ok());
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_delete_listing_with_reviews() {
        let db = connect().await;
        let id = db.insert_listing(listing("Cascade")).await.unwrap().id.unwrap();
        let first = db.add_review(&id, review(5)).await.unwrap().unwrap();
        let second = db.add_review(&id, review(2)).await.unwrap().unwrap();

        let deleted = db.delete_listing_with_reviews(&id).await.unwrap().unwrap();
        assert_eq!(deleted.reviews, vec![first.id.unwrap(), second.id.unwrap()]);
        assert!(db.get_listing(&id).await.unwrap().is_none());
        assert!(db.get_review(&first.id.unwrap()).await.unwrap().is_none());
        assert!(db.get_review(&second.id.unwrap()).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_delete_review() {
        let db = connect().await;
        let parent = db.insert_listing(listing("Parent")).await.unwrap().id.unwrap();
        let other = db.insert_listing(listing("Other")).await.unwrap().id.unwrap();
        let added = db.add_review(&parent, review(4)).await.unwrap().unwrap();
        let review_id = added.id.unwrap();

        // Wrong parent: nothing changes
        assert!(!db.delete_review(&other, &review_id).await.unwrap());
        assert!(db.get_review(&review_id).await.unwrap().is_some());

        assert!(db.delete_review(&parent, &review_id).await.unwrap());
        assert!(db.get_review(&review_id).await.unwrap().is_none());
        let reloaded = db.get_listing(&parent).await.unwrap().unwrap();
        assert!(reloaded.reviews.is_empty());

        db.delete_listing_with_reviews(&parent).await.unwrap();
        db.delete_listing_with_reviews(&other).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_find_listings_sorted() {
        let db = connect().await;
        let marker = uuid::Uuid::new_v4().simple().to_string();
        let mut ids = Vec::new();
        for price in [300.0, 100.0, 200.0] {
            let mut item = listing(&format!("{} {}", marker, price));
            item.price = price;
            ids.push(db.insert_listing(item).await.unwrap().id.unwrap());
        }

        let filter = ListingFilter::Contains(ListingField::Title, marker.clone());
        let by_price = db.find_listings(&filter, ListingOrder::PriceAscending).await.unwrap();
        let prices: Vec<f64> = by_price.iter().map(|l| l.price).collect();
        assert_eq!(prices, vec![100.0, 200.0, 300.0]);

        for id in ids {
            db.delete_listing_with_reviews(&id).await.unwrap();
        }
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_duplicate_username_conflicts() {
        let db = connect().await;
        let username = format!("user-{}", uuid::Uuid::new_v4().simple());
        db.insert_user(user(&username)).await.unwrap();

        // Raw insert skips the lookup and hits the unique index
        let err = db.users().insert_one(user(&username)).await.unwrap_err();
        assert!(is_duplicate_key(&err));

        let err = db.insert_user(user(&username)).await.unwrap_err();
        assert_eq!(err, AppError::Conflict(DUPLICATE_USERNAME.to_string()));
    }
}
