use chrono::Utc;

use crate::database::{ListingRepository, UserRepository};
use crate::models::{Geometry, Image, Listing, User};
use crate::services::Geocoder;
use crate::utils::AppError;

pub const SEED_USERNAME: &str = "wanderlust";

struct SampleListing {
    title: &'static str,
    description: &'static str,
    image_url: &'static str,
    price: f64,
    location: &'static str,
    country: &'static str,
    category: &'static str,
}

const SAMPLE_LISTINGS: [SampleListing; 10] = [
    SampleListing {
        title: "Cozy Beachfront Cottage",
        description: "Escape to this charming beachfront cottage for a relaxing getaway. Enjoy stunning ocean views and easy access to the beach.",
        image_url: "https://images.unsplash.com/photo-1552733407-5d5c46c3bb3b?auto=format&fit=crop&w=800&q=60",
        price: 1500.0,
        location: "Malibu",
        country: "United States",
        category: "Amazing Pools",
    },
    SampleListing {
        title: "Modern Loft in Downtown",
        description: "Stay in the heart of the city in this stylish loft apartment. Perfect for urban explorers!",
        image_url: "https://images.unsplash.com/photo-1501785888041-af3ef285b470?auto=format&fit=crop&w=800&q=60",
        price: 1200.0,
        location: "New York City",
        country: "United States",
        category: "Iconic Cities",
    },
    SampleListing {
        title: "Mountain Retreat",
        description: "Unplug and unwind in this peaceful mountain cabin. Surrounded by nature, it's a perfect place to recharge.",
        image_url: "https://images.unsplash.com/photo-1571896349842-33c89424de2d?auto=format&fit=crop&w=800&q=60",
        price: 1000.0,
        location: "Aspen",
        country: "United States",
        category: "Mountains",
    },
    SampleListing {
        title: "Historic Villa in Tuscany",
        description: "Experience the charm of Tuscany in this beautifully restored villa. Explore the rolling hills and vineyards.",
        image_url: "https://images.unsplash.com/photo-1566073771259-6a8506099945?auto=format&fit=crop&w=800&q=60",
        price: 2500.0,
        location: "Florence",
        country: "Italy",
        category: "Castles",
    },
    SampleListing {
        title: "Secluded Treehouse Getaway",
        description: "Live among the treetops in this unique treehouse retreat. A true nature lover's paradise.",
        image_url: "https://images.unsplash.com/photo-1488462237308-ecaa28b729d7?auto=format&fit=crop&w=800&q=60",
        price: 800.0,
        location: "Monteverde",
        country: "Costa Rica",
        category: "Camping",
    },
    SampleListing {
        title: "Beachfront Paradise",
        description: "Step out of your door onto the sandy beach. This beachfront condo offers the ultimate relaxation.",
        image_url: "https://images.unsplash.com/photo-1571003123894-1f0594d2b5d9?auto=format&fit=crop&w=800&q=60",
        price: 2000.0,
        location: "Cancun",
        country: "Mexico",
        category: "Amazing Pools",
    },
    SampleListing {
        title: "Rustic Cabin by the Lake",
        description: "Spend your days fishing and kayaking on the serene lake. This cozy cabin is perfect for outdoor enthusiasts.",
        image_url: "https://images.unsplash.com/photo-1470770841072-f978cf4d019e?auto=format&fit=crop&w=800&q=60",
        price: 900.0,
        location: "Lake Tahoe",
        country: "United States",
        category: "Farms",
    },
    SampleListing {
        title: "Ski-In/Ski-Out Chalet",
        description: "Hit the slopes right from your doorstep in this ski-in/ski-out chalet in the Swiss Alps.",
        image_url: "https://images.unsplash.com/photo-1502784444187-359ac186c5bb?auto=format&fit=crop&w=800&q=60",
        price: 3000.0,
        location: "Verbier",
        country: "Switzerland",
        category: "Arctic",
    },
    SampleListing {
        title: "Canal-side Houseboat",
        description: "Wake up on the water in this converted houseboat moored along a quiet canal.",
        image_url: "https://images.unsplash.com/photo-1534351590666-13e3e96b5017?auto=format&fit=crop&w=800&q=60",
        price: 1100.0,
        location: "Amsterdam",
        country: "Netherlands",
        category: "Boats",
    },
    SampleListing {
        title: "Private Room in Shibuya",
        description: "A compact, quiet room a few minutes from Shibuya crossing. Ideal for solo travellers.",
        image_url: "https://images.unsplash.com/photo-1540959733332-eab4deabeeaf?auto=format&fit=crop&w=800&q=60",
        price: 600.0,
        location: "Tokyo",
        country: "Japan",
        category: "Rooms",
    },
];

async fn seed_owner(users: &dyn UserRepository) -> Result<User, AppError> {
    if let Some(user) = users.find_user_by_username(SEED_USERNAME).await? {
        return Ok(user);
    }

    users
        .insert_user(User {
            id: None,
            username: SEED_USERNAME.to_string(),
            email: "hosts@wanderlust.example".to_string(),
            // Not a bcrypt hash, so nobody can log in as the seed owner
            password_hash: "!".to_string(),
            created_at: Utc::now().timestamp(),
        })
        .await
}

/// Inserts the sample listings when the collection is empty. Returns how many were added.
pub async fn seed_sample_listings(
    listings: &dyn ListingRepository,
    users: &dyn UserRepository,
    geocoder: &dyn Geocoder,
) -> Result<usize, AppError> {
    let existing = listings.count_listings().await?;
    if existing > 0 {
        log::info!("📋 Listings: {} already in DB - skipping seed", existing);
        return Ok(0);
    }

    let owner = seed_owner(users).await?.id;
    log::info!("🌱 Seeding {} sample listings...", SAMPLE_LISTINGS.len());

    let mut documents = Vec::with_capacity(SAMPLE_LISTINGS.len());
    for sample in &SAMPLE_LISTINGS {
        let address = format!("{}, {}", sample.location, sample.country);
        let geometry = geocoder
            .forward(&address)
            .await
            .located()
            .unwrap_or_else(|| {
                log::warn!("   ⚠️  Geocoding failed for {}", address);
                Geometry::unlocated()
            });

        documents.push(Listing {
            id: None,
            title: sample.title.to_string(),
            description: sample.description.to_string(),
            image: Image {
                url: sample.image_url.to_string(),
                filename: "listingimage".to_string(),
            },
            price: sample.price,
            location: sample.location.to_string(),
            country: sample.country.to_string(),
            category: sample.category.to_string(),
            geometry,
            owner,
            reviews: Vec::new(),
        });
    }

    let inserted = listings.insert_listings(documents).await?;
    log::info!("   ✅ Inserted {} sample listings", inserted);
    Ok(inserted)
}
