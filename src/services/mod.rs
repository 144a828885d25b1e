pub mod auth_service;
pub mod geocoding_service;
pub mod image_service;
pub mod listing_service;
pub mod review_service;
pub mod search_service;
pub mod validation;

pub use geocoding_service::{GeocodeOutcome, Geocoder};
pub use image_service::LocalImageStore;
