use std::sync::Arc;

use crate::database::{ListingRepository, UserRepository};
use crate::services::auth_service::AuthSettings;
use crate::services::geocoding_service::Geocoder;
use crate::services::image_service::ImageStore;

/// Collaborators shared by every handler, built once in `main`.
#[derive(Clone)]
pub struct AppState {
    pub listings: Arc<dyn ListingRepository>,
    pub users: Arc<dyn UserRepository>,
    pub geocoder: Arc<dyn Geocoder>,
    pub images: Arc<dyn ImageStore>,
    pub auth: Arc<AuthSettings>,
}
