//! Fixtures shared by unit and handler tests.

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::database::MemoryStore;
use crate::models::{Geometry, ListingPayload};
use crate::services::auth_service::{self, AuthSettings, SignupRequest};
use crate::services::{GeocodeOutcome, Geocoder, LocalImageStore};
use crate::state::AppState;

/// Geocoder returning a fixed, swappable outcome.
pub struct StubGeocoder {
    outcome: Mutex<GeocodeOutcome>,
    calls: AtomicUsize,
}

impl StubGeocoder {
    pub fn located(geometry: Geometry) -> Self {
        Self {
            outcome: Mutex::new(GeocodeOutcome::Located(geometry)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            outcome: Mutex::new(GeocodeOutcome::Unavailable("stub".to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, outcome: GeocodeOutcome) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn forward(&self, _address: &str) -> GeocodeOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.lock().unwrap().clone()
    }
}

pub fn auth_settings() -> AuthSettings {
    AuthSettings {
        bcrypt_cost: 4,
        ..AuthSettings::new("test-secret", "wanderlust-service", "wanderlust-web")
    }
}

/// In-memory state with uploads going to a fresh temp directory.
pub fn test_state(geocoder: StubGeocoder) -> (AppState, Arc<StubGeocoder>) {
    let store = Arc::new(MemoryStore::new());
    let geocoder = Arc::new(geocoder);
    let upload_dir = std::env::temp_dir().join(format!("wanderlust-test-{}", uuid::Uuid::new_v4()));

    let state = AppState {
        listings: store.clone(),
        users: store,
        geocoder: geocoder.clone(),
        images: Arc::new(LocalImageStore::new(upload_dir)),
        auth: Arc::new(auth_settings()),
    };
    (state, geocoder)
}

pub fn sample_payload(title: &str) -> ListingPayload {
    serde_json::from_value(serde_json::json!({
        "listing": {
            "title": title,
            "description": "Escape to this charming place for a relaxing getaway.",
            "location": "Malibu",
            "country": "United States",
            "price": 1500,
            "category": "Amazing Pools",
        }
    }))
    .unwrap()
}

/// Registers `username` and returns its id with a bearer token.
pub async fn signed_up(state: &AppState, username: &str) -> (ObjectId, String) {
    let response = auth_service::signup(
        &state.auth,
        state.users.as_ref(),
        &SignupRequest {
            username: Some(username.to_string()),
            email: Some(format!("{}@example.com", username)),
            password: Some("password".to_string()),
        },
    )
    .await
    .unwrap();

    (ObjectId::parse_str(&response.user.id).unwrap(), response.token)
}
