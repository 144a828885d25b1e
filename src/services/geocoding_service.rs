use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::models::Geometry;

const MAPBOX_API_BASE: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";

/// Result of resolving an address. Callers decide what `Unavailable` means for them.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeOutcome {
    Located(Geometry),
    Unavailable(String),
}

impl GeocodeOutcome {
    pub fn located(self) -> Option<Geometry> {
        match self {
            GeocodeOutcome::Located(geometry) => Some(geometry),
            GeocodeOutcome::Unavailable(_) => None,
        }
    }
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Forward geocoding of a free-text address, best match only.
    async fn forward(&self, address: &str) -> GeocodeOutcome;
}

/// Used when no map token is configured.
pub struct DisabledGeocoder;

#[async_trait]
impl Geocoder for DisabledGeocoder {
    async fn forward(&self, _address: &str) -> GeocodeOutcome {
        GeocodeOutcome::Unavailable("geocoding is not configured".to_string())
    }
}

#[derive(Debug, Deserialize)]
struct MapboxResponse {
    #[serde(default)]
    features: Vec<MapboxFeature>,
}

#[derive(Debug, Deserialize)]
struct MapboxFeature {
    geometry: Geometry,
}

pub struct MapboxGeocoder {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl MapboxGeocoder {
    pub fn new(access_token: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("⚠️  Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self {
            client,
            access_token: access_token.into(),
            base_url: MAPBOX_API_BASE.to_string(),
        }
    }

    /// Points the client at another Mapbox-compatible endpoint.
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::new(access_token)
        }
    }

    fn forward_url(&self, address: &str) -> String {
        format!(
            "{}/{}.json?limit=1&access_token={}",
            self.base_url,
            urlencoding::encode(address),
            urlencoding::encode(&self.access_token)
        )
    }

    async fn request(&self, address: &str) -> Result<MapboxResponse, String> {
        let response = self
            .client
            .get(self.forward_url(address))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| format!("Failed to reach Mapbox: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Mapbox API error: {}", response.status()));
        }

        response
            .json::<MapboxResponse>()
            .await
            .map_err(|e| format!("Failed to parse Mapbox response: {}", e))
    }
}

fn first_match(body: MapboxResponse, address: &str) -> GeocodeOutcome {
    match body.features.into_iter().next() {
        Some(feature) => GeocodeOutcome::Located(feature.geometry),
        None => GeocodeOutcome::Unavailable(format!("no match for '{}'", address)),
    }
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn forward(&self, address: &str) -> GeocodeOutcome {
        let address = address.trim();
        if address.is_empty() {
            return GeocodeOutcome::Unavailable("empty address".to_string());
        }

        log::debug!("🗺️  Geocoding '{}'", address);

        match self.request(address).await {
            Ok(body) => first_match(body, address),
            Err(e) => GeocodeOutcome::Unavailable(e),
        }
    }
}

/// Mapbox when a token is present, otherwise a geocoder that always reports `Unavailable`.
pub fn from_token(map_token: Option<&str>, base_url: Option<&str>) -> Arc<dyn Geocoder> {
    match map_token.map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => match base_url {
            Some(url) => {
                log::info!("🗺️  Mapbox geocoding enabled ({})", url);
                Arc::new(MapboxGeocoder::with_base_url(token, url))
            }
            None => {
                log::info!("🗺️  Mapbox geocoding enabled");
                Arc::new(MapboxGeocoder::new(token))
            }
        },
        None => {
            log::warn!("⚠️  MAP_TOKEN not set - listings will be stored with [0, 0] coordinates");
            Arc::new(DisabledGeocoder)
        }
    }
}
