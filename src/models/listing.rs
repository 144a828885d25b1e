use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Deserializer, Serialize};

use super::{ReviewResponse, UserInfo};

pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1505693416388-ac5ce068fe85?q=80&w=1200&auto=format&fit=crop";
pub const PLACEHOLDER_IMAGE_FILENAME: &str = "placeholder";

/// Categories offered by the listing form.
pub const CATEGORIES: [&str; 10] = [
    "Trending",
    "Rooms",
    "Iconic Cities",
    "Mountains",
    "Castles",
    "Amazing Pools",
    "Camping",
    "Farms",
    "Arctic",
    "Boats",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub filename: String,
}

impl Image {
    pub fn placeholder() -> Self {
        Image {
            url: PLACEHOLDER_IMAGE_URL.to_string(),
            filename: PLACEHOLDER_IMAGE_FILENAME.to_string(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.filename == PLACEHOLDER_IMAGE_FILENAME
    }
}

impl Default for Image {
    fn default() -> Self {
        Image::placeholder()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum GeometryKind {
    Point,
}

/// GeoJSON point, `[longitude, latitude]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: GeometryKind,
    #[schema(value_type = Vec<f64>)]
    pub coordinates: [f64; 2],
}

impl Geometry {
    pub fn point(longitude: f64, latitude: f64) -> Self {
        Geometry {
            kind: GeometryKind::Point,
            coordinates: [longitude, latitude],
        }
    }

    /// The `[0, 0]` stand-in used when an address could not be resolved.
    pub fn unlocated() -> Self {
        Geometry::point(0.0, 0.0)
    }

    pub fn is_located(&self) -> bool {
        self.coordinates[0] != 0.0 && self.coordinates[1] != 0.0
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry::unlocated()
    }
}

// Older documents may carry `geometry: null`.
fn geometry_or_unlocated<'de, D>(deserializer: D) -> Result<Geometry, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Geometry>::deserialize(deserializer)?.unwrap_or_default())
}

/// Listing document (collection `listings`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Image,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, deserialize_with = "geometry_or_unlocated")]
    pub geometry: Geometry,
    /// Required at creation; legacy documents may lack it.
    #[serde(default)]
    pub owner: Option<ObjectId>,
    #[serde(default)]
    pub reviews: Vec<ObjectId>,
}

impl Listing {
    pub fn is_owned_by(&self, user_id: &ObjectId) -> bool {
        self.owner.as_ref() == Some(user_id)
    }
}

/// Uploaded image carried inside a JSON body.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct ImageUpload {
    pub filename: String,
    /// Base64 encoded file content.
    pub data: String,
}

/// Raw `listing` object as submitted; checked by `services::validation`.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct ListingInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub country: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub price: Option<serde_json::Value>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct ListingPayload {
    pub listing: Option<ListingInput>,
    pub upload: Option<ImageUpload>,
}

/// Validated fields for a new listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub location: String,
    pub country: String,
    pub price: f64,
    pub category: String,
}

/// Validated fields of a partial update; `None` leaves the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub country: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ListingResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image: Image,
    pub price: f64,
    pub location: String,
    pub country: String,
    pub category: String,
    pub geometry: Geometry,
    pub owner: Option<String>,
    pub reviews: Vec<String>,
}

impl From<Listing> for ListingResponse {
    fn from(l: Listing) -> Self {
        ListingResponse {
            id: l.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: l.title,
            description: l.description,
            image: l.image,
            price: l.price,
            location: l.location,
            country: l.country,
            category: l.category,
            geometry: l.geometry,
            owner: l.owner.map(|id| id.to_hex()),
            reviews: l.reviews.iter().map(|id| id.to_hex()).collect(),
        }
    }
}

/// Listing with its owner and reviews resolved.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ListingDetails {
    #[serde(flatten)]
    pub listing: ListingResponse,
    pub owner_info: Option<UserInfo>,
    pub review_details: Vec<ReviewResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{self, doc};

    #[test]
    fn null_geometry_reads_as_unlocated() {
        let raw = doc! {
            "_id": ObjectId::new(),
            "title": "Cozy Beachfront Cottage",
            "price": 1500,
            "geometry": null,
        };
        let listing: Listing = bson::from_document(raw).unwrap();
        assert_eq!(listing.geometry, Geometry::unlocated());
        assert!(listing.owner.is_none());
        assert_eq!(listing.image, Image::placeholder());
        assert_eq!(listing.price, 1500.0);
    }

    #[test]
    fn geometry_uses_geojson_shape() {
        let json = serde_json::to_value(Geometry::point(-118.24, 34.05)).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "Point", "coordinates": [-118.24, 34.05] }));
    }

    #[test]
    fn zero_coordinate_is_not_located() {
        assert!(!Geometry::unlocated().is_located());
        assert!(!Geometry::point(12.5, 0.0).is_located());
        assert!(Geometry::point(12.5, 41.9).is_located());
    }
}
