use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::UserInfo;

/// Review document (collection `reviews`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default)]
    pub comment: String,
    pub rating: i32,
    /// Unix timestamp (seconds)
    pub created_at: i64,
    #[serde(default)]
    pub author: Option<ObjectId>,
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct ReviewInput {
    #[schema(value_type = Option<i32>)]
    pub rating: Option<serde_json::Value>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct ReviewPayload {
    pub review: Option<ReviewInput>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewDraft {
    pub rating: i32,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ReviewResponse {
    pub id: String,
    pub comment: String,
    pub rating: i32,
    pub created_at: i64,
    pub author: Option<UserInfo>,
}

impl ReviewResponse {
    pub fn new(review: Review, author: Option<UserInfo>) -> Self {
        ReviewResponse {
            id: review.id.map(|id| id.to_hex()).unwrap_or_default(),
            comment: review.comment,
            rating: review.rating,
            created_at: review.created_at,
            author,
        }
    }
}
