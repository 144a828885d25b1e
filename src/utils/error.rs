use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;

/// Message shown to clients for failures whose details stay in the logs.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong!";

#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    DatabaseError(String),
    NotFound(String),
    InvalidRequest(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    Internal(String),
}

impl AppError {
    /// Text returned in the `error` field of the JSON body.
    pub fn public_message(&self) -> &str {
        match self {
            AppError::DatabaseError(_) | AppError::Internal(_) => GENERIC_ERROR_MESSAGE,
            AppError::NotFound(msg)
            | AppError::InvalidRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::Conflict(msg) => msg,
        }
    }

    /// Where a browser client should go after seeing this error.
    fn redirect(&self) -> Option<&'static str> {
        match self {
            AppError::NotFound(_) => Some("/listings"),
            AppError::Unauthorized(_) => Some("/login"),
            _ => None,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<mongodb::error::Error> for AppError {
    fn from(e: mongodb::error::Error) -> Self {
        AppError::DatabaseError(e.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for AppError {
    fn from(e: mongodb::bson::ser::Error) -> Self {
        AppError::DatabaseError(format!("Failed to encode document: {}", e))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("❌ {}", self);
        } else {
            log::warn!("⚠️  {}", self);
        }

        let mut body = serde_json::json!({
            "success": false,
            "error": self.public_message(),
        });
        if let Some(location) = self.redirect() {
            body["redirect"] = serde_json::Value::from(location);
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn internal_details_are_not_exposed() {
        let err = AppError::DatabaseError("connection reset by peer".into());
        assert_eq!(err.public_message(), GENERIC_ERROR_MESSAGE);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn not_found_redirects_to_index() {
        let err = AppError::NotFound("Listing you requested for does not exist".into());
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["redirect"], "/listings");
        assert_eq!(json["error"], "Listing you requested for does not exist");
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let err = AppError::InvalidRequest("\"listing.title\" is required".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "\"listing.title\" is required");
    }
}
