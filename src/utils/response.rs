use actix_web::{http::header, HttpResponse};

/// Flash-style failure: the client is sent back to `location` with the message.
pub fn redirect_with_error(location: &str, message: impl Into<String>) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .json(serde_json::json!({
            "success": false,
            "error": message.into(),
            "redirect": location,
        }))
}

pub fn redirect_to(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}
