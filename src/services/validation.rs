//! Request body checks for listing and review payloads.
//!
//! Every violated rule is reported; messages are joined with `,` into a
//! single `AppError::InvalidRequest`.

use serde_json::Value;

use crate::models::{
    ListingChanges, ListingDraft, ListingInput, ListingPayload, ReviewDraft, ReviewPayload,
};
use crate::utils::AppError;

const MIN_RATING: i64 = 1;
const MAX_RATING: i64 = 5;

#[derive(Default)]
struct Violations(Vec<String>);

impl Violations {
    fn push(&mut self, message: String) {
        self.0.push(message);
    }

    /// Trimmed text; `required` decides whether absence is a violation.
    fn text(&mut self, path: &str, value: Option<&String>, required: bool) -> Option<String> {
        match value.map(|v| v.trim()) {
            None if required => {
                self.push(format!("\"{}\" is required", path));
                None
            }
            None => None,
            Some("") => {
                self.push(format!("\"{}\" is not allowed to be empty", path));
                None
            }
            Some(text) => Some(text.to_string()),
        }
    }

    /// Numbers and numeric strings are accepted.
    fn number(&mut self, path: &str, value: Option<&Value>, required: bool) -> Option<f64> {
        let parsed = match value {
            None | Some(Value::Null) => {
                if required {
                    self.push(format!("\"{}\" is required", path));
                }
                return None;
            }
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Some(_) => None,
        };

        if parsed.is_none() {
            self.push(format!("\"{}\" must be a number", path));
        }
        parsed
    }

    fn at_least(&mut self, path: &str, value: Option<f64>, min: f64) -> Option<f64> {
        match value {
            Some(n) if n < min => {
                self.push(format!("\"{}\" must be greater than or equal to {}", path, min));
                None
            }
            other => other,
        }
    }

    fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, AppError> {
        if self.0.is_empty() {
            Ok(value())
        } else {
            Err(AppError::InvalidRequest(self.0.join(",")))
        }
    }
}

fn listing_input(payload: &ListingPayload) -> Result<&ListingInput, AppError> {
    payload
        .listing
        .as_ref()
        .ok_or_else(|| AppError::InvalidRequest("\"listing\" is required".to_string()))
}

/// Full check used when creating a listing.
pub fn validate_listing(payload: &ListingPayload) -> Result<ListingDraft, AppError> {
    let input = listing_input(payload)?;
    let mut v = Violations::default();

    let title = v.text("listing.title", input.title.as_ref(), true);
    let description = v.text("listing.description", input.description.as_ref(), true);
    let location = v.text("listing.location", input.location.as_ref(), true);
    let country = v.text("listing.country", input.country.as_ref(), true);
    let price = v.number("listing.price", input.price.as_ref(), true);
    let price = v.at_least("listing.price", price, 0.0);
    let category = v.text("listing.category", input.category.as_ref(), true);

    v.finish(|| ListingDraft {
        title: title.unwrap_or_default(),
        description: description.unwrap_or_default(),
        location: location.unwrap_or_default(),
        country: country.unwrap_or_default(),
        price: price.unwrap_or_default(),
        category: category.unwrap_or_default(),
    })
}

/// Partial check used by updates: absent fields are fine, present ones follow the create rules.
pub fn validate_listing_changes(payload: &ListingPayload) -> Result<ListingChanges, AppError> {
    let input = listing_input(payload)?;
    let mut v = Violations::default();

    let title = v.text("listing.title", input.title.as_ref(), false);
    let description = v.text("listing.description", input.description.as_ref(), false);
    let location = v.text("listing.location", input.location.as_ref(), false);
    let country = v.text("listing.country", input.country.as_ref(), false);
    let price = v.number("listing.price", input.price.as_ref(), false);
    let price = v.at_least("listing.price", price, 0.0);
    let category = v.text("listing.category", input.category.as_ref(), false);

    v.finish(|| ListingChanges {
        title,
        description,
        location,
        country,
        price,
        category,
    })
}

pub fn validate_review(payload: &ReviewPayload) -> Result<ReviewDraft, AppError> {
    let input = payload
        .review
        .as_ref()
        .ok_or_else(|| AppError::InvalidRequest("\"review\" is required".to_string()))?;
    let mut v = Violations::default();

    let rating = match v.number("review.rating", input.rating.as_ref(), true) {
        Some(n) if n.fract() != 0.0 => {
            v.push("\"review.rating\" must be an integer".to_string());
            None
        }
        Some(n) if (n as i64) < MIN_RATING => {
            v.push(format!("\"review.rating\" must be greater than or equal to {}", MIN_RATING));
            None
        }
        Some(n) if (n as i64) > MAX_RATING => {
            v.push(format!("\"review.rating\" must be less than or equal to {}", MAX_RATING));
            None
        }
        Some(n) => Some(n as i32),
        None => None,
    };
    let comment = v.text("review.comment", input.comment.as_ref(), true);

    v.finish(|| ReviewDraft {
        rating: rating.unwrap_or_default(),
        comment: comment.unwrap_or_default(),
    })
}
