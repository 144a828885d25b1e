//! Free-text search and category filtering over listings.
//!
//! Search walks title, category, country and location in that order and
//! stops at the first field with hits. A query that still has no match
//! and starts with a positive integer is read as a price ceiling.

use std::fmt;

use crate::database::{ListingField, ListingFilter, ListingOrder, ListingRepository};
use crate::models::Listing;
use crate::utils::AppError;

const TEXT_CASCADE: [(ListingField, ListingOrder); 4] = [
    (ListingField::Title, ListingOrder::Natural),
    (ListingField::Category, ListingOrder::NewestFirst),
    (ListingField::Country, ListingOrder::NewestFirst),
    (ListingField::Location, ListingOrder::NewestFirst),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedBy {
    Title,
    Category,
    Country,
    Location,
    PriceAtMost(i64),
}

impl MatchedBy {
    pub fn message(&self) -> String {
        match self {
            MatchedBy::Title => "Listings searched by Title!".to_string(),
            MatchedBy::Category => "Listings searched by Category!".to_string(),
            MatchedBy::Country => "Listings searched by Country!".to_string(),
            MatchedBy::Location => "Listings searched by Location!".to_string(),
            MatchedBy::PriceAtMost(ceiling) => {
                format!("Listings searched by price less than Rs {}!", ceiling)
            }
        }
    }
}

impl From<ListingField> for MatchedBy {
    fn from(field: ListingField) -> Self {
        match field {
            ListingField::Title => MatchedBy::Title,
            ListingField::Category => MatchedBy::Category,
            ListingField::Country => MatchedBy::Country,
            ListingField::Location => MatchedBy::Location,
        }
    }
}

#[derive(Debug)]
pub struct SearchOutcome {
    pub matched_by: MatchedBy,
    pub listings: Vec<Listing>,
}

#[derive(Debug, PartialEq)]
pub enum SearchError {
    EmptyQuery,
    NoResults,
    Store(AppError),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::EmptyQuery => write!(f, "Please enter search query!"),
            SearchError::NoResults => write!(f, "No listings found based on your search!"),
            SearchError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl From<AppError> for SearchError {
    fn from(e: AppError) -> Self {
        SearchError::Store(e)
    }
}

/// Leading-integer read of the query: `"250"` and `"250 rupees"` give 250,
/// `"0"`, `"-5"` and `"cheap"` give nothing. Huge values saturate.
pub fn parse_price_ceiling(query: &str) -> Option<i64> {
    let trimmed = query.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits: &str = &rest[..rest.bytes().take_while(u8::is_ascii_digit).count()];
    if digits.is_empty() || negative {
        return None;
    }

    let value = digits.parse::<i64>().unwrap_or(i64::MAX);
    (value > 0).then_some(value)
}

pub async fn search_listings(
    listings: &dyn ListingRepository,
    raw_query: &str,
) -> Result<SearchOutcome, SearchError> {
    let query = raw_query.trim();
    if query.is_empty() {
        return Err(SearchError::EmptyQuery);
    }

    for (field, order) in TEXT_CASCADE {
        let found = listings
            .find_listings(&ListingFilter::Contains(field, query.to_string()), order)
            .await?;
        if !found.is_empty() {
            log::debug!("🔎 '{}' matched {} listings by {}", query, found.len(), field.key());
            return Ok(SearchOutcome {
                matched_by: field.into(),
                listings: found,
            });
        }
    }

    if let Some(ceiling) = parse_price_ceiling(query) {
        let found = listings
            .find_listings(&ListingFilter::PriceAtMost(ceiling), ListingOrder::PriceAscending)
            .await?;
        if !found.is_empty() {
            return Ok(SearchOutcome {
                matched_by: MatchedBy::PriceAtMost(ceiling),
                listings: found,
            });
        }
    }

    Err(SearchError::NoResults)
}

/// Listings for a category slug such as `iconic-cities`.
pub async fn filter_by_category(
    listings: &dyn ListingRepository,
    slug: &str,
) -> Result<Vec<Listing>, AppError> {
    listings
        .find_listings(&ListingFilter::CategorySlug(slug.to_string()), ListingOrder::Natural)
        .await
}
