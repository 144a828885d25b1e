use mongodb::bson::{doc, oid::ObjectId, Document};
use regex::{Regex, RegexBuilder};

use crate::models::Listing;
use crate::utils::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingField {
    Title,
    Category,
    Country,
    Location,
}

impl ListingField {
    pub fn key(&self) -> &'static str {
        match self {
            ListingField::Title => "title",
            ListingField::Category => "category",
            ListingField::Country => "country",
            ListingField::Location => "location",
        }
    }

    fn value<'a>(&self, listing: &'a Listing) -> &'a str {
        match self {
            ListingField::Title => &listing.title,
            ListingField::Category => &listing.category,
            ListingField::Country => &listing.country,
            ListingField::Location => &listing.location,
        }
    }
}

/// Selection over the `listings` collection.
#[derive(Debug, Clone, PartialEq)]
pub enum ListingFilter {
    All,
    /// Case-insensitive literal substring match on one field.
    Contains(ListingField, String),
    /// Category slug: exact, hyphens read as spaces, or case-insensitive substring.
    CategorySlug(String),
    PriceAtMost(i64),
    /// Geometry missing or carrying a zero coordinate.
    Unlocated,
    /// No owner recorded.
    Orphaned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingOrder {
    /// Insertion order.
    Natural,
    NewestFirst,
    PriceAscending,
}

impl ListingOrder {
    pub fn sort_document(&self) -> Option<Document> {
        match self {
            ListingOrder::Natural => None,
            ListingOrder::NewestFirst => Some(doc! { "_id": -1 }),
            ListingOrder::PriceAscending => Some(doc! { "price": 1 }),
        }
    }

    /// Orders listings that are already in insertion order.
    pub fn apply(&self, listings: &mut Vec<Listing>) {
        match self {
            ListingOrder::Natural => {}
            ListingOrder::NewestFirst => listings.reverse(),
            ListingOrder::PriceAscending => listings.sort_by(|a, b| a.price.total_cmp(&b.price)),
        }
    }
}

fn contains_regex(needle: &str) -> Document {
    doc! { "$regex": regex::escape(needle), "$options": "i" }
}

fn compile_contains(needle: &str) -> Result<Regex, AppError> {
    RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(true)
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build pattern: {}", e)))
}

impl ListingFilter {
    pub fn to_document(&self) -> Document {
        match self {
            ListingFilter::All => doc! {},
            ListingFilter::Contains(field, needle) => {
                let mut filter = Document::new();
                filter.insert(field.key(), contains_regex(needle));
                filter
            }
            ListingFilter::CategorySlug(slug) => doc! {
                "$or": [
                    { "category": slug },
                    { "category": slug.replace('-', " ") },
                    { "category": contains_regex(slug) },
                ]
            },
            ListingFilter::PriceAtMost(ceiling) => doc! { "price": { "$lte": *ceiling } },
            ListingFilter::Unlocated => doc! {
                "$or": [
                    { "geometry": null },
                    { "geometry.coordinates.0": 0 },
                    { "geometry.coordinates.1": 0 },
                ]
            },
            ListingFilter::Orphaned => doc! { "owner": null },
        }
    }

    /// In-process equivalent of `to_document`.
    pub fn compile(&self) -> Result<CompiledFilter, AppError> {
        Ok(match self {
            ListingFilter::All => CompiledFilter::All,
            ListingFilter::Contains(field, needle) => {
                CompiledFilter::Contains(*field, compile_contains(needle)?)
            }
            ListingFilter::CategorySlug(slug) => CompiledFilter::CategorySlug {
                exact: slug.clone(),
                spaced: slug.replace('-', " "),
                pattern: compile_contains(slug)?,
            },
            ListingFilter::PriceAtMost(ceiling) => CompiledFilter::PriceAtMost(*ceiling as f64),
            ListingFilter::Unlocated => CompiledFilter::Unlocated,
            ListingFilter::Orphaned => CompiledFilter::Orphaned,
        })
    }
}

pub enum CompiledFilter {
    All,
    Contains(ListingField, Regex),
    CategorySlug {
        exact: String,
        spaced: String,
        pattern: Regex,
    },
    PriceAtMost(f64),
    Unlocated,
    Orphaned,
}

impl CompiledFilter {
    pub fn matches(&self, listing: &Listing) -> bool {
        match self {
            CompiledFilter::All => true,
            CompiledFilter::Contains(field, pattern) => pattern.is_match(field.value(listing)),
            CompiledFilter::CategorySlug { exact, spaced, pattern } => {
                listing.category == *exact
                    || listing.category == *spaced
                    || pattern.is_match(&listing.category)
            }
            CompiledFilter::PriceAtMost(ceiling) => listing.price <= *ceiling,
            CompiledFilter::Unlocated => !listing.geometry.is_located(),
            CompiledFilter::Orphaned => listing.owner.is_none(),
        }
    }
}

pub fn ids_filter(ids: &[ObjectId]) -> Document {
    doc! { "_id": { "$in": ids.to_vec() } }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(title: &str, category: &str) -> Listing {
        Listing {
            id: None,
            title: title.into(),
            description: String::new(),
            image: Default::default(),
            price: 100.0,
            location: String::new(),
            country: String::new(),
            category: category.into(),
            geometry: Default::default(),
            owner: None,
            reviews: vec![],
        }
    }

    #[test]
    fn user_input_is_matched_literally() {
        let filter = ListingFilter::Contains(ListingField::Title, "villa (".into());
        let doc = filter.to_document();
        assert_eq!(doc.get_document("title").unwrap().get_str("$regex").unwrap(), r"villa \(");

        let compiled = filter.compile().unwrap();
        assert!(compiled.matches(&listing("Seaside Villa (2 rooms)", "")));
        assert!(!compiled.matches(&listing("Seaside Villa", "")));
    }

    #[test]
    fn category_slug_matches_three_ways() {
        let compiled = ListingFilter::CategorySlug("iconic-cities".into()).compile().unwrap();
        assert!(compiled.matches(&listing("a", "iconic-cities")));
        assert!(compiled.matches(&listing("b", "iconic cities")));
        assert!(compiled.matches(&listing("c", "Iconic-Cities-Europe")));
        assert!(!compiled.matches(&listing("d", "Iconic Cities")));
    }

    #[test]
    fn sort_documents_per_order() {
        assert_eq!(ListingOrder::Natural.sort_document(), None);
        assert_eq!(ListingOrder::NewestFirst.sort_document(), Some(doc! { "_id": -1 }));
        assert_eq!(ListingOrder::PriceAscending.sort_document(), Some(doc! { "price": 1 }));
    }

    #[test]
    fn category_slug_query() {
        let doc = ListingFilter::CategorySlug("iconic-cities".into()).to_document();
        let branches = doc.get_array("$or").unwrap();
        assert_eq!(branches.len(), 3);
        assert_eq!(branches[0].as_document().unwrap(), &doc! { "category": "iconic-cities" });
        assert_eq!(branches[1].as_document().unwrap(), &doc! { "category": "iconic cities" });
        assert_eq!(
            branches[2].as_document().unwrap(),
            &doc! { "category": { "$regex": regex::escape("iconic-cities"), "$options": "i" } }
        );
    }

    #[test]
    fn price_unlocated_and_orphaned_queries() {
        assert_eq!(
            ListingFilter::PriceAtMost(1200).to_document(),
            doc! { "price": { "$lte": 1200_i64 } }
        );
        assert_eq!(
            ListingFilter::Unlocated.to_document(),
            doc! {
                "$or": [
                    { "geometry": null },
                    { "geometry.coordinates.0": 0 },
                    { "geometry.coordinates.1": 0 },
                ]
            }
        );
        assert_eq!(ListingFilter::Orphaned.to_document(), doc! { "owner": null });
        assert_eq!(ListingFilter::All.to_document(), doc! {});
    }

    #[test]
    fn ids_filter_uses_in() {
        let ids = vec![ObjectId::new(), ObjectId::new()];
        let filter = ids_filter(&ids);
        let values = filter.get_document("_id").unwrap().get_array("$in").unwrap();
        let parsed: Vec<ObjectId> = values.iter().map(|v| v.as_object_id().unwrap()).collect();
        assert_eq!(parsed, ids);
    }

    #[test]
    fn price_order_is_ascending() {
        let mut items = vec![listing("a", ""), listing("b", ""), listing("c", "")];
        items[0].price = 300.0;
        items[1].price = 100.0;
        items[2].price = 200.0;
        ListingOrder::PriceAscending.apply(&mut items);
        let prices: Vec<f64> = items.iter().map(|l| l.price).collect();
        assert_eq!(prices, vec![100.0, 200.0, 300.0]);
    }
}
