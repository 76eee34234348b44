//! Store domain types and the reduced aggregation projections.

use chrono::{DateTime, Utc};
use serde::Serialize;

use storefinder_core::{Slug, StoreId, UserId};

use crate::models::ReviewWithAuthor;

/// A store listing.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub tags: Vec<String>,
    pub created: DateTime<Utc>,
    pub address: String,
    pub lng: f64,
    pub lat: f64,
    pub photo: Option<String>,
    pub author_id: UserId,
}

/// Which related rows to load alongside a store.
///
/// Joins are explicit and opt-in; nothing is auto-populated on reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreJoin {
    /// The store row only.
    Bare,
    /// Also load the author's display name and the store's reviews.
    AuthorAndReviews,
}

/// A store with its optionally joined relations.
#[derive(Debug, Clone)]
pub struct StoreDetail {
    pub store: Store,
    /// Author display name; present only when joined.
    pub author_name: Option<String>,
    /// Reviews for this store; empty unless joined.
    pub reviews: Vec<ReviewWithAuthor>,
}

/// GeoJSON-style point with the street address attached.
#[derive(Debug, Clone, Serialize)]
pub struct Location {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// `[longitude, latitude]`
    pub coordinates: [f64; 2],
    pub address: String,
}

/// Flat row shape for summary queries (search, map proximity).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SummaryRow {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub address: String,
    pub lng: f64,
    pub lat: f64,
    pub photo: Option<String>,
}

/// Reduced store shape returned by the JSON search and map endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct StoreSummary {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub location: Location,
    pub photo: Option<String>,
}

impl From<SummaryRow> for StoreSummary {
    fn from(row: SummaryRow) -> Self {
        Self {
            slug: row.slug,
            name: row.name,
            description: row.description,
            location: Location {
                kind: "Point",
                coordinates: [row.lng, row.lat],
                address: row.address,
            },
            photo: row.photo,
        }
    }
}

/// One bucket of the tag histogram.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

/// Reduced projection produced by the top-stores aggregation.
///
/// Serialized field names round-trip exactly: photo, name, reviews, slug,
/// `averageRating`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TopStore {
    pub photo: Option<String>,
    pub name: String,
    /// Number of reviews backing the average.
    pub reviews: i64,
    pub slug: String,
    #[serde(rename = "averageRating")]
    pub average_rating: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_serializes_as_geojson_point() {
        let row = SummaryRow {
            slug: "coffee-shop".to_string(),
            name: "Coffee Shop".to_string(),
            description: String::new(),
            address: "123 Main St".to_string(),
            lng: -79.38,
            lat: 43.65,
            photo: None,
        };

        let summary = StoreSummary::from(row);
        let json = serde_json::to_value(&summary).expect("serializable");
        assert_eq!(json["location"]["type"], "Point");
        assert_eq!(json["location"]["coordinates"][0], -79.38);
        assert_eq!(json["location"]["coordinates"][1], 43.65);
        assert_eq!(json["location"]["address"], "123 Main St");
        assert_eq!(json["photo"], serde_json::Value::Null);
    }

    #[test]
    fn test_top_store_serializes_camel_case_average() {
        let top = TopStore {
            photo: None,
            name: "Coffee Shop".to_string(),
            reviews: 3,
            slug: "coffee-shop".to_string(),
            average_rating: 4.5,
        };

        let json = serde_json::to_value(&top).expect("serializable");
        let average = json["averageRating"].as_f64().expect("number");
        assert!((average - 4.5).abs() < f64::EPSILON);
        assert_eq!(json["reviews"], 3);
    }
}
