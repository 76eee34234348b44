//! Review domain types.

use chrono::{DateTime, Utc};

use storefinder_core::{Rating, ReviewId, StoreId, UserId};

/// A review left against a store.
///
/// Reviews reference their store by id; they are never embedded in the
/// store row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub store_id: StoreId,
    pub author_id: UserId,
    pub body: String,
    pub rating: Rating,
    pub created: DateTime<Utc>,
}

/// A review joined with its author's display name, for rendering.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReviewWithAuthor {
    pub id: ReviewId,
    pub store_id: StoreId,
    pub author_id: UserId,
    pub author_name: String,
    pub body: String,
    pub rating: Rating,
    pub created: DateTime<Utc>,
}
