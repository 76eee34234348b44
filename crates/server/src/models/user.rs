//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use storefinder_core::{Email, StoreId, UserId};

/// A registered account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// User's email address.
    pub email: Email,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// A user together with their current hearts set.
///
/// This is the JSON shape returned by the heart-toggle endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct HeartedUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    /// Store ids the user currently hearts.
    pub hearts: Vec<StoreId>,
}

impl HeartedUser {
    #[must_use]
    pub fn new(user: User, hearts: Vec<StoreId>) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            hearts,
        }
    }
}
