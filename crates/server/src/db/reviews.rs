//! Review repository.

use sqlx::PgPool;

use storefinder_core::{Rating, StoreId, UserId};

use super::RepositoryError;
use crate::models::{Review, ReviewWithAuthor};

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a review against a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails (including a
    /// missing store id, which surfaces as a foreign-key violation).
    pub async fn insert(
        &self,
        store_id: StoreId,
        author_id: UserId,
        body: &str,
        rating: Rating,
    ) -> Result<Review, RepositoryError> {
        let review = sqlx::query_as::<_, Review>(
            "INSERT INTO review (store_id, author_id, body, rating)
             VALUES ($1, $2, $3, $4)
             RETURNING id, store_id, author_id, body, rating, created",
        )
        .bind(store_id)
        .bind(author_id)
        .bind(body)
        .bind(rating)
        .fetch_one(self.pool)
        .await?;

        Ok(review)
    }

    /// All reviews for a store with author names, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_store(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<ReviewWithAuthor>, RepositoryError> {
        let reviews = sqlx::query_as::<_, ReviewWithAuthor>(
            "SELECT r.id, r.store_id, r.author_id, u.name AS author_name,
                    r.body, r.rating, r.created
             FROM review r
             JOIN app_user u ON u.id = r.author_id
             WHERE r.store_id = $1
             ORDER BY r.created DESC",
        )
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        Ok(reviews)
    }
}
