//! Store repository: persistence plus the aggregation queries backing the
//! tag, top-stores, search, and map views.
//!
//! The original data store expressed these as aggregation pipelines; here
//! each is one explicit SQL statement. Related rows (author, reviews) are
//! joined only when the caller asks for them via [`StoreJoin`].

use sqlx::PgPool;

use storefinder_core::{Slug, StoreId, UserId};

use super::RepositoryError;
use crate::models::store::SummaryRow;
use crate::models::{
    ReviewWithAuthor, Store, StoreDetail, StoreJoin, StoreSummary, TagCount, TopStore,
};

/// Stores per listing page.
pub const PAGE_SIZE: i64 = 4;

/// Search results are capped at 5.
const SEARCH_LIMIT: i64 = 5;

/// Proximity results are capped at 10 within this many meters.
const NEAR_LIMIT: i64 = 10;
const NEAR_RADIUS_METERS: f64 = 10_000.0;

/// Top-stores results are capped at 10; a store needs at least this many
/// reviews to qualify.
const TOP_LIMIT: i64 = 10;
const TOP_MIN_REVIEWS: i64 = 2;

const STORE_COLUMNS: &str =
    "id, name, slug, description, tags, created, address, lng, lat, photo, author_id";

/// Fields written on create.
#[derive(Debug, Clone)]
pub struct NewStore {
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub tags: Vec<String>,
    pub address: String,
    pub lng: f64,
    pub lat: f64,
    pub photo: Option<String>,
    pub author_id: UserId,
}

/// Fields written on update.
///
/// `slug` is `Some` only when the name changed and the service re-derived it;
/// `photo` is `Some` only when a new photo was uploaded.
#[derive(Debug, Clone)]
pub struct StoreUpdate {
    pub name: String,
    pub slug: Option<Slug>,
    pub description: String,
    pub tags: Vec<String>,
    pub address: String,
    pub lng: f64,
    pub lat: f64,
    pub photo: Option<String>,
}

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of stores (newest first) plus the total count.
    ///
    /// Pages are 1-based; anything below 1 is treated as page 1.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_page(&self, page: u32) -> Result<(Vec<Store>, i64), RepositoryError> {
        let page = i64::from(page.max(1));
        let skip = (page - 1) * PAGE_SIZE;

        let stores = sqlx::query_as::<_, Store>(&format!(
            "SELECT {STORE_COLUMNS} FROM store ORDER BY created DESC LIMIT $1 OFFSET $2"
        ))
        .bind(PAGE_SIZE)
        .bind(skip)
        .fetch_all(self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM store")
            .fetch_one(self.pool)
            .await?;

        Ok((stores, count))
    }

    /// Look up a store by slug, optionally joining author and reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn find_by_slug(
        &self,
        slug: &str,
        join: StoreJoin,
    ) -> Result<Option<StoreDetail>, RepositoryError> {
        let store = sqlx::query_as::<_, Store>(&format!(
            "SELECT {STORE_COLUMNS} FROM store WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        let Some(store) = store else {
            return Ok(None);
        };

        let (author_name, reviews) = match join {
            StoreJoin::Bare => (None, Vec::new()),
            StoreJoin::AuthorAndReviews => {
                let author_name: Option<String> =
                    sqlx::query_scalar("SELECT name FROM app_user WHERE id = $1")
                        .bind(store.author_id)
                        .fetch_optional(self.pool)
                        .await?;

                let reviews = sqlx::query_as::<_, ReviewWithAuthor>(
                    "SELECT r.id, r.store_id, r.author_id, u.name AS author_name,
                            r.body, r.rating, r.created
                     FROM review r
                     JOIN app_user u ON u.id = r.author_id
                     WHERE r.store_id = $1
                     ORDER BY r.created DESC",
                )
                .bind(store.id)
                .fetch_all(self.pool)
                .await?;

                (author_name, reviews)
            }
        };

        Ok(Some(StoreDetail {
            store,
            author_name,
            reviews,
        }))
    }

    /// Look up a store by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let store = sqlx::query_as::<_, Store>(&format!(
            "SELECT {STORE_COLUMNS} FROM store WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(store)
    }

    /// Count stores whose slug belongs to the given base-slug family
    /// (`base`, `base-2`, ...), case-insensitively.
    ///
    /// One read per save; the store service uses the count to pick a suffix.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_slug_family(&self, base: &Slug) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM store WHERE slug ~* $1")
            .bind(base.family_pattern())
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Insert a new store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug already exists
    /// (concurrent creates can race the slug-family count).
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert(&self, new: &NewStore) -> Result<Store, RepositoryError> {
        let store = sqlx::query_as::<_, Store>(&format!(
            "INSERT INTO store (name, slug, description, tags, address, lng, lat, photo, author_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {STORE_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.slug)
        .bind(&new.description)
        .bind(&new.tags)
        .bind(&new.address)
        .bind(new.lng)
        .bind(new.lat)
        .bind(&new.photo)
        .bind(new.author_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("slug already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(store)
    }

    /// Update a store. The slug is rewritten only when provided; the photo
    /// is kept when no new one was uploaded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store doesn't exist.
    /// Returns `RepositoryError::Conflict` on a slug collision.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: StoreId,
        update: &StoreUpdate,
    ) -> Result<Store, RepositoryError> {
        let store = sqlx::query_as::<_, Store>(&format!(
            "UPDATE store
             SET name = $2,
                 slug = COALESCE($3, slug),
                 description = $4,
                 tags = $5,
                 address = $6,
                 lng = $7,
                 lat = $8,
                 photo = COALESCE($9, photo)
             WHERE id = $1
             RETURNING {STORE_COLUMNS}"
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.slug)
        .bind(&update.description)
        .bind(&update.tags)
        .bind(&update.address)
        .bind(update.lng)
        .bind(update.lat)
        .bind(&update.photo)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("slug already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        store.ok_or(RepositoryError::NotFound)
    }

    /// Full tag histogram: every (store, tag) pair grouped by tag, counted,
    /// and sorted by descending count. No pagination.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn tags_histogram(&self) -> Result<Vec<TagCount>, RepositoryError> {
        let tags = sqlx::query_as::<_, TagCount>(
            "SELECT t.tag, COUNT(*) AS count
             FROM store s, unnest(s.tags) AS t(tag)
             GROUP BY t.tag
             ORDER BY count DESC, t.tag",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(tags)
    }

    /// Stores carrying the given tag, or any tag at all when `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_tag(&self, tag: Option<&str>) -> Result<Vec<Store>, RepositoryError> {
        let stores = match tag {
            Some(tag) => {
                sqlx::query_as::<_, Store>(&format!(
                    "SELECT {STORE_COLUMNS} FROM store
                     WHERE $1 = ANY(tags)
                     ORDER BY created DESC"
                ))
                .bind(tag)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Store>(&format!(
                    "SELECT {STORE_COLUMNS} FROM store
                     WHERE cardinality(tags) > 0
                     ORDER BY created DESC"
                ))
                .fetch_all(self.pool)
                .await?
            }
        };

        Ok(stores)
    }

    /// Top stores: join reviews by store id, keep stores with at least two,
    /// project the reduced shape with the mean rating, best first, capped
    /// at ten.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_stores(&self) -> Result<Vec<TopStore>, RepositoryError> {
        let stores = sqlx::query_as::<_, TopStore>(
            "SELECT s.photo, s.name, COUNT(r.id) AS reviews, s.slug,
                    AVG(r.rating)::DOUBLE PRECISION AS average_rating
             FROM store s
             JOIN review r ON r.store_id = s.id
             GROUP BY s.id
             HAVING COUNT(r.id) >= $1
             ORDER BY average_rating DESC
             LIMIT $2",
        )
        .bind(TOP_MIN_REVIEWS)
        .bind(TOP_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(stores)
    }

    /// Full-text search over name + description, best match first, capped
    /// at five.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, query: &str) -> Result<Vec<StoreSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            "SELECT slug, name, description, address, lng, lat, photo
             FROM store
             WHERE to_tsvector('english', name || ' ' || description)
                   @@ plainto_tsquery('english', $1)
             ORDER BY ts_rank(to_tsvector('english', name || ' ' || description),
                              plainto_tsquery('english', $1)) DESC
             LIMIT $2",
        )
        .bind(query)
        .bind(SEARCH_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(StoreSummary::from).collect())
    }

    /// Stores within 10 km of the given point by spherical distance,
    /// nearest first, capped at ten.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn near(&self, lng: f64, lat: f64) -> Result<Vec<StoreSummary>, RepositoryError> {
        // Haversine on a 6371 km sphere; close enough at a 10 km radius.
        let rows = sqlx::query_as::<_, SummaryRow>(
            "SELECT slug, name, description, address, lng, lat, photo
             FROM (
                 SELECT *,
                        2.0 * 6371000.0 * asin(least(1.0, sqrt(
                            power(sin(radians(lat - $2) / 2), 2)
                            + cos(radians($2)) * cos(radians(lat))
                              * power(sin(radians(lng - $1) / 2), 2)
                        ))) AS distance
                 FROM store
             ) nearby
             WHERE distance <= $3
             ORDER BY distance
             LIMIT $4",
        )
        .bind(lng)
        .bind(lat)
        .bind(NEAR_RADIUS_METERS)
        .bind(NEAR_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(StoreSummary::from).collect())
    }

    /// Stores the given user has hearted, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn hearted_by(&self, user_id: UserId) -> Result<Vec<Store>, RepositoryError> {
        let stores = sqlx::query_as::<_, Store>(
            "SELECT s.id, s.name, s.slug, s.description, s.tags, s.created,
                    s.address, s.lng, s.lat, s.photo, s.author_id
             FROM store s
             JOIN user_heart h ON h.store_id = s.id
             WHERE h.user_id = $1
             ORDER BY s.created DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(stores)
    }
}

/// 1-based number of the last page holding any stores.
///
/// Zero stores still has one (empty) page so that page 1 renders rather
/// than redirecting.
#[must_use]
pub fn last_page(count: i64) -> u32 {
    let pages = (count + PAGE_SIZE - 1) / PAGE_SIZE;
    u32::try_from(pages.max(1)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_page_rounds_up() {
        assert_eq!(last_page(0), 1);
        assert_eq!(last_page(1), 1);
        assert_eq!(last_page(4), 1);
        assert_eq!(last_page(5), 2);
        assert_eq!(last_page(8), 2);
        assert_eq!(last_page(9), 3);
    }
}
