//! Store service: create/edit rules that sit above the repository.
//!
//! Slug derivation happens here, as an explicit step before persisting:
//! derive the base slug from the name, count the existing slug family,
//! and suffix when the base is taken. Ownership is also enforced here so
//! route handlers stay thin.

use sqlx::PgPool;
use thiserror::Error;

use storefinder_core::{Slug, SlugError, StoreId, UserId};

use crate::db::stores::{NewStore, StoreRepository, StoreUpdate};
use crate::db::RepositoryError;
use crate::models::Store;

/// Errors from store create/edit operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No store with the given id.
    #[error("Store not found")]
    NotFound,

    /// The name contains no characters usable in a slug.
    #[error(transparent)]
    InvalidName(#[from] SlugError),

    /// The acting user does not own the store.
    #[error("You must own a store in order to edit it")]
    NotOwner,

    /// The derived slug collided with a concurrent save of the same name.
    /// Saving again re-counts the family and picks the next suffix.
    #[error("That name was just taken, please save again")]
    SlugTaken,

    /// Underlying repository error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Validated fields shared by the add and edit forms.
#[derive(Debug, Clone)]
pub struct StoreInput {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub address: String,
    pub lng: f64,
    pub lat: f64,
}

impl StoreInput {
    /// Trim surrounding whitespace off the text fields before persisting.
    fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_owned(),
            description: self.description.trim().to_owned(),
            address: self.address.trim().to_owned(),
            tags: self.tags,
            lng: self.lng,
            lat: self.lat,
        }
    }
}

/// Service for store operations.
pub struct StoreService<'a> {
    stores: StoreRepository<'a>,
}

impl<'a> StoreService<'a> {
    /// Create a new store service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            stores: StoreRepository::new(pool),
        }
    }

    /// Create a store owned by `author_id`.
    ///
    /// The slug is derived from the trimmed name and made unique before the
    /// insert.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::SlugTaken` when the slug races a concurrent
    /// create, and `StoreError::Repository` for other database failures.
    pub async fn create(
        &self,
        author_id: UserId,
        input: StoreInput,
        photo: Option<String>,
    ) -> Result<Store, StoreError> {
        let input = input.trimmed();
        let slug = self.unique_slug(&input.name).await?;

        let store = self
            .stores
            .insert(&NewStore {
                name: input.name,
                slug,
                description: input.description,
                tags: input.tags,
                address: input.address,
                lng: input.lng,
                lat: input.lat,
                photo,
                author_id,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => StoreError::SlugTaken,
                other => StoreError::Repository(other),
            })?;

        tracing::info!(store_id = %store.id, slug = %store.slug, "Store created");

        Ok(store)
    }

    /// Update a store. Only the owner may edit.
    ///
    /// The slug is re-derived only when the name actually changed; an
    /// unchanged name keeps the existing slug, suffix and all.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the store doesn't exist,
    /// `StoreError::NotOwner` if `user_id` is not the author, and
    /// `StoreError::Repository` on database failure.
    pub async fn update(
        &self,
        user_id: UserId,
        store_id: StoreId,
        input: StoreInput,
        photo: Option<String>,
    ) -> Result<Store, StoreError> {
        let input = input.trimmed();
        let existing = self
            .stores
            .find_by_id(store_id)
            .await?
            .ok_or(StoreError::NotFound)?;

        if existing.author_id != user_id {
            return Err(StoreError::NotOwner);
        }

        let slug = if existing.name == input.name {
            None
        } else {
            Some(self.unique_slug(&input.name).await?)
        };

        let store = self
            .stores
            .update(
                store_id,
                &StoreUpdate {
                    name: input.name,
                    slug,
                    description: input.description,
                    tags: input.tags,
                    address: input.address,
                    lng: input.lng,
                    lat: input.lat,
                    photo,
                },
            )
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => StoreError::NotFound,
                RepositoryError::Conflict(_) => StoreError::SlugTaken,
                other => StoreError::Repository(other),
            })?;

        Ok(store)
    }

    /// Fetch a store for editing, enforcing ownership.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` or `StoreError::NotOwner` as for
    /// [`Self::update`].
    pub async fn find_for_edit(
        &self,
        user_id: UserId,
        store_id: StoreId,
    ) -> Result<Store, StoreError> {
        let store = self
            .stores
            .find_by_id(store_id)
            .await?
            .ok_or(StoreError::NotFound)?;

        if store.author_id != user_id {
            return Err(StoreError::NotOwner);
        }

        Ok(store)
    }

    /// Derive a slug from `name` that is unique among existing stores.
    ///
    /// Counts every slug in the base's family (`base`, `base-2`, ...) and
    /// picks the suffix from the count. Gaps left by deletions are not
    /// reused.
    async fn unique_slug(&self, name: &str) -> Result<Slug, StoreError> {
        let base = Slug::from_name(name)?;
        let count = self.stores.count_slug_family(&base).await?;
        Ok(slug_for_family(base, count))
    }
}

/// Pick the slug for a save given how many slugs already share its base:
/// zero existing keeps the base, N existing appends `-(N + 1)`.
fn slug_for_family(base: Slug, existing: i64) -> Slug {
    if existing == 0 {
        base
    } else {
        let next = usize::try_from(existing).unwrap_or(usize::MAX - 1) + 1;
        base.with_suffix(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_name_saves_suffix_sequentially() {
        let base = Slug::from_name("Coffee Shop").expect("valid name");

        // Each save re-counts the family, so the Nth save sees N-1 rows.
        let slugs: Vec<String> = (0..3)
            .map(|taken| slug_for_family(base.clone(), taken).into_inner())
            .collect();

        assert_eq!(slugs, ["coffee-shop", "coffee-shop-2", "coffee-shop-3"]);
    }

    #[test]
    fn test_slug_for_family_keeps_base_when_unclaimed() {
        let base = Slug::from_name("Tea House").expect("valid name");
        assert_eq!(slug_for_family(base, 0).as_str(), "tea-house");
    }

    #[test]
    fn test_store_input_trimmed() {
        let input = StoreInput {
            name: "  Coffee Shop  ".to_owned(),
            description: " Great beans \n".to_owned(),
            tags: vec!["Wifi".to_owned()],
            address: " 123 Main St ".to_owned(),
            lng: -79.38,
            lat: 43.65,
        };

        let trimmed = input.trimmed();
        assert_eq!(trimmed.name, "Coffee Shop");
        assert_eq!(trimmed.description, "Great beans");
        assert_eq!(trimmed.address, "123 Main St");
        assert_eq!(trimmed.tags, ["Wifi"]);
    }
}
