//! URL-safe slugs derived from store display names.
//!
//! Slug uniqueness is not handled here - it requires a read against the
//! store collection and lives in the server's store service, which calls
//! [`Slug::with_suffix`] once it has counted existing matches.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`Slug`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum SlugError {
    /// The source name contained no usable characters.
    #[error("name produces an empty slug")]
    Empty,
}

/// A URL-safe identifier derived from a display name.
///
/// Only lowercase ASCII alphanumerics and single hyphens, with no leading or
/// trailing hyphen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Derive a slug from a display name.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError::Empty`] if the name contains no alphanumeric
    /// characters at all.
    pub fn from_name(name: &str) -> Result<Self, SlugError> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(SlugError::Empty);
        }
        Ok(Self(slug))
    }

    /// The base slug with a numeric suffix appended, e.g. `coffee-shop-2`.
    #[must_use]
    pub fn with_suffix(&self, n: usize) -> Self {
        Self(format!("{}-{n}", self.0))
    }

    /// A case-insensitive regex matching this base slug and any numeric
    /// suffix of it: `^(base)(-[0-9]*)?$`.
    ///
    /// The slug alphabet is `[a-z0-9-]`, so the base needs no escaping.
    #[must_use]
    pub fn family_pattern(&self) -> String {
        format!("^({})(-[0-9]*)?$", self.0)
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Slug` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lowercase a name and collapse every run of non-alphanumeric characters
/// into a single hyphen, trimming hyphens from both ends.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    out
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Slug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Slug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Slug {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Coffee Shop"), "coffee-shop");
        assert_eq!(slugify("Dang! That's Delicious"), "dang-that-s-delicious");
        assert_eq!(slugify("already-a-slug"), "already-a-slug");
    }

    #[test]
    fn test_slugify_collapses_and_trims() {
        assert_eq!(slugify("  Wes's   Pizza!!  "), "wes-s-pizza");
        assert_eq!(slugify("--hello--"), "hello");
    }

    #[test]
    fn test_slugify_non_ascii_dropped() {
        assert_eq!(slugify("café ☕ corner"), "caf-corner");
    }

    #[test]
    fn test_from_name_empty() {
        assert!(matches!(Slug::from_name("!!!"), Err(SlugError::Empty)));
        assert!(matches!(Slug::from_name(""), Err(SlugError::Empty)));
    }

    #[test]
    fn test_with_suffix() {
        let slug = Slug::from_name("Coffee Shop").expect("valid name");
        assert_eq!(slug.with_suffix(2).as_str(), "coffee-shop-2");
    }

    #[test]
    fn test_family_pattern_matches_base_and_suffixes() {
        let slug = Slug::from_name("Coffee Shop").expect("valid name");
        assert_eq!(slug.family_pattern(), "^(coffee-shop)(-[0-9]*)?$");
    }
}
