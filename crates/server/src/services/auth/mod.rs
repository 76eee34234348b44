//! Authentication service.
//!
//! Session-based registration, login, and the password-reset token state
//! machine.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use rand::RngCore;
use sqlx::PgPool;

use storefinder_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Reset tokens are this many random bytes, hex encoded (40 characters).
const RESET_TOKEN_BYTES: usize = 20;

/// Reset tokens live for one hour from issuance.
const RESET_TOKEN_TTL_SECONDS: i64 = 3600;

/// Authentication service.
///
/// Handles registration, credential checks, and password resets.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::PasswordMismatch` if the confirmation differs.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        if password != password_confirm {
            return Err(AuthError::PasswordMismatch);
        }
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(name.trim(), &email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Update a user's display name and email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed email.
    /// Returns `AuthError::UserAlreadyExists` if the email is taken.
    pub async fn update_profile_by_id(
        &self,
        user_id: UserId,
        name: &str,
        email: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let user = self
            .users
            .update_profile(user_id, name.trim(), &email)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    // =========================================================================
    // Password reset
    // =========================================================================

    /// Step 1: issue a reset token for the account behind `email`.
    ///
    /// Generates 20 random bytes (40 lowercase hex characters), stores them
    /// with a one-hour expiry, and returns the user plus the token for the
    /// caller to email out. No token is issued for unknown emails.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` for an unknown email (the route
    /// surfaces this as a distinguishable message, matching observed
    /// behavior).
    pub async fn request_password_reset(&self, email: &str) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;

        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let token = generate_reset_token();
        let expires = Utc::now() + Duration::seconds(RESET_TOKEN_TTL_SECONDS);
        self.users.set_reset_token(user.id, &token, expires).await?;

        Ok((user, token))
    }

    /// Step 2: validate a token before rendering the new-password form.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetToken` for an unknown or expired
    /// token (expiry is a strict greater-than against now).
    pub async fn validate_reset_token(&self, token: &str) -> Result<User, AuthError> {
        self.users
            .find_by_valid_reset_token(token)
            .await?
            .ok_or(AuthError::InvalidResetToken)
    }

    /// Steps 3-4: confirm the passwords match, re-validate the token (it may
    /// have expired since the form rendered), set the new credential, and
    /// clear the token fields.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordMismatch` if the confirmation differs.
    /// Returns `AuthError::InvalidResetToken` if the token is no longer valid.
    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<User, AuthError> {
        if password != password_confirm {
            return Err(AuthError::PasswordMismatch);
        }
        validate_password(password)?;

        // The token could have expired between the form render and this
        // submit; check again.
        let user = self.validate_reset_token(token).await?;

        let password_hash = hash_password(password)?;
        self.users
            .complete_password_reset(user.id, &password_hash)
            .await?;

        Ok(user)
    }
}

/// Generate a password-reset token: 20 random bytes as lowercase hex.
fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_token_format() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 40);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(token, token.to_lowercase());
    }

    #[test]
    fn test_reset_tokens_are_unique() {
        assert_ne!(generate_reset_token(), generate_reset_token());
    }

    #[test]
    fn test_token_ttl_is_one_hour() {
        assert_eq!(RESET_TOKEN_TTL_SECONDS, 3600);
    }

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough").is_ok());
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse battery").expect("hashes");
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
