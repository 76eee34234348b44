//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client, plus the flash-redirect helpers used by handlers
//! to carry one-time user-facing messages across redirects as explicit query
//! parameters.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::email::EmailError;
use crate::services::stores::StoreError;
use crate::services::upload::UploadError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Outgoing email failed.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// Photo upload was rejected or failed.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated user may not perform this action (e.g. editing a store
    /// they do not own).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A uniqueness conflict the client can resolve by retrying.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The message shown to the client. Internal details stay out of it.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Email(_) => "Failed to send email".to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    "Invalid credentials".to_string()
                }
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::PasswordMismatch => "Passwords do not match".to_string(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::InvalidResetToken => {
                    "Password reset is invalid or has expired".to_string()
                }
                _ => "Authentication error".to_string(),
            },
            Self::Upload(err) => err.to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound("store".to_owned()),
            StoreError::NotOwner => Self::Forbidden(err.to_string()),
            StoreError::SlugTaken => Self::Conflict(err.to_string()),
            StoreError::InvalidName(e) => Self::BadRequest(e.to_string()),
            StoreError::Repository(e) => Self::Database(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Database(_) | Self::Internal(_) | Self::Email(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(_) | Self::Internal(_) | Self::Email(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::PasswordMismatch
                | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::InvalidResetToken => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Upload(err) => match err {
                UploadError::NotAnImage(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                UploadError::Multipart(_) | UploadError::Decode(_) => StatusCode::BAD_REQUEST,
                UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        (status, self.user_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

// =============================================================================
// Flash messages
// =============================================================================

/// Kind of one-time message carried across a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    Error,
    Success,
    Info,
}

impl Flash {
    /// Query parameter key for this flash kind.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Success => "success",
            Self::Info => "info",
        }
    }
}

/// Build a redirect URL carrying a flash message as a query parameter.
///
/// The message is the explicit outbound state of the request: the target
/// page handler reads it back out of the query string, so no session
/// mutation is involved.
#[must_use]
pub fn flash_url(path: &str, kind: Flash, message: &str) -> String {
    let sep = if path.contains('?') { '&' } else { '?' };
    format!("{path}{sep}{}={}", kind.key(), urlencoding::encode(message))
}

/// Redirect to `path` with a flash message attached.
#[must_use]
pub fn flash_redirect(path: &str, kind: Flash, message: &str) -> Redirect {
    Redirect::to(&flash_url(path, kind, message))
}

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("store coffee-shop".to_string());
        assert_eq!(err.to_string(), "Not found: store coffee-shop");

        let err = AppError::Forbidden("not the author".to_string());
        assert_eq!(err.to_string(), "Forbidden: not the author");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Upload(UploadError::NotAnImage(
                "text/plain".to_string()
            ))),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }

    #[test]
    fn test_slug_collision_is_conflict_not_internal() {
        use crate::services::stores::StoreError;

        // A losing concurrent same-name save is an accepted race, not a
        // server failure.
        let err = AppError::from(StoreError::SlugTaken);
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_flash_url_encodes_message() {
        let url = flash_url("/login", Flash::Error, "Oops, you must be logged in!");
        assert_eq!(url, "/login?error=Oops%2C%20you%20must%20be%20logged%20in%21");
    }

    #[test]
    fn test_flash_url_appends_to_existing_query() {
        let url = flash_url("/stores?page=2", Flash::Info, "moved");
        assert_eq!(url, "/stores?page=2&info=moved");
    }
}
