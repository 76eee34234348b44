//! Account page and password reset handlers.
//!
//! The reset flow: request a token by email, follow the emailed link to
//! the reset form (valid tokens only), then submit the new password. The
//! token is checked again on submit since it can expire in between.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{AppError, Flash, flash_redirect, set_sentry_user};
use crate::filters;
use crate::middleware::{RequireAuth, set_current_user};
use crate::models::CurrentUser;
use crate::routes::MessageQuery;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Account update form data.
#[derive(Debug, Deserialize)]
pub struct AccountForm {
    pub name: String,
    pub email: String,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// Reset password form data.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub password: String,
    #[serde(rename = "password-confirm")]
    pub password_confirm: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Account page template.
#[derive(Template, WebTemplate)]
#[template(path = "account.html")]
pub struct AccountTemplate {
    pub current_user: Option<CurrentUser>,
    pub messages: MessageQuery,
}

/// Reset password page template.
#[derive(Template, WebTemplate)]
#[template(path = "reset_password.html")]
pub struct ResetPasswordTemplate {
    pub current_user: Option<CurrentUser>,
    pub messages: MessageQuery,
    pub token: String,
}

// =============================================================================
// Account
// =============================================================================

/// Display the account page.
pub async fn account_page(
    RequireAuth(current_user): RequireAuth,
    Query(messages): Query<MessageQuery>,
) -> impl IntoResponse {
    AccountTemplate {
        current_user: Some(current_user),
        messages,
    }
}

/// Handle the account update form: change name and email.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
    session: Session,
    Form(form): Form<AccountForm>,
) -> Result<Response, AppError> {
    let auth = AuthService::new(state.pool());

    let user = match auth
        .update_profile_by_id(current_user.id, &form.name, &form.email)
        .await
    {
        Ok(user) => user,
        Err(e @ (AuthError::InvalidEmail(_) | AuthError::UserAlreadyExists)) => {
            let message = AppError::Auth(e).user_message();
            return Ok(flash_redirect("/account", Flash::Error, &message).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    // Keep the session copy of the identity in step with the update
    let refreshed = CurrentUser::from(user);
    if let Err(e) = set_current_user(&session, &refreshed).await {
        tracing::error!("Failed to refresh session after profile update: {}", e);
    }

    Ok(flash_redirect("/account", Flash::Success, "Updated the profile!").into_response())
}

// =============================================================================
// Password reset
// =============================================================================

/// Handle the forgot-password form: issue a token and email the link.
///
/// An unknown email gets its own message rather than a generic one,
/// so this endpoint can confirm whether an account exists.
pub async fn forgot_password(
    State(state): State<AppState>,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Response, AppError> {
    let auth = AuthService::new(state.pool());

    let (user, token) = match auth.request_password_reset(&form.email).await {
        Ok(pair) => pair,
        Err(AuthError::UserNotFound | AuthError::InvalidEmail(_)) => {
            return Ok(flash_redirect(
                "/login",
                Flash::Error,
                "No account with that email exists.",
            )
            .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let reset_url = format!("{}/account/reset/{token}", state.config().base_url);
    state
        .email()
        .send_password_reset(user.email.as_str(), &user.name, &reset_url)
        .await?;

    tracing::info!(user_id = %user.id, "Password reset email sent");

    Ok(flash_redirect(
        "/login",
        Flash::Success,
        "You have been emailed a password reset link.",
    )
    .into_response())
}

/// Display the reset form, but only for a valid unexpired token.
pub async fn reset_page(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Query(messages): Query<MessageQuery>,
) -> Result<Response, AppError> {
    let auth = AuthService::new(state.pool());

    match auth.validate_reset_token(&token).await {
        Ok(_) => {}
        Err(AuthError::InvalidResetToken) => {
            return Ok(flash_redirect(
                "/login",
                Flash::Error,
                "Password reset is invalid or has expired",
            )
            .into_response());
        }
        Err(e) => return Err(e.into()),
    }

    Ok(ResetPasswordTemplate {
        current_user: None,
        messages,
        token,
    }
    .into_response())
}

/// Handle the reset form: set the new password and log the user in.
pub async fn reset_password(
    State(state): State<AppState>,
    session: Session,
    Path(token): Path<String>,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response, AppError> {
    let auth = AuthService::new(state.pool());

    let user = match auth
        .reset_password(&token, &form.password, &form.password_confirm)
        .await
    {
        Ok(user) => user,
        Err(e @ (AuthError::PasswordMismatch | AuthError::WeakPassword(_))) => {
            let message = AppError::Auth(e).user_message();
            return Ok(
                flash_redirect(&format!("/account/reset/{token}"), Flash::Error, &message)
                    .into_response(),
            );
        }
        Err(AuthError::InvalidResetToken) => {
            return Ok(flash_redirect(
                "/login",
                Flash::Error,
                "Password reset is invalid or has expired",
            )
            .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    set_sentry_user(&user.id, Some(user.email.as_str()));

    let current_user = CurrentUser::from(user);
    if let Err(e) = set_current_user(&session, &current_user).await {
        tracing::error!("Failed to set session after password reset: {}", e);
    }

    Ok(flash_redirect(
        "/",
        Flash::Success,
        "Nice! Your password has been reset! You are now logged in.",
    )
    .into_response())
}
