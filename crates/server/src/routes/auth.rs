//! Login, registration, and logout handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{AppError, Flash, clear_sentry_user, flash_redirect, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::routes::MessageQuery;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "password-confirm")]
    pub password_confirm: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub current_user: Option<CurrentUser>,
    pub messages: MessageQuery,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub current_user: Option<CurrentUser>,
    pub messages: MessageQuery,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the login page.
pub async fn login_page(
    OptionalAuth(current_user): OptionalAuth,
    Query(messages): Query<MessageQuery>,
) -> impl IntoResponse {
    LoginTemplate {
        current_user,
        messages,
    }
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let auth = AuthService::new(state.pool());

    let user = match auth.login(&form.email, &form.password).await {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials | AuthError::InvalidEmail(_)) => {
            return Ok(flash_redirect("/login", Flash::Error, "Failed Login!").into_response());
        }
        Err(e) => return Err(e.into()),
    };

    set_sentry_user(&user.id, Some(user.email.as_str()));

    let current_user = CurrentUser::from(user);
    if let Err(e) = set_current_user(&session, &current_user).await {
        tracing::error!("Failed to set session: {}", e);
        return Ok(flash_redirect("/login", Flash::Error, "Failed Login!").into_response());
    }

    Ok(flash_redirect("/", Flash::Success, "You are now logged in!").into_response())
}

/// Display the registration page.
pub async fn register_page(
    OptionalAuth(current_user): OptionalAuth,
    Query(messages): Query<MessageQuery>,
) -> impl IntoResponse {
    RegisterTemplate {
        current_user,
        messages,
    }
}

/// Handle registration form submission; logs the new user in on success.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let auth = AuthService::new(state.pool());

    let user = match auth
        .register(&form.name, &form.email, &form.password, &form.password_confirm)
        .await
    {
        Ok(user) => user,
        Err(
            e @ (AuthError::InvalidEmail(_)
            | AuthError::PasswordMismatch
            | AuthError::WeakPassword(_)
            | AuthError::UserAlreadyExists),
        ) => {
            let message = AppError::Auth(e).user_message();
            return Ok(flash_redirect("/register", Flash::Error, &message).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %user.id, "User registered");
    set_sentry_user(&user.id, Some(user.email.as_str()));

    let current_user = CurrentUser::from(user);
    if let Err(e) = set_current_user(&session, &current_user).await {
        tracing::error!("Failed to set session after registration: {}", e);
        return Ok(Redirect::to("/login").into_response());
    }

    Ok(flash_redirect("/", Flash::Success, "You are now logged in!").into_response())
}

/// Handle logout: clear the session user and flush the session.
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }

    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {}", e);
    }

    clear_sentry_user();

    flash_redirect("/", Flash::Success, "You are now logged out!").into_response()
}
