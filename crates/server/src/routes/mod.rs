//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Store listing (page 1)
//! GET  /stores                 - Store listing (page 1)
//! GET  /stores/page/{page}     - Store listing, paginated
//! GET  /store/{slug}           - Store detail with author and reviews
//! GET  /add                    - Add-store form (requires auth)
//! POST /add                    - Create store (multipart, requires auth)
//! POST /add/{id}               - Update store (multipart, owner only)
//! GET  /stores/{id}/edit       - Edit-store form (owner only)
//! GET  /tags                   - Tag histogram
//! GET  /tags/{tag}             - Tag histogram plus stores with that tag
//! GET  /top                    - Top rated stores
//! GET  /map                    - Map page
//! GET  /hearts                 - Stores the user hearted (requires auth)
//!
//! # Auth
//! GET  /login                  - Login page
//! POST /login                  - Login action
//! GET  /register               - Register page
//! POST /register               - Register action, logs in on success
//! GET  /logout                 - Logout action
//!
//! # Account (requires auth)
//! GET  /account                - Account page
//! POST /account                - Update name and email
//! POST /account/forgot         - Send password reset email
//! GET  /account/reset/{token}  - Reset form (valid token only)
//! POST /account/reset/{token}  - Set new password, logs in on success
//!
//! # Reviews
//! POST /reviews/{store_id}     - Add a review (requires auth)
//!
//! # JSON API
//! GET  /api/search?q=          - Full-text store search (top 5)
//! GET  /api/stores/near?lat=&lng= - Stores within 10km (top 10)
//! POST /api/stores/{id}/heart  - Toggle a heart (requires auth)
//! ```

pub mod account;
pub mod api;
pub mod auth;
pub mod reviews;
pub mod stores;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Deserialize;

use crate::state::AppState;

/// Query parameters carrying one-time flash messages across redirects.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
    pub info: Option<String>,
}

/// Create the store page routes router.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stores::index))
        .route("/stores", get(stores::index))
        .route("/stores/page/{page}", get(stores::index_page))
        .route("/store/{slug}", get(stores::show))
        .route("/add", get(stores::add_form).post(stores::create))
        .route("/add/{id}", post(stores::update))
        .route("/stores/{id}/edit", get(stores::edit_form))
        .route("/tags", get(stores::tags))
        .route("/tags/{tag}", get(stores::tags_for))
        .route("/top", get(stores::top))
        .route("/map", get(stores::map_page))
        .route("/hearts", get(stores::hearts))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", get(auth::logout))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/account", get(account::account_page).post(account::update))
        .route("/account/forgot", post(account::forgot_password))
        .route(
            "/account/reset/{token}",
            get(account::reset_page).post(account::reset_password),
        )
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/search", get(api::search))
        .route("/api/stores/near", get(api::near))
        .route("/api/stores/{id}/heart", post(api::toggle_heart))
}

/// Create the combined application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(store_routes())
        .merge(auth_routes())
        .merge(account_routes())
        .merge(api_routes())
        .route("/reviews/{store_id}", post(reviews::create))
}
