//! JSON API handlers: search, map proximity, and heart toggling.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use storefinder_core::StoreId;

use crate::db::stores::StoreRepository;
use crate::db::users::UserRepository;
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::{HeartedUser, StoreSummary};
use crate::state::AppState;

/// Query parameters for text search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// Query parameters for proximity search.
#[derive(Debug, Deserialize)]
pub struct NearQuery {
    pub lat: f64,
    pub lng: f64,
}

/// Full-text search over store names and descriptions, best match first,
/// capped at five results.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<StoreSummary>>, AppError> {
    let repo = StoreRepository::new(state.pool());
    let stores = repo.search(&query.q).await?;

    Ok(Json(stores))
}

/// Stores within 10 km of the given point, nearest first, capped at ten.
pub async fn near(
    State(state): State<AppState>,
    Query(query): Query<NearQuery>,
) -> Result<Json<Vec<StoreSummary>>, AppError> {
    let repo = StoreRepository::new(state.pool());
    let stores = repo.near(query.lng, query.lat).await?;

    Ok(Json(stores))
}

/// Toggle a store in the current user's hearts set.
///
/// Returns the user with their updated hearts so the client can reconcile
/// its heart count and button states in one round trip.
pub async fn toggle_heart(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
    Path(store_id): Path<StoreId>,
) -> Result<Json<HeartedUser>, AppError> {
    let users = UserRepository::new(state.pool());

    let user = users
        .get_by_id(current_user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_owned()))?;

    let hearts = users.toggle_heart(user.id, store_id).await?;

    Ok(Json(HeartedUser::new(user, hearts)))
}
