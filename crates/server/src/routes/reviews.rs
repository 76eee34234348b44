//! Review submission handler.

use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use storefinder_core::{Rating, StoreId};

use crate::db::reviews::ReviewRepository;
use crate::db::stores::StoreRepository;
use crate::error::{AppError, Flash, flash_redirect};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Review form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub text: String,
    pub rating: i32,
}

/// Handle a review submission against a store, then return to its page.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
    Path(store_id): Path<StoreId>,
    Form(form): Form<ReviewForm>,
) -> Result<Response, AppError> {
    let rating = Rating::parse(form.rating)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let stores = StoreRepository::new(state.pool());
    let store = stores
        .find_by_id(store_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {}", store_id.as_i32())))?;

    let reviews = ReviewRepository::new(state.pool());
    let review = reviews
        .insert(store_id, current_user.id, form.text.trim(), rating)
        .await?;

    tracing::info!(review_id = %review.id, store_id = %store_id, "Review saved");

    Ok(flash_redirect(&format!("/store/{}", store.slug), Flash::Success, "Review Saved!")
        .into_response())
}
