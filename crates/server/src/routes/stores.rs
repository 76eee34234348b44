//! Store page handlers: listing, detail, add/edit, tags, top, map, hearts.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Response},
};

use storefinder_core::StoreId;

use crate::db::stores::{StoreRepository, last_page};
use crate::db::users::UserRepository;
use crate::error::{AppError, Flash, flash_redirect};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::{CurrentUser, Store, StoreJoin, TagCount, TopStore};
use crate::routes::MessageQuery;
use crate::services::stores::{StoreError, StoreInput, StoreService};
use crate::services::upload;
use crate::state::AppState;

/// Tags offered as checkboxes on the store form.
const TAG_CHOICES: [&str; 5] = ["Wifi", "Open Late", "Family Friendly", "Vegetarian", "Licensed"];

// =============================================================================
// View types
// =============================================================================

/// A store plus whether the current user hearts it.
pub struct StoreCard {
    pub store: Store,
    pub hearted: bool,
}

/// A tag checkbox with its checked state.
pub struct TagChoice {
    pub name: &'static str,
    pub checked: bool,
}

// =============================================================================
// Templates
// =============================================================================

/// Paginated store listing page.
#[derive(Template, WebTemplate)]
#[template(path = "stores.html")]
pub struct StoresTemplate {
    pub current_user: Option<CurrentUser>,
    pub messages: MessageQuery,
    pub title: String,
    pub cards: Vec<StoreCard>,
    pub page: u32,
    pub pages: u32,
    pub count: i64,
    /// Hide pagination on single-purpose listings like /hearts.
    pub paginated: bool,
}

/// Store detail page.
#[derive(Template, WebTemplate)]
#[template(path = "store.html")]
pub struct StoreTemplate {
    pub current_user: Option<CurrentUser>,
    pub messages: MessageQuery,
    pub store: Store,
    pub author_name: Option<String>,
    pub reviews: Vec<crate::models::ReviewWithAuthor>,
    pub hearted: bool,
}

/// Shared add/edit store form page.
#[derive(Template, WebTemplate)]
#[template(path = "edit_store.html")]
pub struct EditStoreTemplate {
    pub current_user: Option<CurrentUser>,
    pub messages: MessageQuery,
    pub heading: String,
    /// Form POST target: `/add` or `/add/{id}`.
    pub action: String,
    pub store: Option<Store>,
    pub tag_choices: Vec<TagChoice>,
}

/// Tag histogram page, optionally filtered to one tag.
#[derive(Template, WebTemplate)]
#[template(path = "tags.html")]
pub struct TagsTemplate {
    pub current_user: Option<CurrentUser>,
    pub messages: MessageQuery,
    pub tags: Vec<TagCount>,
    pub active_tag: Option<String>,
    pub cards: Vec<StoreCard>,
}

/// Top stores page.
#[derive(Template, WebTemplate)]
#[template(path = "top_stores.html")]
pub struct TopStoresTemplate {
    pub current_user: Option<CurrentUser>,
    pub messages: MessageQuery,
    pub stores: Vec<TopStore>,
}

/// Map page; stores load client-side from the near API.
#[derive(Template, WebTemplate)]
#[template(path = "map.html")]
pub struct MapTemplate {
    pub current_user: Option<CurrentUser>,
    pub messages: MessageQuery,
}

// =============================================================================
// Listing
// =============================================================================

/// Display page 1 of the store listing.
pub async fn index(
    state: State<AppState>,
    auth: OptionalAuth,
    query: Query<MessageQuery>,
) -> Result<Response, AppError> {
    index_page(state, auth, Path("1".to_owned()), query).await
}

/// Display a page of the store listing.
///
/// A page segment that isn't a positive integer renders page 1. Asking for
/// a page past the end redirects to the last page that holds stores; page 1
/// of an empty collection renders empty.
pub async fn index_page(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
    Path(page): Path<String>,
    Query(messages): Query<MessageQuery>,
) -> Result<Response, AppError> {
    let repo = StoreRepository::new(state.pool());
    let page = parse_page(&page);
    let (stores, count) = repo.list_page(page).await?;
    let pages = last_page(count);

    if stores.is_empty() && page > pages {
        let message = format!(
            "Hey! You asked for page {page}. But that doesn't exist. So I put you on page {pages}"
        );
        return Ok(
            flash_redirect(&format!("/stores/page/{pages}"), Flash::Info, &message)
                .into_response(),
        );
    }

    let cards = cards_for(&state, current_user.as_ref(), stores).await?;

    Ok(StoresTemplate {
        current_user,
        messages,
        title: "Stores".to_owned(),
        cards,
        page,
        pages,
        count,
        paginated: true,
    }
    .into_response())
}

/// Parse the page path segment, treating anything that isn't a positive
/// integer as page 1.
fn parse_page(raw: &str) -> u32 {
    raw.parse::<u32>().map_or(1, |p| p.max(1))
}

/// Pair each store with whether the current user hearts it.
async fn cards_for(
    state: &AppState,
    current_user: Option<&CurrentUser>,
    stores: Vec<Store>,
) -> Result<Vec<StoreCard>, AppError> {
    let hearts = match current_user {
        Some(user) => UserRepository::new(state.pool()).hearts(user.id).await?,
        None => Vec::new(),
    };

    Ok(stores
        .into_iter()
        .map(|store| StoreCard {
            hearted: hearts.contains(&store.id),
            store,
        })
        .collect())
}

// =============================================================================
// Detail
// =============================================================================

/// Display a store by its slug, with author name and reviews.
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
    Path(slug): Path<String>,
    Query(messages): Query<MessageQuery>,
) -> Result<Response, AppError> {
    let repo = StoreRepository::new(state.pool());
    let detail = repo
        .find_by_slug(&slug, StoreJoin::AuthorAndReviews)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {slug}")))?;

    let hearted = match &current_user {
        Some(user) => UserRepository::new(state.pool())
            .hearts(user.id)
            .await?
            .contains(&detail.store.id),
        None => false,
    };

    Ok(StoreTemplate {
        current_user,
        messages,
        store: detail.store,
        author_name: detail.author_name,
        reviews: detail.reviews,
        hearted,
    }
    .into_response())
}

// =============================================================================
// Add / Edit
// =============================================================================

/// Display the add-store form.
pub async fn add_form(
    RequireAuth(current_user): RequireAuth,
    Query(messages): Query<MessageQuery>,
) -> impl IntoResponse {
    EditStoreTemplate {
        current_user: Some(current_user),
        messages,
        heading: "Add Store".to_owned(),
        action: "/add".to_owned(),
        store: None,
        tag_choices: tag_choices(&[]),
    }
}

/// Display the edit form for a store the user owns.
pub async fn edit_form(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
    Path(id): Path<StoreId>,
    Query(messages): Query<MessageQuery>,
) -> Result<Response, AppError> {
    let service = StoreService::new(state.pool());
    let store = service.find_for_edit(current_user.id, id).await?;

    Ok(EditStoreTemplate {
        current_user: Some(current_user),
        messages,
        heading: format!("Edit {}", store.name),
        action: format!("/add/{}", store.id.as_i32()),
        tag_choices: tag_choices(&store.tags),
        store: Some(store),
    }
    .into_response())
}

/// Handle the add-store form submission.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let (input, photo) = read_store_form(&state, multipart).await?;

    let service = StoreService::new(state.pool());
    let store = match service.create(current_user.id, input, photo).await {
        Ok(store) => store,
        Err(e @ StoreError::SlugTaken) => {
            return Ok(flash_redirect("/add", Flash::Error, &e.to_string()).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let message = format!(
        "Successfully Created {}. Care to leave a review?",
        store.name
    );
    Ok(flash_redirect(&format!("/store/{}", store.slug), Flash::Success, &message).into_response())
}

/// Handle the edit-store form submission.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
    Path(id): Path<StoreId>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let (input, photo) = read_store_form(&state, multipart).await?;

    let service = StoreService::new(state.pool());
    let store = match service.update(current_user.id, id, input, photo).await {
        Ok(store) => store,
        Err(e @ StoreError::SlugTaken) => {
            return Ok(flash_redirect(
                &format!("/stores/{}/edit", id.as_i32()),
                Flash::Error,
                &e.to_string(),
            )
            .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let message = format!("Successfully updated {}.", store.name);
    Ok(flash_redirect(
        &format!("/stores/{}/edit", store.id.as_i32()),
        Flash::Success,
        &message,
    )
    .into_response())
}

/// Read the multipart store form: text fields, repeated tag checkboxes,
/// and the optional photo, which is validated, resized, and stored here.
async fn read_store_form(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<(StoreInput, Option<String>), AppError> {
    let mut name = String::new();
    let mut description = String::new();
    let mut address = String::new();
    let mut lng: Option<f64> = None;
    let mut lat: Option<f64> = None;
    let mut tags = Vec::new();
    let mut photo = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(upload::UploadError::from)?
    {
        match field.name() {
            Some("name") => name = text_field(field).await?,
            Some("description") => description = text_field(field).await?,
            Some("address") => address = text_field(field).await?,
            Some("lng") => lng = Some(float_field(field, "lng").await?),
            Some("lat") => lat = Some(float_field(field, "lat").await?),
            Some("tags") => tags.push(text_field(field).await?),
            Some("photo") => {
                let content_type = field.content_type().map(ToOwned::to_owned);
                let bytes = field.bytes().await.map_err(upload::UploadError::from)?;

                // An empty file input still submits a zero-length part
                if bytes.is_empty() {
                    continue;
                }

                let content_type = content_type
                    .ok_or_else(|| upload::UploadError::NotAnImage("unknown".to_owned()))?;
                let filename = upload::photo_filename(&content_type)?;
                upload::save_photo(&state.config().upload_dir, &filename, bytes.to_vec()).await?;
                photo = Some(filename);
            }
            _ => {}
        }
    }

    if name.trim().is_empty() {
        return Err(AppError::BadRequest("You must supply a name".to_owned()));
    }

    let input = StoreInput {
        name,
        description,
        tags,
        address,
        lng: lng.ok_or_else(|| AppError::BadRequest("You must supply coordinates".to_owned()))?,
        lat: lat.ok_or_else(|| AppError::BadRequest("You must supply coordinates".to_owned()))?,
    };

    Ok((input, photo))
}

async fn text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    Ok(field.text().await.map_err(upload::UploadError::from)?)
}

async fn float_field(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<f64, AppError> {
    let text = text_field(field).await?;
    text.trim()
        .parse::<f64>()
        .map_err(|_| AppError::BadRequest(format!("{name} must be a number")))
}

fn tag_choices(selected: &[String]) -> Vec<TagChoice> {
    TAG_CHOICES
        .iter()
        .map(|&name| TagChoice {
            name,
            checked: selected.iter().any(|t| t == name),
        })
        .collect()
}

// =============================================================================
// Tags / Top / Map / Hearts
// =============================================================================

/// Display the tag histogram with every tagged store.
pub async fn tags(
    state: State<AppState>,
    auth: OptionalAuth,
    query: Query<MessageQuery>,
) -> Result<Response, AppError> {
    render_tags(state, auth, None, query).await
}

/// Display the tag histogram with the stores carrying one tag.
pub async fn tags_for(
    state: State<AppState>,
    auth: OptionalAuth,
    Path(tag): Path<String>,
    query: Query<MessageQuery>,
) -> Result<Response, AppError> {
    render_tags(state, auth, Some(tag), query).await
}

async fn render_tags(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
    active_tag: Option<String>,
    Query(messages): Query<MessageQuery>,
) -> Result<Response, AppError> {
    let repo = StoreRepository::new(state.pool());

    // Histogram and store list are independent reads
    let tags = repo.tags_histogram().await?;
    let stores = repo.list_by_tag(active_tag.as_deref()).await?;
    let cards = cards_for(&state, current_user.as_ref(), stores).await?;

    Ok(TagsTemplate {
        current_user,
        messages,
        tags,
        active_tag,
        cards,
    }
    .into_response())
}

/// Display the top ten stores by average rating.
pub async fn top(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
    Query(messages): Query<MessageQuery>,
) -> Result<Response, AppError> {
    let repo = StoreRepository::new(state.pool());
    let stores = repo.top_stores().await?;

    Ok(TopStoresTemplate {
        current_user,
        messages,
        stores,
    }
    .into_response())
}

/// Display the map page.
pub async fn map_page(
    OptionalAuth(current_user): OptionalAuth,
    Query(messages): Query<MessageQuery>,
) -> impl IntoResponse {
    MapTemplate {
        current_user,
        messages,
    }
}

/// Display the stores the current user has hearted.
pub async fn hearts(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
    Query(messages): Query<MessageQuery>,
) -> Result<Response, AppError> {
    let repo = StoreRepository::new(state.pool());
    let stores = repo.hearted_by(current_user.id).await?;
    let count = i64::try_from(stores.len()).unwrap_or(i64::MAX);

    let cards = stores
        .into_iter()
        .map(|store| StoreCard {
            store,
            hearted: true,
        })
        .collect();

    Ok(StoresTemplate {
        current_user: Some(current_user),
        messages,
        title: "Hearted Stores".to_owned(),
        cards,
        page: 1,
        pages: 1,
        count,
        paginated: false,
    }
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_accepts_positive_integers() {
        assert_eq!(parse_page("1"), 1);
        assert_eq!(parse_page("3"), 3);
    }

    #[test]
    fn test_parse_page_defaults_invalid_segments_to_one() {
        assert_eq!(parse_page("abc"), 1);
        assert_eq!(parse_page("-1"), 1);
        assert_eq!(parse_page("0"), 1);
        assert_eq!(parse_page(""), 1);
        assert_eq!(parse_page("1.5"), 1);
    }
}
