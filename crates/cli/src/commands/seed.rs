//! Sample data loading command.
//!
//! Reads a JSON array of stores and inserts them through the store service,
//! so the seeded rows get real slugs (suffixed on collision) exactly as
//! user-created stores would.

use secrecy::SecretString;
use serde::Deserialize;
use tracing::info;

use storefinder_core::Email;
use storefinder_server::db;
use storefinder_server::db::users::UserRepository;
use storefinder_server::models::User;
use storefinder_server::services::auth::AuthService;
use storefinder_server::services::stores::{StoreInput, StoreService};

/// One store entry in the seed file.
#[derive(Debug, Deserialize)]
struct SeedStore {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    address: String,
    lng: f64,
    lat: f64,
    #[serde(default)]
    photo: Option<String>,
}

/// Load sample stores from `file_path`, owned by the account behind `email`.
///
/// The account is created with `password` if it doesn't exist. With `clear`
/// set, all stores, reviews, and hearts are deleted first.
///
/// # Errors
///
/// Returns an error if environment variables are missing, the file cannot
/// be read or parsed, or a database operation fails.
pub async fn run(
    file_path: &str,
    email: &str,
    password: &str,
    clear: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("STOREFINDER_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "STOREFINDER_DATABASE_URL not set")?;

    // Parse the file before touching the database
    let content = tokio::fs::read_to_string(file_path).await?;
    let stores: Vec<SeedStore> = serde_json::from_str(&content)?;
    info!(count = stores.len(), "Parsed seed file");

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    if clear {
        sqlx::query("DELETE FROM review").execute(&pool).await?;
        sqlx::query("DELETE FROM user_heart").execute(&pool).await?;
        sqlx::query("DELETE FROM store").execute(&pool).await?;
        info!("Cleared stores, reviews, and hearts");
    }

    let author = find_or_create_author(&pool, email, password).await?;
    info!(user_id = %author.id, "Seeding as {}", author.name);

    let service = StoreService::new(&pool);
    let mut inserted = 0usize;
    for seed in stores {
        let photo = seed.photo;
        let input = StoreInput {
            name: seed.name,
            description: seed.description,
            tags: seed.tags,
            address: seed.address,
            lng: seed.lng,
            lat: seed.lat,
        };

        let store = service.create(author.id, input, photo).await?;
        info!(slug = %store.slug, "Inserted {}", store.name);
        inserted += 1;
    }

    info!("Seeding complete! {inserted} stores inserted");
    Ok(())
}

/// Look up the seed account, registering it if missing.
async fn find_or_create_author(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
) -> Result<User, Box<dyn std::error::Error>> {
    let parsed = Email::parse(email)?;
    let users = UserRepository::new(pool);

    if let Some(user) = users.get_by_email(&parsed).await? {
        return Ok(user);
    }

    let auth = AuthService::new(pool);
    let user = auth
        .register("Store Explorer", email, password, password)
        .await?;
    info!(user_id = %user.id, "Created seed account");

    Ok(user)
}
