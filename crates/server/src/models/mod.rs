//! Domain models for the store directory.

pub mod review;
pub mod session;
pub mod store;
pub mod user;

pub use review::{Review, ReviewWithAuthor};
pub use session::{CurrentUser, session_keys};
pub use store::{Location, Store, StoreDetail, StoreJoin, StoreSummary, TagCount, TopStore};
pub use user::{HeartedUser, User};
