//! Database layer (MongoDB).

pub mod mongo;

pub use mongo::Db;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const PLANS: &str = "plans";
    pub const CATEGORIES: &str = "categories";
    pub const PLACES: &str = "places";
    pub const CITIES: &str = "cities";
    pub const BOOKMARKS: &str = "bookmarks";
    /// Raw provider payload cache (keyed by external place id)
    pub const PLACE_PAYLOADS: &str = "google_places";
}
