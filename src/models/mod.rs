//! Data models
//!
//! Rust structs representing database entities.

mod history;
mod nutrition;
mod order;
mod profile;

pub use history::{EntrySource, HistoryCreate, HistoryRecord};
pub use nutrition::Nutrition;
pub use order::{
    filter_by_date, normalize_platform, paginate, sort_newest_first, Order, OrderCreate,
    OrderPage, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use profile::{ProfileUpsert, UserProfile, MIN_BIRTH_YEAR};
