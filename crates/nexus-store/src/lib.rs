pub mod comments;
pub mod database;
pub mod error;
pub mod feedback_store;
pub mod row_helpers;
pub mod schema;
pub mod seed;
pub mod tickets;
pub mod users;

pub use database::Database;
pub use error::StoreError;
pub use feedback_store::SqliteStore;
