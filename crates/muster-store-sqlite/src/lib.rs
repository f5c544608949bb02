//! SQLite backend for the Muster storage provider.
//!
//! Wraps a single [`rusqlite::Connection`]. All access is synchronous.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
