//! Core types and the analytics engine for Muster exercise reporting.
//!
//! This crate is deliberately free of database and CLI dependencies. Storage
//! backends implement [`store::StorageProvider`]; everything else here is an
//! in-memory join over the records they supply.

pub mod aggregate;
pub mod date_joined;
pub mod error;
pub mod facade;
pub mod history;
pub mod missing;
pub mod record;
pub mod store;
pub mod window;

pub use error::{Error, Result};
pub use facade::Analytics;
