//! SQLite backend for the Lineage catalog.
//!
//! Every template, instance and relationship definition is kept as one JSON
//! document keyed by `(tenant_id, external_id)`. Wraps [`tokio_rusqlite`] so
//! all database access runs on a dedicated thread without blocking the async
//! runtime.

mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
