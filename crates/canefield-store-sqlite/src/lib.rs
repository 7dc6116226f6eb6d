//! SQLite mirror for the Canefield ledger.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The mirror is a secondary copy: the
//! JSON store remains the primary record.

mod encode;
mod mirror;
mod schema;

pub mod error;

pub use error::{Error, Result};
pub use mirror::SqliteMirror;

#[cfg(test)]
mod tests;
