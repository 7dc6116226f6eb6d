//! JSON file backend for the Canefield ledger.
//!
//! Farms and harvest records live in two pretty-printed files inside one
//! data directory. Writes go through a temporary file and a rename so a
//! crash never leaves a half-written collection behind.

mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{FARMS_FILE, FileStatus, HARVESTS_FILE, IntegrityReport, JsonStore};
