//! Core types and rules for the Canefield harvest ledger.
//!
//! This crate performs no I/O. Persistence and the optional mirror are
//! described by the [`store::LedgerStore`] and [`mirror::Mirror`] traits
//! and implemented by the store crates.

// Native `async fn` in traits; the `Mirror` trait spells out `Send` bounds
// on its futures explicitly.
#![allow(async_fn_in_trait)]

pub mod analytics;
pub mod document;
pub mod error;
pub mod farm;
pub mod harvest;
pub mod ledger;
pub mod mirror;
pub mod recommend;
pub mod reference;
pub mod registry;
pub mod store;
pub mod validate;

pub use error::{Error, ErrorKind, Result};

#[cfg(test)]
mod tests;
