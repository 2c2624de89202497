//! Core types and trait definitions for the phone directory.
//!
//! This crate is deliberately free of database and file-format
//! dependencies. The department tree, value cleaning, rank inference and the
//! import reconciler all live here; storage backends plug in through
//! [`import::ImportTarget`] and [`store::DirectoryStore`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod clean;
pub mod department;
pub mod employee;
pub mod error;
pub mod import;
pub mod rank;
pub mod store;
pub mod tree;

pub use error::{Error, Result};

#[cfg(test)]
mod testing;
