//! Core types and trait definitions for the Balangay civil registry.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod address;
pub mod business;
pub mod error;
pub mod history;
pub mod household;
pub mod ids;
pub mod medicine;
pub mod notify;
pub mod person;
pub mod registration;
pub mod resident;
pub mod staff;
pub mod storage;
pub mod store;
pub mod sync;

pub use error::{Error, Result};
