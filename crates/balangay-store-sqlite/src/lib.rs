//! SQLite backend for the Balangay registry store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. Multi-entity writes (the
//! cascading registration, history-capturing updates, dispensing) run inside
//! a single `rusqlite` transaction on that thread.

mod encode;
mod error;
mod registration;
mod schema;
mod store;

pub use store::SqliteStore;

#[cfg(test)]
mod tests;
