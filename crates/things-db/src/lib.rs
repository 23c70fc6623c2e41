//! Things Database — the SurrealDB-backed store and its repository
//! implementations.
//!
//! This crate provides:
//! - Opening the store from configuration ([`open_store`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Repository implementations for the `things-core` traits, bundled as
//!   a [`SurrealStore`]
//! - Error types ([`DbError`])

mod connection;
mod error;
pub mod repository;
mod schema;
mod store;

pub use connection::{DbConfig, open_store};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};
pub use store::SurrealStore;
