//! Things Core — domain models, error taxonomy, and the storage, cache and
//! identity abstractions shared by every other crate.
//!
//! Backends live elsewhere: SurrealDB repositories in `things-db`, cache
//! backends in `things-cache`, token identity in `things-auth`.

pub mod cache;
pub mod error;
pub mod identity;
pub mod models;
pub mod repository;

pub use error::{ThingsError, ThingsResult};
