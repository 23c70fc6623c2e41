//! Domain models for the things service.

pub mod connection;
pub mod group;
pub mod invite;
pub mod membership;
pub mod organization;
pub mod profile;
pub mod role;
pub mod thing;
