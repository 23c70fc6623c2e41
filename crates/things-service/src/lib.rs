//! Things Service — authorization, connections, invites and resource
//! lifecycle on top of the `things-core` store, cache and identity traits.
//!
//! - [`AuthorizationEngine`]: role and ownership decisions
//! - [`ConnectionManager`]: thing to profile wiring
//! - [`InviteCoordinator`]: group invites and their activation
//! - [`ThingsService`]: the [`Service`] surface transports call
//! - [`EventingService`]: publishes domain events after mutations
//! - [`DeadlineService`]: bounds every operation by a deadline

mod authz;
mod config;
mod connections;
mod deadline;
pub mod events;
mod invites;
mod lookup;
mod service;

pub use authz::AuthorizationEngine;
pub use config::ServiceConfig;
pub use connections::ConnectionManager;
pub use deadline::{DeadlineService, with_deadline};
pub use events::{Event, EventingService, EventsBackend, EventsConfig};
pub use invites::InviteCoordinator;
pub use lookup::Lookup;
pub use service::{Service, ThingsService};
