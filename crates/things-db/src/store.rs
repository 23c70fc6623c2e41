//! [`ResourceStore`] backed by a single SurrealDB session.

use surrealdb::{Connection, Surreal};
use things_core::repository::ResourceStore;

use crate::repository::{
    SurrealConnectionRepository, SurrealGroupInviteRepository, SurrealGroupMembershipRepository,
    SurrealGroupRepository, SurrealOrganizationRepository, SurrealProfileRepository,
    SurrealThingRepository,
};

/// Every SurrealDB repository, sharing one client.
#[derive(Clone)]
pub struct SurrealStore<C: Connection> {
    organizations: SurrealOrganizationRepository<C>,
    groups: SurrealGroupRepository<C>,
    profiles: SurrealProfileRepository<C>,
    things: SurrealThingRepository<C>,
    connections: SurrealConnectionRepository<C>,
    memberships: SurrealGroupMembershipRepository<C>,
    invites: SurrealGroupInviteRepository<C>,
}

impl<C: Connection> SurrealStore<C> {
    /// `db` must already have its namespace and database selected.
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            organizations: SurrealOrganizationRepository::new(db.clone()),
            groups: SurrealGroupRepository::new(db.clone()),
            profiles: SurrealProfileRepository::new(db.clone()),
            things: SurrealThingRepository::new(db.clone()),
            connections: SurrealConnectionRepository::new(db.clone()),
            memberships: SurrealGroupMembershipRepository::new(db.clone()),
            invites: SurrealGroupInviteRepository::new(db),
        }
    }
}

impl<C: Connection> ResourceStore for SurrealStore<C> {
    type Organizations = SurrealOrganizationRepository<C>;
    type Groups = SurrealGroupRepository<C>;
    type Profiles = SurrealProfileRepository<C>;
    type Things = SurrealThingRepository<C>;
    type Connections = SurrealConnectionRepository<C>;
    type Memberships = SurrealGroupMembershipRepository<C>;
    type Invites = SurrealGroupInviteRepository<C>;

    fn organizations(&self) -> &Self::Organizations {
        &self.organizations
    }

    fn groups(&self) -> &Self::Groups {
        &self.groups
    }

    fn profiles(&self) -> &Self::Profiles {
        &self.profiles
    }

    fn things(&self) -> &Self::Things {
        &self.things
    }

    fn connections(&self) -> &Self::Connections {
        &self.connections
    }

    fn memberships(&self) -> &Self::Memberships {
        &self.memberships
    }

    fn invites(&self) -> &Self::Invites {
        &self.invites
    }
}
