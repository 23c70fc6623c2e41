//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. The store is authoritative: caches
//! are populated from it and revalidated against it.

use uuid::Uuid;

use crate::error::ThingsResult;
use crate::models::{
    connection::Connection,
    group::{CreateGroup, Group, UpdateGroup},
    invite::{CreateGroupInvite, GroupInvite, InviteState},
    membership::GroupMembership,
    organization::{CreateOrganization, Organization},
    profile::{CreateProfile, Profile},
    role::GroupRole,
    thing::{CreateThing, Thing, ThingKey},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Resource hierarchy
// ---------------------------------------------------------------------------

pub trait OrganizationRepository: Send + Sync {
    fn create(
        &self,
        input: CreateOrganization,
    ) -> impl Future<Output = ThingsResult<Organization>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ThingsResult<Organization>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = ThingsResult<()>> + Send;
}

pub trait GroupRepository: Send + Sync {
    fn create(&self, input: CreateGroup) -> impl Future<Output = ThingsResult<Group>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ThingsResult<Group>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateGroup,
    ) -> impl Future<Output = ThingsResult<Group>> + Send;
    /// Delete the group together with everything it owns: profiles, things,
    /// connections, memberships, invites and dormant invite links.
    /// Deleting a missing group is a no-op.
    fn delete(&self, id: Uuid) -> impl Future<Output = ThingsResult<()>> + Send;
    fn list_by_org(
        &self,
        org_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = ThingsResult<PaginatedResult<Group>>> + Send;
}

pub trait ProfileRepository: Send + Sync {
    fn create(&self, input: CreateProfile) -> impl Future<Output = ThingsResult<Profile>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ThingsResult<Profile>> + Send;
    /// Delete the profile and its connections in one step, returning the
    /// connections that were removed.
    fn delete(&self, id: Uuid) -> impl Future<Output = ThingsResult<Vec<Connection>>> + Send;
}

pub trait ThingRepository: Send + Sync {
    /// Fails with `Conflict` when any of the thing's keys is already taken,
    /// including by a thing created concurrently.
    fn create(&self, input: CreateThing) -> impl Future<Output = ThingsResult<Thing>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ThingsResult<Thing>> + Send;
    fn get_by_key(&self, key: &ThingKey) -> impl Future<Output = ThingsResult<Thing>> + Send;
    /// Delete the thing, its keys and its connection.
    fn delete(&self, id: Uuid) -> impl Future<Output = ThingsResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

pub trait ConnectionRepository: Send + Sync {
    /// Record that `thing_id` publishes through `profile_id`.
    ///
    /// A thing holds at most one connection; a second connect for the same
    /// thing fails with `Conflict`, whichever profile it names.
    fn connect(
        &self,
        group_id: Uuid,
        profile_id: Uuid,
        thing_id: Uuid,
    ) -> impl Future<Output = ThingsResult<Connection>> + Send;
    /// Fails with `NotFound` unless `thing_id` is connected to `profile_id`.
    fn disconnect(
        &self,
        profile_id: Uuid,
        thing_id: Uuid,
    ) -> impl Future<Output = ThingsResult<()>> + Send;
    fn retrieve_by_thing(
        &self,
        thing_id: Uuid,
    ) -> impl Future<Output = ThingsResult<Connection>> + Send;
}

// ---------------------------------------------------------------------------
// Membership
// ---------------------------------------------------------------------------

pub trait GroupMembershipRepository: Send + Sync {
    /// Fails with `Conflict` if the member already belongs to the group.
    fn save(
        &self,
        membership: GroupMembership,
    ) -> impl Future<Output = ThingsResult<GroupMembership>> + Send;
    fn get(
        &self,
        group_id: Uuid,
        member_id: Uuid,
    ) -> impl Future<Output = ThingsResult<GroupMembership>> + Send;
    fn update_role(
        &self,
        group_id: Uuid,
        member_id: Uuid,
        role: GroupRole,
    ) -> impl Future<Output = ThingsResult<GroupMembership>> + Send;
    /// Fails with `NotFound` if the member does not belong to the group.
    fn remove(
        &self,
        group_id: Uuid,
        member_id: Uuid,
    ) -> impl Future<Output = ThingsResult<()>> + Send;
    fn list_by_group(
        &self,
        group_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = ThingsResult<PaginatedResult<GroupMembership>>> + Send;
}

// ---------------------------------------------------------------------------
// Invites
// ---------------------------------------------------------------------------

pub trait GroupInviteRepository: Send + Sync {
    /// Fails with `Conflict` while another pending invite from the same
    /// inviter in the same group addresses the same invitee id or email.
    /// Pending invites past their deadline still count until they are
    /// moved to `Expired`.
    fn create(
        &self,
        input: CreateGroupInvite,
    ) -> impl Future<Output = ThingsResult<GroupInvite>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ThingsResult<GroupInvite>> + Send;
    /// Pending invites (expired or not) from `inviter_id` in `group_id` that
    /// address `invitee_id` or `invitee_email`.
    fn find_pending(
        &self,
        group_id: Uuid,
        inviter_id: Uuid,
        invitee_id: Option<Uuid>,
        invitee_email: &str,
    ) -> impl Future<Output = ThingsResult<Vec<GroupInvite>>> + Send;
    /// Compare-and-set on the invite state. Returns `false` when the stored
    /// state was not `from`. Leaving `Pending` releases the invite's claim
    /// under the duplicate rule.
    fn transition(
        &self,
        id: Uuid,
        from: InviteState,
        to: InviteState,
    ) -> impl Future<Output = ThingsResult<bool>> + Send;
    /// Bind an email-only invite to a registered user.
    fn bind_invitee(
        &self,
        id: Uuid,
        invitee_id: Uuid,
    ) -> impl Future<Output = ThingsResult<()>> + Send;
    fn list_by_invitee(
        &self,
        invitee_id: Uuid,
    ) -> impl Future<Output = ThingsResult<Vec<GroupInvite>>> + Send;

    /// Create one pending invite per input, each linked to the organization
    /// invite. Either every invite is created or none is; the duplicate
    /// rule of [`create`](Self::create) applies to each.
    fn create_dormant(
        &self,
        org_invite_id: Uuid,
        inputs: Vec<CreateGroupInvite>,
    ) -> impl Future<Output = ThingsResult<Vec<GroupInvite>>> + Send;
    /// Every group invite linked to `org_invite_id`, in any state.
    fn list_dormant(
        &self,
        org_invite_id: Uuid,
    ) -> impl Future<Output = ThingsResult<Vec<GroupInvite>>> + Send;
    /// The organization invite an invite is linked to, if any.
    fn dormant_origin(
        &self,
        invite_id: Uuid,
    ) -> impl Future<Output = ThingsResult<Option<Uuid>>> + Send;
}

// ---------------------------------------------------------------------------
// Store bundle
// ---------------------------------------------------------------------------

/// The authoritative store: one repository per entity type.
///
/// Services are generic over a single `ResourceStore` rather than over each
/// repository, so backends are swapped as a unit at process start.
pub trait ResourceStore: Send + Sync + 'static {
    type Organizations: OrganizationRepository;
    type Groups: GroupRepository;
    type Profiles: ProfileRepository;
    type Things: ThingRepository;
    type Connections: ConnectionRepository;
    type Memberships: GroupMembershipRepository;
    type Invites: GroupInviteRepository;

    fn organizations(&self) -> &Self::Organizations;
    fn groups(&self) -> &Self::Groups;
    fn profiles(&self) -> &Self::Profiles;
    fn things(&self) -> &Self::Things;
    fn connections(&self) -> &Self::Connections;
    fn memberships(&self) -> &Self::Memberships;
    fn invites(&self) -> &Self::Invites;
}
