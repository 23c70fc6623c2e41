//! Cache trait definitions.
//!
//! Caches mirror hot lookups of the authorization path. They are an
//! accelerator only: a miss is `Ok(None)`, never an error, and callers fall
//! back to the [`ResourceStore`](crate::repository::ResourceStore). Errors
//! returned here mean the cache itself is unreachable; callers log them and
//! carry on with the store.

use uuid::Uuid;

use crate::error::ThingsResult;
use crate::models::role::GroupRole;
use crate::models::thing::ThingKey;

pub trait ThingCache: Send + Sync {
    /// Map a key to its thing and record the key in the thing's key set.
    fn save(&self, key: &ThingKey, thing_id: Uuid)
    -> impl Future<Output = ThingsResult<()>> + Send;
    fn id(&self, key: &ThingKey) -> impl Future<Output = ThingsResult<Option<Uuid>>> + Send;
    fn remove_key(&self, key: &ThingKey) -> impl Future<Output = ThingsResult<()>> + Send;
    /// Remove every key, internal and external, mapped to the thing.
    fn remove_thing(&self, thing_id: Uuid) -> impl Future<Output = ThingsResult<()>> + Send;

    fn save_group(
        &self,
        thing_id: Uuid,
        group_id: Uuid,
    ) -> impl Future<Output = ThingsResult<()>> + Send;
    fn view_group(&self, thing_id: Uuid)
    -> impl Future<Output = ThingsResult<Option<Uuid>>> + Send;
    fn remove_group(&self, thing_id: Uuid) -> impl Future<Output = ThingsResult<()>> + Send;

    fn save_profile(
        &self,
        thing_id: Uuid,
        profile_id: Uuid,
    ) -> impl Future<Output = ThingsResult<()>> + Send;
    fn view_profile(
        &self,
        thing_id: Uuid,
    ) -> impl Future<Output = ThingsResult<Option<Uuid>>> + Send;
    fn remove_profile(&self, thing_id: Uuid) -> impl Future<Output = ThingsResult<()>> + Send;
}

pub trait ProfileCache: Send + Sync {
    fn save_group(
        &self,
        profile_id: Uuid,
        group_id: Uuid,
    ) -> impl Future<Output = ThingsResult<()>> + Send;
    fn view_group(
        &self,
        profile_id: Uuid,
    ) -> impl Future<Output = ThingsResult<Option<Uuid>>> + Send;
    fn remove_group(&self, profile_id: Uuid) -> impl Future<Output = ThingsResult<()>> + Send;
}

pub trait GroupCache: Send + Sync {
    fn save_org(&self, group_id: Uuid, org_id: Uuid)
    -> impl Future<Output = ThingsResult<()>> + Send;
    fn view_org(&self, group_id: Uuid) -> impl Future<Output = ThingsResult<Option<Uuid>>> + Send;
    fn remove_org(&self, group_id: Uuid) -> impl Future<Output = ThingsResult<()>> + Send;

    fn save_role(
        &self,
        group_id: Uuid,
        member_id: Uuid,
        role: GroupRole,
    ) -> impl Future<Output = ThingsResult<()>> + Send;
    fn view_role(
        &self,
        group_id: Uuid,
        member_id: Uuid,
    ) -> impl Future<Output = ThingsResult<Option<GroupRole>>> + Send;
    fn remove_role(
        &self,
        group_id: Uuid,
        member_id: Uuid,
    ) -> impl Future<Output = ThingsResult<()>> + Send;
    /// Groups the member holds a cached role in.
    fn group_memberships(
        &self,
        member_id: Uuid,
    ) -> impl Future<Output = ThingsResult<Vec<Uuid>>> + Send;

    /// Invalidate everything cached under a deleted group: its things (keys,
    /// group and profile entries), its profiles, its members' roles in the
    /// group, and the group's own entries. Applied as one atomic batch.
    fn remove_group_entities(&self, group_id: Uuid)
    -> impl Future<Output = ThingsResult<()>> + Send;
}

/// The cache layer: one cache per entity type sharing one keyspace.
pub trait CacheLayer: Send + Sync + 'static {
    type Things: ThingCache;
    type Profiles: ProfileCache;
    type Groups: GroupCache;

    fn things(&self) -> &Self::Things;
    fn profiles(&self) -> &Self::Profiles;
    fn groups(&self) -> &Self::Groups;
}
