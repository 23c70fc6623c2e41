//! In-process cache backend.
//!
//! A single keyspace of strings, sets and hashes behind one
//! `parking_lot::RwLock`. Every multi-key mutation runs under a single write
//! guard, so readers never observe half of a batch.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use things_core::cache::{CacheLayer, GroupCache, ProfileCache, ThingCache};
use things_core::error::ThingsResult;
use things_core::models::role::GroupRole;
use things_core::models::thing::ThingKey;
use tracing::debug;
use uuid::Uuid;

use crate::error::{CacheError, parse_uuid};
use crate::keys;

#[derive(Debug, Default)]
struct Keyspace {
    strings: HashMap<String, String>,
    sets: HashMap<String, HashSet<String>>,
    hashes: HashMap<String, HashMap<String, String>>,
}

impl Keyspace {
    fn set(&mut self, key: String, value: String) {
        self.strings.insert(key, value);
    }

    fn get(&self, key: &str) -> Option<&String> {
        self.strings.get(key)
    }

    fn del(&mut self, key: &str) {
        self.strings.remove(key);
        self.sets.remove(key);
        self.hashes.remove(key);
    }

    fn sadd(&mut self, key: String, member: String) {
        self.sets.entry(key).or_default().insert(member);
    }

    fn srem(&mut self, key: &str, member: &str) {
        if let Some(set) = self.sets.get_mut(key) {
            set.remove(member);
            if set.is_empty() {
                self.sets.remove(key);
            }
        }
    }

    fn smembers(&self, key: &str) -> Vec<String> {
        self.sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn hset(&mut self, key: String, field: String, value: String) {
        self.hashes.entry(key).or_default().insert(field, value);
    }

    fn hget(&self, key: &str, field: &str) -> Option<&String> {
        self.hashes.get(key).and_then(|h| h.get(field))
    }

    fn hdel(&mut self, key: &str, field: &str) {
        if let Some(hash) = self.hashes.get_mut(key) {
            hash.remove(field);
            if hash.is_empty() {
                self.hashes.remove(key);
            }
        }
    }

    fn hkeys(&self, key: &str) -> Vec<String> {
        self.hashes
            .get(key)
            .map(|h| h.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn is_empty(&self) -> bool {
        self.strings.is_empty() && self.sets.is_empty() && self.hashes.is_empty()
    }

    /// Drop a thing's key mappings and its reverse key set.
    fn purge_thing_keys(&mut self, thing_id: Uuid) {
        let reverse = keys::keys_by_id(thing_id);
        for member in self.smembers(&reverse) {
            self.del(&keys::id_by_key_member(&member));
        }
        self.del(&reverse);
    }

    fn view_uuid(&self, key: &str) -> Result<Option<Uuid>, CacheError> {
        self.get(key).map(|v| parse_uuid(key, v)).transpose()
    }
}

type Shared = Arc<RwLock<Keyspace>>;

/// In-memory [`CacheLayer`]. Clones share the same keyspace.
#[derive(Clone)]
pub struct MemoryCache {
    things: MemoryThingCache,
    profiles: MemoryProfileCache,
    groups: MemoryGroupCache,
}

impl MemoryCache {
    pub fn new() -> Self {
        let keyspace: Shared = Arc::default();
        Self {
            things: MemoryThingCache {
                keyspace: keyspace.clone(),
            },
            profiles: MemoryProfileCache {
                keyspace: keyspace.clone(),
            },
            groups: MemoryGroupCache { keyspace },
        }
    }

    /// Whether no entry of any kind is cached.
    pub fn is_empty(&self) -> bool {
        self.things.keyspace.read().is_empty()
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheLayer for MemoryCache {
    type Things = MemoryThingCache;
    type Profiles = MemoryProfileCache;
    type Groups = MemoryGroupCache;

    fn things(&self) -> &Self::Things {
        &self.things
    }

    fn profiles(&self) -> &Self::Profiles {
        &self.profiles
    }

    fn groups(&self) -> &Self::Groups {
        &self.groups
    }
}

#[derive(Clone)]
pub struct MemoryThingCache {
    keyspace: Shared,
}

impl ThingCache for MemoryThingCache {
    async fn save(&self, key: &ThingKey, thing_id: Uuid) -> ThingsResult<()> {
        let mut ks = self.keyspace.write();
        ks.set(keys::id_by_key(key), thing_id.to_string());
        ks.sadd(keys::keys_by_id(thing_id), keys::key_member(key));
        Ok(())
    }

    async fn id(&self, key: &ThingKey) -> ThingsResult<Option<Uuid>> {
        Ok(self.keyspace.read().view_uuid(&keys::id_by_key(key))?)
    }

    async fn remove_key(&self, key: &ThingKey) -> ThingsResult<()> {
        let mut ks = self.keyspace.write();
        let lookup = keys::id_by_key(key);
        if let Some(thing_id) = ks.view_uuid(&lookup)? {
            ks.srem(&keys::keys_by_id(thing_id), &keys::key_member(key));
        }
        ks.del(&lookup);
        Ok(())
    }

    async fn remove_thing(&self, thing_id: Uuid) -> ThingsResult<()> {
        self.keyspace.write().purge_thing_keys(thing_id);
        Ok(())
    }

    async fn save_group(&self, thing_id: Uuid, group_id: Uuid) -> ThingsResult<()> {
        let mut ks = self.keyspace.write();
        ks.set(keys::group_by_thing(thing_id), group_id.to_string());
        ks.sadd(keys::things_by_group(group_id), thing_id.to_string());
        Ok(())
    }

    async fn view_group(&self, thing_id: Uuid) -> ThingsResult<Option<Uuid>> {
        Ok(self
            .keyspace
            .read()
            .view_uuid(&keys::group_by_thing(thing_id))?)
    }

    async fn remove_group(&self, thing_id: Uuid) -> ThingsResult<()> {
        let mut ks = self.keyspace.write();
        let key = keys::group_by_thing(thing_id);
        if let Some(group_id) = ks.view_uuid(&key)? {
            ks.srem(&keys::things_by_group(group_id), &thing_id.to_string());
        }
        ks.del(&key);
        Ok(())
    }

    async fn save_profile(&self, thing_id: Uuid, profile_id: Uuid) -> ThingsResult<()> {
        self.keyspace
            .write()
            .set(keys::profile_by_thing(thing_id), profile_id.to_string());
        Ok(())
    }

    async fn view_profile(&self, thing_id: Uuid) -> ThingsResult<Option<Uuid>> {
        Ok(self
            .keyspace
            .read()
            .view_uuid(&keys::profile_by_thing(thing_id))?)
    }

    async fn remove_profile(&self, thing_id: Uuid) -> ThingsResult<()> {
        self.keyspace.write().del(&keys::profile_by_thing(thing_id));
        Ok(())
    }
}

#[derive(Clone)]
pub struct MemoryProfileCache {
    keyspace: Shared,
}

impl ProfileCache for MemoryProfileCache {
    async fn save_group(&self, profile_id: Uuid, group_id: Uuid) -> ThingsResult<()> {
        let mut ks = self.keyspace.write();
        ks.set(keys::group_by_profile(profile_id), group_id.to_string());
        ks.sadd(keys::profiles_by_group(group_id), profile_id.to_string());
        Ok(())
    }

    async fn view_group(&self, profile_id: Uuid) -> ThingsResult<Option<Uuid>> {
        Ok(self
            .keyspace
            .read()
            .view_uuid(&keys::group_by_profile(profile_id))?)
    }

    async fn remove_group(&self, profile_id: Uuid) -> ThingsResult<()> {
        let mut ks = self.keyspace.write();
        let key = keys::group_by_profile(profile_id);
        if let Some(group_id) = ks.view_uuid(&key)? {
            ks.srem(&keys::profiles_by_group(group_id), &profile_id.to_string());
        }
        ks.del(&key);
        Ok(())
    }
}

#[derive(Clone)]
pub struct MemoryGroupCache {
    keyspace: Shared,
}

impl GroupCache for MemoryGroupCache {
    async fn save_org(&self, group_id: Uuid, org_id: Uuid) -> ThingsResult<()> {
        self.keyspace
            .write()
            .set(keys::org_by_group(group_id), org_id.to_string());
        Ok(())
    }

    async fn view_org(&self, group_id: Uuid) -> ThingsResult<Option<Uuid>> {
        Ok(self.keyspace.read().view_uuid(&keys::org_by_group(group_id))?)
    }

    async fn remove_org(&self, group_id: Uuid) -> ThingsResult<()> {
        self.keyspace.write().del(&keys::org_by_group(group_id));
        Ok(())
    }

    async fn save_role(&self, group_id: Uuid, member_id: Uuid, role: GroupRole) -> ThingsResult<()> {
        let mut ks = self.keyspace.write();
        ks.hset(
            keys::groups_by_member(member_id),
            group_id.to_string(),
            role.as_str().to_string(),
        );
        ks.sadd(keys::members_by_group(group_id), member_id.to_string());
        Ok(())
    }

    async fn view_role(&self, group_id: Uuid, member_id: Uuid) -> ThingsResult<Option<GroupRole>> {
        let ks = self.keyspace.read();
        let key = keys::groups_by_member(member_id);
        let role = ks
            .hget(&key, &group_id.to_string())
            .map(|r| r.parse::<GroupRole>().map_err(|e| CacheError::decode(&key, e)))
            .transpose()?;
        Ok(role)
    }

    async fn remove_role(&self, group_id: Uuid, member_id: Uuid) -> ThingsResult<()> {
        let mut ks = self.keyspace.write();
        ks.hdel(&keys::groups_by_member(member_id), &group_id.to_string());
        ks.srem(&keys::members_by_group(group_id), &member_id.to_string());
        Ok(())
    }

    async fn group_memberships(&self, member_id: Uuid) -> ThingsResult<Vec<Uuid>> {
        let ks = self.keyspace.read();
        let key = keys::groups_by_member(member_id);
        let groups = ks
            .hkeys(&key)
            .iter()
            .map(|g| parse_uuid(&key, g))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(groups)
    }

    async fn remove_group_entities(&self, group_id: Uuid) -> ThingsResult<()> {
        let mut ks = self.keyspace.write();
        let group = group_id.to_string();

        let things_key = keys::things_by_group(group_id);
        let profiles_key = keys::profiles_by_group(group_id);
        let members_key = keys::members_by_group(group_id);

        // Decode everything before the first mutation.
        let decode = |ks: &Keyspace, key: &str| -> Result<Vec<Uuid>, CacheError> {
            ks.smembers(key).iter().map(|m| parse_uuid(key, m)).collect()
        };
        let things = decode(&ks, &things_key)?;
        let profiles = decode(&ks, &profiles_key)?;
        let members = decode(&ks, &members_key)?;

        for &thing_id in &things {
            ks.purge_thing_keys(thing_id);
            ks.del(&keys::group_by_thing(thing_id));
            ks.del(&keys::profile_by_thing(thing_id));
        }
        for &profile_id in &profiles {
            ks.del(&keys::group_by_profile(profile_id));
        }
        for &member_id in &members {
            ks.hdel(&keys::groups_by_member(member_id), &group);
        }

        ks.del(&things_key);
        ks.del(&profiles_key);
        ks.del(&members_key);
        ks.del(&keys::org_by_group(group_id));

        debug!(
            %group_id,
            things = things.len(),
            profiles = profiles.len(),
            members = members.len(),
            "Invalidated cached group entities"
        );
        Ok(())
    }
}
