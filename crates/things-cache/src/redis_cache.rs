//! Redis cache backend.
//!
//! Reads are single commands. Writes touching more than one key go through a
//! `MULTI/EXEC` pipeline so the forward entry and its reverse index change
//! together.

use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use things_core::cache::{CacheLayer, GroupCache, ProfileCache, ThingCache};
use things_core::error::ThingsResult;
use things_core::models::role::GroupRole;
use things_core::models::thing::ThingKey;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{CacheError, parse_uuid};
use crate::keys;

/// Redis-backed [`CacheLayer`]. Clones share one multiplexed connection.
#[derive(Clone)]
pub struct RedisCache {
    things: RedisThingCache,
    profiles: RedisProfileCache,
    groups: RedisGroupCache,
}

impl RedisCache {
    /// Open a managed connection to `url` (e.g. `redis://127.0.0.1:6379/0`).
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        info!(%url, "Connecting to Redis cache");
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self::with_connection(conn))
    }

    pub fn with_connection(conn: ConnectionManager) -> Self {
        Self {
            things: RedisThingCache { conn: conn.clone() },
            profiles: RedisProfileCache { conn: conn.clone() },
            groups: RedisGroupCache { conn },
        }
    }
}

impl CacheLayer for RedisCache {
    type Things = RedisThingCache;
    type Profiles = RedisProfileCache;
    type Groups = RedisGroupCache;

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

async fn view_uuid(conn: &mut ConnectionManager, key: &str) -> Result<Option<Uuid>, CacheError> {
    let value: Option<String> = conn.get(key).await?;
    value.map(|v| parse_uuid(key, &v)).transpose()
}

async fn uuid_members(conn: &mut ConnectionManager, key: &str) -> Result<Vec<Uuid>, CacheError> {
    let members: Vec<String> = conn.smembers(key).await?;
    members.iter().map(|m| parse_uuid(key, m)).collect()
}

#[derive(Clone)]
pub struct RedisThingCache {
    conn: ConnectionManager,
}

impl ThingCache for RedisThingCache {
    async fn save(&self, key: &ThingKey, thing_id: Uuid) -> ThingsResult<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .atomic()
            .set(keys::id_by_key(key), thing_id.to_string())
            .ignore()
            .sadd(keys::keys_by_id(thing_id), keys::key_member(key))
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(CacheError::from)?;
        Ok(())
    }

    async fn id(&self, key: &ThingKey) -> ThingsResult<Option<Uuid>> {
        let mut conn = self.conn.clone();
        Ok(view_uuid(&mut conn, &keys::id_by_key(key)).await?)
    }

    async fn remove_key(&self, key: &ThingKey) -> ThingsResult<()> {
        let mut conn = self.conn.clone();
        let lookup = keys::id_by_key(key);

        let mut pipe = redis::pipe();
        pipe.atomic().del(&lookup).ignore();
        if let Some(thing_id) = view_uuid(&mut conn, &lookup).await? {
            pipe.srem(keys::keys_by_id(thing_id), keys::key_member(key))
                .ignore();
        }
        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(CacheError::from)?;
        Ok(())
    }

    async fn remove_thing(&self, thing_id: Uuid) -> ThingsResult<()> {
        let mut conn = self.conn.clone();
        let reverse = keys::keys_by_id(thing_id);
        let members: Vec<String> = conn.smembers(&reverse).await.map_err(CacheError::from)?;

        let mut pipe = redis::pipe();
        pipe.atomic();
        for member in &members {
            pipe.del(keys::id_by_key_member(member)).ignore();
        }
        pipe.del(&reverse).ignore();
        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(CacheError::from)?;
        Ok(())
    }

    async fn save_group(&self, thing_id: Uuid, group_id: Uuid) -> ThingsResult<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .atomic()
            .set(keys::group_by_thing(thing_id), group_id.to_string())
            .ignore()
            .sadd(keys::things_by_group(group_id), thing_id.to_string())
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(CacheError::from)?;
        Ok(())
    }

    async fn view_group(&self, thing_id: Uuid) -> ThingsResult<Option<Uuid>> {
        let mut conn = self.conn.clone();
        Ok(view_uuid(&mut conn, &keys::group_by_thing(thing_id)).await?)
    }

    async fn remove_group(&self, thing_id: Uuid) -> ThingsResult<()> {
        let mut conn = self.conn.clone();
        let key = keys::group_by_thing(thing_id);

        let mut pipe = redis::pipe();
        pipe.atomic().del(&key).ignore();
        if let Some(group_id) = view_uuid(&mut conn, &key).await? {
            pipe.srem(keys::things_by_group(group_id), thing_id.to_string())
                .ignore();
        }
        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(CacheError::from)?;
        Ok(())
    }

    async fn save_profile(&self, thing_id: Uuid, profile_id: Uuid) -> ThingsResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set(keys::profile_by_thing(thing_id), profile_id.to_string())
            .await
            .map_err(CacheError::from)?;
        Ok(())
    }

    async fn view_profile(&self, thing_id: Uuid) -> ThingsResult<Option<Uuid>> {
        let mut conn = self.conn.clone();
        Ok(view_uuid(&mut conn, &keys::profile_by_thing(thing_id)).await?)
    }

    async fn remove_profile(&self, thing_id: Uuid) -> ThingsResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(keys::profile_by_thing(thing_id))
            .await
            .map_err(CacheError::from)?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct RedisProfileCache {
    conn: ConnectionManager,
}

impl ProfileCache for RedisProfileCache {
    async fn save_group(&self, profile_id: Uuid, group_id: Uuid) -> ThingsResult<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .atomic()
            .set(keys::group_by_profile(profile_id), group_id.to_string())
            .ignore()
            .sadd(keys::profiles_by_group(group_id), profile_id.to_string())
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(CacheError::from)?;
        Ok(())
    }

    async fn view_group(&self, profile_id: Uuid) -> ThingsResult<Option<Uuid>> {
        let mut conn = self.conn.clone();
        Ok(view_uuid(&mut conn, &keys::group_by_profile(profile_id)).await?)
    }

    async fn remove_group(&self, profile_id: Uuid) -> ThingsResult<()> {
        let mut conn = self.conn.clone();
        let key = keys::group_by_profile(profile_id);

        let mut pipe = redis::pipe();
        pipe.atomic().del(&key).ignore();
        if let Some(group_id) = view_uuid(&mut conn, &key).await? {
            pipe.srem(keys::profiles_by_group(group_id), profile_id.to_string())
                .ignore();
        }
        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(CacheError::from)?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct RedisGroupCache {
    conn: ConnectionManager,
}

impl GroupCache for RedisGroupCache {
    async fn save_org(&self, group_id: Uuid, org_id: Uuid) -> ThingsResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set(keys::org_by_group(group_id), org_id.to_string())
            .await
            .map_err(CacheError::from)?;
        Ok(())
    }

    async fn view_org(&self, group_id: Uuid) -> ThingsResult<Option<Uuid>> {
        let mut conn = self.conn.clone();
        Ok(view_uuid(&mut conn, &keys::org_by_group(group_id)).await?)
    }

    async fn remove_org(&self, group_id: Uuid) -> ThingsResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(keys::org_by_group(group_id))
            .await
            .map_err(CacheError::from)?;
        Ok(())
    }

    async fn save_role(&self, group_id: Uuid, member_id: Uuid, role: GroupRole) -> ThingsResult<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .atomic()
            .hset(
                keys::groups_by_member(member_id),
                group_id.to_string(),
                role.as_str(),
            )
            .ignore()
            .sadd(keys::members_by_group(group_id), member_id.to_string())
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(CacheError::from)?;
        Ok(())
    }

    async fn view_role(&self, group_id: Uuid, member_id: Uuid) -> ThingsResult<Option<GroupRole>> {
        let mut conn = self.conn.clone();
        let key = keys::groups_by_member(member_id);
        let role: Option<String> = conn
            .hget(&key, group_id.to_string())
            .await
            .map_err(CacheError::from)?;
        Ok(role
            .map(|r| r.parse::<GroupRole>().map_err(|e| CacheError::decode(&key, e)))
            .transpose()?)
    }

    async fn remove_role(&self, group_id: Uuid, member_id: Uuid) -> ThingsResult<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .atomic()
            .hdel(keys::groups_by_member(member_id), group_id.to_string())
            .ignore()
            .srem(keys::members_by_group(group_id), member_id.to_string())
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(CacheError::from)?;
        Ok(())
    }

    async fn group_memberships(&self, member_id: Uuid) -> ThingsResult<Vec<Uuid>> {
        let mut conn = self.conn.clone();
        let key = keys::groups_by_member(member_id);
        let groups: Vec<String> = conn.hkeys(&key).await.map_err(CacheError::from)?;
        Ok(groups
            .iter()
            .map(|g| parse_uuid(&key, g))
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn remove_group_entities(&self, group_id: Uuid) -> ThingsResult<()> {
        let mut conn = self.conn.clone();
        let group = group_id.to_string();

        let things_key = keys::things_by_group(group_id);
        let profiles_key = keys::profiles_by_group(group_id);
        let members_key = keys::members_by_group(group_id);

        let things = uuid_members(&mut conn, &things_key).await?;
        let profiles = uuid_members(&mut conn, &profiles_key).await?;
        let members = uuid_members(&mut conn, &members_key).await?;

        let mut thing_keys = Vec::new();
        for &thing_id in &things {
            let reverse: Vec<String> = conn
                .smembers(keys::keys_by_id(thing_id))
                .await
                .map_err(CacheError::from)?;
            thing_keys.extend(reverse.iter().map(|m| keys::id_by_key_member(m)));
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for key in &thing_keys {
            pipe.del(key).ignore();
        }
        for &thing_id in &things {
            pipe.del(keys::keys_by_id(thing_id))
                .ignore()
                .del(keys::group_by_thing(thing_id))
                .ignore()
                .del(keys::profile_by_thing(thing_id))
                .ignore();
        }
        for &profile_id in &profiles {
            pipe.del(keys::group_by_profile(profile_id)).ignore();
        }
        for &member_id in &members {
            pipe.hdel(keys::groups_by_member(member_id), &group).ignore();
        }
        pipe.del(&things_key)
            .ignore()
            .del(&profiles_key)
            .ignore()
            .del(&members_key)
            .ignore()
            .del(keys::org_by_group(group_id))
            .ignore();

        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(CacheError::from)?;

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
