//! Tests for the in-memory cache backend.

mod common;

use std::sync::Arc;

use things_cache::MemoryCache;
use things_core::cache::{CacheLayer, GroupCache, ThingCache};
use things_core::models::role::GroupRole;
use things_core::models::thing::ThingKey;
use uuid::Uuid;

#[tokio::test]
async fn key_lookup_and_removal() {
    common::key_lookup_and_removal(&MemoryCache::new()).await;
}

#[tokio::test]
async fn ancestry_entries() {
    common::ancestry_entries(&MemoryCache::new()).await;
}

#[tokio::test]
async fn roles_and_memberships() {
    common::roles_and_memberships(&MemoryCache::new()).await;
}

#[tokio::test]
async fn group_cascade_clears_every_derived_entry() {
    common::group_cascade_clears_every_derived_entry(&MemoryCache::new()).await;
}

#[tokio::test]
async fn cascade_leaves_no_residue() {
    let cache = MemoryCache::new();
    let (group, thing, member) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    cache.things().save(&ThingKey::internal("k1"), thing).await.unwrap();
    cache.things().save_group(thing, group).await.unwrap();
    cache.groups().save_org(group, Uuid::new_v4()).await.unwrap();
    cache
        .groups()
        .save_role(group, member, GroupRole::Owner)
        .await
        .unwrap();

    cache.groups().remove_group_entities(group).await.unwrap();
    assert!(cache.is_empty());
}

#[tokio::test]
async fn clones_share_one_keyspace() {
    let cache = MemoryCache::new();
    let clone = cache.clone();
    let thing = Uuid::new_v4();

    cache.things().save(&ThingKey::internal("k1"), thing).await.unwrap();
    assert_eq!(
        clone.things().id(&ThingKey::internal("k1")).await.unwrap(),
        Some(thing)
    );
}

#[tokio::test]
async fn concurrent_saves_and_cascade_stay_consistent() {
    let cache = Arc::new(MemoryCache::new());
    let group = Uuid::new_v4();

    let mut handles = Vec::new();
    for i in 0..16 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            let thing = Uuid::new_v4();
            cache
                .things()
                .save(&ThingKey::internal(format!("k{i}")), thing)
                .await
                .unwrap();
            cache.things().save_group(thing, group).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    cache.groups().remove_group_entities(group).await.unwrap();
    for i in 0..16 {
        assert_eq!(
            cache
                .things()
                .id(&ThingKey::internal(format!("k{i}")))
                .await
                .unwrap(),
            None
        );
    }
    assert!(cache.is_empty());
}
