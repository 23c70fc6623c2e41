//! Write-through, invalidation and cache-failure behaviour.

mod common;

use std::sync::Arc;

use common::{Harness, add_member, org_with_group, profile_in, thing_in, token};
use things_core::ThingsError;
use things_core::cache::{CacheLayer, GroupCache, ProfileCache, ThingCache};
use things_core::error::ThingsResult;
use things_core::models::role::{Action, GroupRole};
use things_core::models::thing::ThingKey;
use things_service::{Service, ServiceConfig};
use uuid::Uuid;

#[tokio::test]
async fn creates_write_through_to_the_cache() {
    let h = Harness::new().await;
    let owner = Uuid::new_v4();
    let (org, group) = org_with_group(&h.service, owner).await;
    let thing = thing_in(&h.service, owner, group.id, vec!["ext-wt".into()]).await;
    let profile = profile_in(&h.service, owner, group.id).await;

    let things = h.cache.things();
    assert_eq!(
        things.id(&ThingKey::internal(thing.key.clone())).await.unwrap(),
        Some(thing.id)
    );
    assert_eq!(
        things.id(&ThingKey::external("ext-wt")).await.unwrap(),
        Some(thing.id)
    );
    assert_eq!(things.view_group(thing.id).await.unwrap(), Some(group.id));
    assert_eq!(
        h.cache.profiles().view_group(profile.id).await.unwrap(),
        Some(group.id)
    );
    assert_eq!(
        h.cache.groups().view_org(group.id).await.unwrap(),
        Some(org.id)
    );
    assert_eq!(
        h.cache.groups().view_role(group.id, owner).await.unwrap(),
        Some(GroupRole::Owner)
    );
}

#[tokio::test]
async fn misses_are_filled_from_the_store() {
    let h = Harness::new().await;
    let owner = Uuid::new_v4();
    let (_, group) = org_with_group(&h.service, owner).await;
    let thing = thing_in(&h.service, owner, group.id, vec![]).await;
    let key = ThingKey::internal(thing.key.clone());

    h.cache.things().remove_thing(thing.id).await.unwrap();
    h.cache.things().remove_group(thing.id).await.unwrap();

    assert_eq!(h.service.identify(&key).await.unwrap(), thing.id);
    assert_eq!(h.cache.things().id(&key).await.unwrap(), Some(thing.id));
    assert_eq!(
        h.cache.things().view_group(thing.id).await.unwrap(),
        Some(group.id)
    );
}

#[tokio::test]
async fn removing_a_thing_invalidates_every_key() {
    let h = Harness::new().await;
    let owner = Uuid::new_v4();
    let (_, group) = org_with_group(&h.service, owner).await;
    let thing = thing_in(&h.service, owner, group.id, vec!["ext-a".into(), "ext-b".into()]).await;
    let profile = profile_in(&h.service, owner, group.id).await;
    h.service
        .connect(&token(owner), profile.id, &[thing.id])
        .await
        .unwrap();

    h.service
        .remove_thing(&token(owner), thing.id)
        .await
        .unwrap();

    for key in thing.keys() {
        assert_eq!(h.cache.things().id(&key).await.unwrap(), None, "{key}");
        let err = h.service.identify(&key).await.unwrap_err();
        assert!(matches!(err, ThingsError::AuthenticationFailed { .. }));
    }
    assert_eq!(h.cache.things().view_group(thing.id).await.unwrap(), None);
    assert_eq!(h.cache.things().view_profile(thing.id).await.unwrap(), None);
}

#[tokio::test]
async fn removing_a_group_cascades_through_store_and_cache() {
    let h = Harness::new().await;
    let owner = Uuid::new_v4();
    let member = Uuid::new_v4();
    let (org, group) = org_with_group(&h.service, owner).await;
    let keep = common::group_in(&h.service, owner, org.id).await;
    let thing = thing_in(&h.service, owner, group.id, vec!["ext-gone".into()]).await;
    let profile = profile_in(&h.service, owner, group.id).await;
    add_member(&h.service, owner, group.id, member, GroupRole::Editor).await;
    add_member(&h.service, owner, keep.id, member, GroupRole::Viewer).await;
    let tok = token(owner);
    h.service.connect(&tok, profile.id, &[thing.id]).await.unwrap();

    h.service.remove_group(&tok, group.id).await.unwrap();

    // Store side.
    assert!(h.service.view_group(&tok, group.id).await.unwrap_err().is_not_found());
    assert!(h.service.view_thing(&tok, thing.id).await.unwrap_err().is_not_found());
    assert!(
        h.service
            .view_profile(&tok, profile.id)
            .await
            .unwrap_err()
            .is_not_found()
    );

    // Cache side.
    for key in thing.keys() {
        assert_eq!(h.cache.things().id(&key).await.unwrap(), None);
    }
    assert_eq!(h.cache.things().view_group(thing.id).await.unwrap(), None);
    assert_eq!(h.cache.things().view_profile(thing.id).await.unwrap(), None);
    assert_eq!(h.cache.profiles().view_group(profile.id).await.unwrap(), None);
    assert_eq!(h.cache.groups().view_org(group.id).await.unwrap(), None);
    assert_eq!(h.cache.groups().view_role(group.id, member).await.unwrap(), None);

    // The member's role elsewhere survives.
    assert_eq!(
        h.cache.groups().group_memberships(member).await.unwrap(),
        vec![keep.id]
    );
}

#[tokio::test]
async fn removing_an_organization_leaves_nothing_cached() {
    let h = Harness::new().await;
    let owner = Uuid::new_v4();
    let (org, group) = org_with_group(&h.service, owner).await;
    let second = common::group_in(&h.service, owner, org.id).await;
    for g in [group.id, second.id] {
        let thing = thing_in(&h.service, owner, g, vec![]).await;
        let profile = profile_in(&h.service, owner, g).await;
        h.service
            .connect(&token(owner), profile.id, &[thing.id])
            .await
            .unwrap();
        add_member(&h.service, owner, g, Uuid::new_v4(), GroupRole::Viewer).await;
    }
    assert!(!h.cache.is_empty());

    h.service
        .remove_organization(&token(owner), org.id)
        .await
        .unwrap();

    assert!(h.cache.is_empty());
    let err = h
        .service
        .can_user_access_group(&token(owner), group.id, Action::Read)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn only_the_owner_removes_an_organization() {
    let h = Harness::new().await;
    let owner = Uuid::new_v4();
    let editor = Uuid::new_v4();
    let (org, group) = org_with_group(&h.service, owner).await;
    add_member(&h.service, owner, group.id, editor, GroupRole::Editor).await;

    let err = h
        .service
        .remove_organization(&token(editor), org.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ThingsError::AuthorizationDenied { .. }));
    h.service.view_group(&token(editor), group.id).await.unwrap();
}

/// A cache whose backend is unreachable.
struct BrokenCache;

fn down<T>() -> ThingsResult<T> {
    Err(ThingsError::Cache("connection refused".into()))
}

impl ThingCache for BrokenCache {
    async fn save(&self, _: &ThingKey, _: Uuid) -> ThingsResult<()> {
        down()
    }
    async fn id(&self, _: &ThingKey) -> ThingsResult<Option<Uuid>> {
        down()
    }
    async fn remove_key(&self, _: &ThingKey) -> ThingsResult<()> {
        down()
    }
    async fn remove_thing(&self, _: Uuid) -> ThingsResult<()> {
        down()
    }
    async fn save_group(&self, _: Uuid, _: Uuid) -> ThingsResult<()> {
        down()
    }
    async fn view_group(&self, _: Uuid) -> ThingsResult<Option<Uuid>> {
        down()
    }
    async fn remove_group(&self, _: Uuid) -> ThingsResult<()> {
        down()
    }
    async fn save_profile(&self, _: Uuid, _: Uuid) -> ThingsResult<()> {
        down()
    }
    async fn view_profile(&self, _: Uuid) -> ThingsResult<Option<Uuid>> {
        down()
    }
    async fn remove_profile(&self, _: Uuid) -> ThingsResult<()> {
        down()
    }
}

impl ProfileCache for BrokenCache {
    async fn save_group(&self, _: Uuid, _: Uuid) -> ThingsResult<()> {
        down()
    }
    async fn view_group(&self, _: Uuid) -> ThingsResult<Option<Uuid>> {
        down()
    }
    async fn remove_group(&self, _: Uuid) -> ThingsResult<()> {
        down()
    }
}

impl GroupCache for BrokenCache {
    async fn save_org(&self, _: Uuid, _: Uuid) -> ThingsResult<()> {
        down()
    }
    async fn view_org(&self, _: Uuid) -> ThingsResult<Option<Uuid>> {
        down()
    }
    async fn remove_org(&self, _: Uuid) -> ThingsResult<()> {
        down()
    }
    async fn save_role(&self, _: Uuid, _: Uuid, _: GroupRole) -> ThingsResult<()> {
        down()
    }
    async fn view_role(&self, _: Uuid, _: Uuid) -> ThingsResult<Option<GroupRole>> {
        down()
    }
    async fn remove_role(&self, _: Uuid, _: Uuid) -> ThingsResult<()> {
        down()
    }
    async fn group_memberships(&self, _: Uuid) -> ThingsResult<Vec<Uuid>> {
        down()
    }
    async fn remove_group_entities(&self, _: Uuid) -> ThingsResult<()> {
        down()
    }
}

impl CacheLayer for BrokenCache {
    type Things = Self;
    type Profiles = Self;
    type Groups = Self;

    fn things(&self) -> &Self {
        self
    }
    fn profiles(&self) -> &Self {
        self
    }
    fn groups(&self) -> &Self {
        self
    }
}

#[tokio::test]
async fn an_unreachable_cache_never_fails_an_operation() {
    let store = common::store().await;
    let svc = common::service_with(store, Arc::new(BrokenCache), ServiceConfig::default());
    let owner = Uuid::new_v4();
    let viewer = Uuid::new_v4();
    let tok = token(owner);

    let (_, group) = org_with_group(&svc, owner).await;
    let thing = thing_in(&svc, owner, group.id, vec![]).await;
    let profile = profile_in(&svc, owner, group.id).await;
    add_member(&svc, owner, group.id, viewer, GroupRole::Viewer).await;
    svc.connect(&tok, profile.id, &[thing.id]).await.unwrap();

    let key = ThingKey::internal(thing.key.clone());
    assert_eq!(svc.identify(&key).await.unwrap(), thing.id);
    assert_eq!(
        svc.get_pub_conf_by_key(&key).await.unwrap().profile_id,
        profile.id
    );
    svc.can_user_access_thing(&token(viewer), thing.id, Action::Read)
        .await
        .unwrap();
    let err = svc
        .can_user_access_thing(&token(viewer), thing.id, Action::Write)
        .await
        .unwrap_err();
    assert!(matches!(err, ThingsError::AuthorizationDenied { .. }));

    svc.remove_group(&tok, group.id).await.unwrap();
    assert!(svc.view_group(&tok, group.id).await.unwrap_err().is_not_found());
}
