//! Behaviour every cache backend must share.

use things_core::cache::{CacheLayer, GroupCache, ProfileCache, ThingCache};
use things_core::models::role::GroupRole;
use things_core::models::thing::ThingKey;
use uuid::Uuid;

/// Keys unique to one test run, so a shared Redis can be reused.
pub fn unique_key(kind: &str) -> String {
    format!("{kind}-{}", Uuid::new_v4())
}

pub async fn key_lookup_and_removal<L: CacheLayer>(cache: &L) {
    let thing = Uuid::new_v4();
    let internal = ThingKey::internal(unique_key("k"));
    let external = ThingKey::external(unique_key("x"));

    cache.things().save(&internal, thing).await.unwrap();
    cache.things().save(&external, thing).await.unwrap();

    assert_eq!(cache.things().id(&internal).await.unwrap(), Some(thing));
    assert_eq!(cache.things().id(&external).await.unwrap(), Some(thing));
    // Same value under the other key type is a miss.
    let crossed = ThingKey::external(internal.value.clone());
    assert_eq!(cache.things().id(&crossed).await.unwrap(), None);

    cache.things().remove_key(&internal).await.unwrap();
    assert_eq!(cache.things().id(&internal).await.unwrap(), None);
    assert_eq!(cache.things().id(&external).await.unwrap(), Some(thing));

    cache.things().save(&internal, thing).await.unwrap();
    cache.things().remove_thing(thing).await.unwrap();
    assert_eq!(cache.things().id(&internal).await.unwrap(), None);
    assert_eq!(cache.things().id(&external).await.unwrap(), None);
}

pub async fn ancestry_entries<L: CacheLayer>(cache: &L) {
    let (thing, profile, group, org) = (
        Uuid::new_v4(),
        Uuid::new_v4(),
        Uuid::new_v4(),
        Uuid::new_v4(),
    );

    assert_eq!(cache.things().view_group(thing).await.unwrap(), None);

    cache.things().save_group(thing, group).await.unwrap();
    cache.things().save_profile(thing, profile).await.unwrap();
    cache.profiles().save_group(profile, group).await.unwrap();
    cache.groups().save_org(group, org).await.unwrap();

    assert_eq!(cache.things().view_group(thing).await.unwrap(), Some(group));
    assert_eq!(cache.things().view_profile(thing).await.unwrap(), Some(profile));
    assert_eq!(cache.profiles().view_group(profile).await.unwrap(), Some(group));
    assert_eq!(cache.groups().view_org(group).await.unwrap(), Some(org));

    cache.things().remove_group(thing).await.unwrap();
    cache.things().remove_profile(thing).await.unwrap();
    cache.profiles().remove_group(profile).await.unwrap();
    cache.groups().remove_org(group).await.unwrap();

    assert_eq!(cache.things().view_group(thing).await.unwrap(), None);
    assert_eq!(cache.things().view_profile(thing).await.unwrap(), None);
    assert_eq!(cache.profiles().view_group(profile).await.unwrap(), None);
    assert_eq!(cache.groups().view_org(group).await.unwrap(), None);
}

pub async fn roles_and_memberships<L: CacheLayer>(cache: &L) {
    let (member, g1, g2) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    cache.groups().save_role(g1, member, GroupRole::Editor).await.unwrap();
    cache.groups().save_role(g2, member, GroupRole::Viewer).await.unwrap();
    assert_eq!(
        cache.groups().view_role(g1, member).await.unwrap(),
        Some(GroupRole::Editor)
    );

    let mut groups = cache.groups().group_memberships(member).await.unwrap();
    groups.sort();
    let mut expected = vec![g1, g2];
    expected.sort();
    assert_eq!(groups, expected);

    cache.groups().save_role(g1, member, GroupRole::Owner).await.unwrap();
    assert_eq!(
        cache.groups().view_role(g1, member).await.unwrap(),
        Some(GroupRole::Owner)
    );

    cache.groups().remove_role(g1, member).await.unwrap();
    assert_eq!(cache.groups().view_role(g1, member).await.unwrap(), None);
    assert_eq!(
        cache.groups().group_memberships(member).await.unwrap(),
        vec![g2]
    );
}

pub async fn group_cascade_clears_every_derived_entry<L: CacheLayer>(cache: &L) {
    let (group, other_group, org) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let (thing, profile, member) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let internal = ThingKey::internal(unique_key("k"));
    let external = ThingKey::external(unique_key("x"));

    cache.groups().save_org(group, org).await.unwrap();
    cache.things().save(&internal, thing).await.unwrap();
    cache.things().save(&external, thing).await.unwrap();
    cache.things().save_group(thing, group).await.unwrap();
    cache.things().save_profile(thing, profile).await.unwrap();
    cache.profiles().save_group(profile, group).await.unwrap();
    cache.groups().save_role(group, member, GroupRole::Editor).await.unwrap();
    cache
        .groups()
        .save_role(other_group, member, GroupRole::Viewer)
        .await
        .unwrap();

    cache.groups().remove_group_entities(group).await.unwrap();

    assert_eq!(cache.things().id(&internal).await.unwrap(), None);
    assert_eq!(cache.things().id(&external).await.unwrap(), None);
    assert_eq!(cache.things().view_group(thing).await.unwrap(), None);
    assert_eq!(cache.things().view_profile(thing).await.unwrap(), None);
    assert_eq!(cache.profiles().view_group(profile).await.unwrap(), None);
    assert_eq!(cache.groups().view_org(group).await.unwrap(), None);
    assert_eq!(cache.groups().view_role(group, member).await.unwrap(), None);

    // Roles in other groups survive.
    assert_eq!(
        cache.groups().view_role(other_group, member).await.unwrap(),
        Some(GroupRole::Viewer)
    );

    // A second pass over the same group is harmless.
    cache.groups().remove_group_entities(group).await.unwrap();
}
