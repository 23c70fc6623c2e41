//! Integration tests for the event-emitting service decorator.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{org_with_group, profile_in, thing_in, token};
use things_cache::MemoryCache;
use things_core::models::role::Action;
use things_service::events::{BroadcastPublisher, NoopPublisher};
use things_service::{Event, EventingService, Service, ServiceConfig, with_deadline};
use tokio::sync::broadcast::error::TryRecvError;
use uuid::Uuid;

#[tokio::test]
async fn mutations_publish_events_and_reads_do_not() {
    let store = common::store().await;
    let inner = common::service_with(store, Arc::new(MemoryCache::new()), ServiceConfig::default());
    let publisher = BroadcastPublisher::new(64);
    let mut events = publisher.subscribe();
    let svc = EventingService::new(inner, publisher);
    let owner = Uuid::new_v4();

    let (org, group) = org_with_group(&svc, owner).await;
    assert_eq!(
        events.recv().await.unwrap(),
        Event::OrganizationCreated {
            org_id: org.id,
            owner_id: owner
        }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        Event::GroupCreated {
            group_id: group.id,
            org_id: org.id
        }
    );

    let thing = thing_in(&svc, owner, group.id, vec![]).await;
    let profile = profile_in(&svc, owner, group.id).await;
    assert_eq!(
        events.recv().await.unwrap(),
        Event::ThingsCreated {
            thing_ids: vec![thing.id]
        }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        Event::ProfilesCreated {
            profile_ids: vec![profile.id]
        }
    );

    svc.connect(&token(owner), profile.id, &[thing.id])
        .await
        .unwrap();
    assert_eq!(
        events.recv().await.unwrap(),
        Event::ThingsConnected {
            profile_id: profile.id,
            thing_ids: vec![thing.id]
        }
    );

    svc.can_user_access_thing(&token(owner), thing.id, Action::Read)
        .await
        .unwrap();
    svc.view_group(&token(owner), group.id).await.unwrap();
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn failed_mutations_publish_nothing() {
    let store = common::store().await;
    let inner = common::service_with(store, Arc::new(MemoryCache::new()), ServiceConfig::default());
    let publisher = BroadcastPublisher::new(16);
    let svc = EventingService::new(inner, publisher.clone());
    let owner = Uuid::new_v4();
    let (_, group) = org_with_group(&svc, owner).await;

    let mut events = publisher.subscribe();
    let err = svc
        .remove_group(&token(Uuid::new_v4()), group.id)
        .await
        .unwrap_err();
    assert!(!err.is_not_found());
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn decorated_services_run_under_a_deadline() {
    let store = common::store().await;
    let inner = common::service_with(store, Arc::new(MemoryCache::new()), ServiceConfig::default());
    let svc = EventingService::new(inner, NoopPublisher);
    let owner = Uuid::new_v4();
    let (_, group) = org_with_group(&svc, owner).await;

    let tok = token(owner);
    let viewed = with_deadline(Duration::from_secs(5), svc.view_group(&tok, group.id))
        .await
        .unwrap();
    assert_eq!(viewed.id, group.id);
}
