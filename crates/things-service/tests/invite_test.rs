//! Integration tests for direct and dormant group invites.

mod common;

use chrono::{Duration, Utc};
use common::{Harness, add_member, org_with_group, thing_in, token};
use things_core::ThingsError;
use things_core::cache::{CacheLayer, GroupCache};
use things_core::models::invite::{
    DormantInviteRequest, GroupGrant, GroupInviteRequest, InviteState,
};
use things_core::models::role::{Action, GroupRole};
use things_core::repository::{GroupInviteRepository, ResourceStore};
use things_service::{Service, ServiceConfig};
use uuid::Uuid;

fn invite_request(group_id: Uuid, invitee: Option<Uuid>, role: GroupRole) -> GroupInviteRequest {
    GroupInviteRequest {
        group_id,
        invitee_id: invitee,
        invitee_email: "bob@example.com".into(),
        role,
    }
}

#[tokio::test]
async fn accepting_an_invite_grants_the_role() {
    let h = Harness::new().await;
    let owner = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let (_, group) = org_with_group(&h.service, owner).await;
    let thing = thing_in(&h.service, owner, group.id, vec![]).await;

    let invite = h
        .service
        .create_group_invite(&token(owner), invite_request(group.id, Some(bob), GroupRole::Editor))
        .await
        .unwrap();
    assert_eq!(invite.state, InviteState::Pending);

    let pending = h.service.list_group_invites_by_user(&token(bob)).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, invite.id);

    let accepted = h
        .service
        .respond_group_invite(&token(bob), invite.id, true)
        .await
        .unwrap();
    assert_eq!(accepted.state, InviteState::Accepted);
    assert_eq!(
        h.cache.groups().view_role(group.id, bob).await.unwrap(),
        Some(GroupRole::Editor)
    );
    h.service
        .can_user_access_thing(&token(bob), thing.id, Action::Write)
        .await
        .unwrap();

    // Accepting twice is a no-op, declining afterwards is not allowed.
    let again = h
        .service
        .respond_group_invite(&token(bob), invite.id, true)
        .await
        .unwrap();
    assert_eq!(again.state, InviteState::Accepted);
    let err = h
        .service
        .respond_group_invite(&token(bob), invite.id, false)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn declined_invites_grant_nothing() {
    let h = Harness::new().await;
    let owner = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let (_, group) = org_with_group(&h.service, owner).await;

    let invite = h
        .service
        .create_group_invite(&token(owner), invite_request(group.id, Some(bob), GroupRole::Viewer))
        .await
        .unwrap();
    let declined = h
        .service
        .respond_group_invite(&token(bob), invite.id, false)
        .await
        .unwrap();
    assert_eq!(declined.state, InviteState::Declined);

    let err = h
        .service
        .can_user_access_group(&token(bob), group.id, Action::Read)
        .await
        .unwrap_err();
    assert!(matches!(err, ThingsError::AuthorizationDenied { .. }));
}

#[tokio::test]
async fn only_the_invitee_may_respond() {
    let h = Harness::new().await;
    let owner = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let (_, group) = org_with_group(&h.service, owner).await;
    let invite = h
        .service
        .create_group_invite(&token(owner), invite_request(group.id, Some(bob), GroupRole::Viewer))
        .await
        .unwrap();

    let err = h
        .service
        .respond_group_invite(&token(Uuid::new_v4()), invite.id, true)
        .await
        .unwrap_err();
    assert!(matches!(err, ThingsError::AuthorizationDenied { .. }));
}

#[tokio::test]
async fn duplicate_pending_invites_conflict() {
    let h = Harness::new().await;
    let owner = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let (_, group) = org_with_group(&h.service, owner).await;
    let tok = token(owner);

    h.service
        .create_group_invite(&tok, invite_request(group.id, Some(bob), GroupRole::Viewer))
        .await
        .unwrap();

    // Same invitee by id.
    let err = h
        .service
        .create_group_invite(&tok, invite_request(group.id, Some(bob), GroupRole::Editor))
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    // Same email, differently cased, under another user id.
    let mut by_email = invite_request(group.id, Some(Uuid::new_v4()), GroupRole::Viewer);
    by_email.invitee_email = "BOB@example.com".into();
    let err = h
        .service
        .create_group_invite(&tok, by_email)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_invites_for_one_invitee_leave_a_single_pending_invite() {
    let h = Harness::new().await;
    let owner = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let (_, group) = org_with_group(&h.service, owner).await;
    let tok = token(owner);

    for _ in 0..10 {
        let (first, second) = tokio::join!(
            h.service
                .create_group_invite(&tok, invite_request(group.id, Some(bob), GroupRole::Viewer)),
            h.service
                .create_group_invite(&tok, invite_request(group.id, Some(bob), GroupRole::Editor)),
        );
        let (won, lost) = match (first, second) {
            (Ok(invite), Err(e)) | (Err(e), Ok(invite)) => (invite, e),
            (first, second) => panic!("expected exactly one invite: {first:?} / {second:?}"),
        };
        assert!(lost.is_conflict(), "unexpected error: {lost:?}");

        let pending = h.service.list_group_invites_by_user(&token(bob)).await.unwrap();
        assert_eq!(
            pending
                .iter()
                .filter(|i| i.state == InviteState::Pending)
                .count(),
            1
        );

        // Revoking releases the slot for the next round.
        h.service.revoke_group_invite(&tok, won.id).await.unwrap();
    }
}

#[tokio::test]
async fn direct_invites_need_a_registered_invitee() {
    let h = Harness::new().await;
    let owner = Uuid::new_v4();
    let (_, group) = org_with_group(&h.service, owner).await;

    let mut request = invite_request(group.id, None, GroupRole::Viewer);
    request.invitee_email = "carol@example.com".into();
    let err = h
        .service
        .create_group_invite(&token(owner), request)
        .await
        .unwrap_err();
    assert!(matches!(err, ThingsError::MalformedEntity { .. }));

    // Nothing was stored, so the same email can still be invited by id.
    let mut request = invite_request(group.id, Some(Uuid::new_v4()), GroupRole::Viewer);
    request.invitee_email = "carol@example.com".into();
    h.service
        .create_group_invite(&token(owner), request)
        .await
        .unwrap();
}

#[tokio::test]
async fn expired_invites_stop_blocking_new_ones() {
    let h = Harness::with_config(ServiceConfig {
        invite_lifetime_secs: 0,
        ..ServiceConfig::default()
    })
    .await;
    let owner = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let (_, group) = org_with_group(&h.service, owner).await;
    let tok = token(owner);

    let stale = h
        .service
        .create_group_invite(&tok, invite_request(group.id, Some(bob), GroupRole::Viewer))
        .await
        .unwrap();
    let fresh = h
        .service
        .create_group_invite(&tok, invite_request(group.id, Some(bob), GroupRole::Viewer))
        .await
        .unwrap();
    assert_ne!(stale.id, fresh.id);

    // The stale invite was persisted as expired on the way.
    let stored = h.store.invites().get_by_id(stale.id).await.unwrap();
    assert_eq!(stored.state, InviteState::Expired);

    let err = h
        .service
        .respond_group_invite(&token(bob), fresh.id, true)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    let viewed = h.service.view_group_invite(&tok, fresh.id).await.unwrap();
    assert_eq!(viewed.state, InviteState::Expired);
}

#[tokio::test]
async fn invites_are_validated() {
    let h = Harness::new().await;
    let owner = Uuid::new_v4();
    let member = Uuid::new_v4();
    let editor = Uuid::new_v4();
    let (_, group) = org_with_group(&h.service, owner).await;
    add_member(&h.service, owner, group.id, member, GroupRole::Viewer).await;
    add_member(&h.service, owner, group.id, editor, GroupRole::Editor).await;
    let tok = token(owner);

    let err = h
        .service
        .create_group_invite(&tok, invite_request(group.id, None, GroupRole::Owner))
        .await
        .unwrap_err();
    assert!(matches!(err, ThingsError::MalformedEntity { .. }));

    let mut bad_email = invite_request(group.id, None, GroupRole::Viewer);
    bad_email.invitee_email = "not-an-email".into();
    let err = h
        .service
        .create_group_invite(&tok, bad_email)
        .await
        .unwrap_err();
    assert!(matches!(err, ThingsError::MalformedEntity { .. }));

    let err = h
        .service
        .create_group_invite(&tok, invite_request(group.id, Some(member), GroupRole::Editor))
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    // Inviting takes the owner role.
    let err = h
        .service
        .create_group_invite(
            &token(editor),
            invite_request(group.id, Some(Uuid::new_v4()), GroupRole::Viewer),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ThingsError::AuthorizationDenied { .. }));
}

#[tokio::test]
async fn revoked_invites_cannot_be_accepted() {
    let h = Harness::new().await;
    let owner = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let (_, group) = org_with_group(&h.service, owner).await;
    let invite = h
        .service
        .create_group_invite(&token(owner), invite_request(group.id, Some(bob), GroupRole::Viewer))
        .await
        .unwrap();

    let err = h
        .service
        .revoke_group_invite(&token(bob), invite.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ThingsError::AuthorizationDenied { .. }));

    let revoked = h
        .service
        .revoke_group_invite(&token(owner), invite.id)
        .await
        .unwrap();
    assert_eq!(revoked.state, InviteState::Revoked);

    let err = h
        .service
        .respond_group_invite(&token(bob), invite.id, true)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    let err = h
        .service
        .revoke_group_invite(&token(owner), invite.id)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn dormant_invites_activate_through_the_organization_invite() {
    // O1 owned by U1 holds G1. U1 invites U2 to the organization with an
    // editor grant on G1; U2 registers and the organization invite is
    // accepted, which activates the dormant group invite.
    let h = Harness::new().await;
    let u1 = Uuid::new_v4();
    let u2 = Uuid::new_v4();
    let (_, g1) = org_with_group(&h.service, u1).await;
    let thing = thing_in(&h.service, u1, g1.id, vec![]).await;
    let org_invite = Uuid::new_v4();

    let invites = h
        .service
        .create_dormant_group_invites(
            &token(u1),
            DormantInviteRequest {
                org_invite_id: org_invite,
                invitee_id: None,
                invitee_email: "u2@example.com".into(),
                grants: vec![GroupGrant {
                    group_id: g1.id,
                    role: GroupRole::Editor,
                }],
            },
        )
        .await
        .unwrap();
    assert_eq!(invites.len(), 1);

    // Dormant: no membership and no cached role yet.
    assert_eq!(h.cache.groups().view_role(g1.id, u2).await.unwrap(), None);
    let err = h
        .service
        .can_user_access_thing(&token(u2), thing.id, Action::Read)
        .await
        .unwrap_err();
    assert!(matches!(err, ThingsError::AuthorizationDenied { .. }));

    let summary = h
        .service
        .activate_group_invites(org_invite, u2, Utc::now() + Duration::days(1))
        .await
        .unwrap();
    assert_eq!(summary.activated, vec![invites[0].id]);
    assert!(summary.expired.is_empty());

    assert_eq!(
        h.cache.groups().view_role(g1.id, u2).await.unwrap(),
        Some(GroupRole::Editor)
    );
    h.service
        .can_user_access_thing(&token(u2), thing.id, Action::Write)
        .await
        .unwrap();
    let err = h
        .service
        .can_user_access_group(&token(u2), g1.id, Action::ManageMembers)
        .await
        .unwrap_err();
    assert!(matches!(err, ThingsError::AuthorizationDenied { .. }));

    let stored = h.store.invites().get_by_id(invites[0].id).await.unwrap();
    assert_eq!(stored.state, InviteState::Accepted);
    assert_eq!(stored.invitee_id, Some(u2));

    // A retry changes nothing.
    let retry = h
        .service
        .activate_group_invites(org_invite, u2, Utc::now() + Duration::days(1))
        .await
        .unwrap();
    assert!(retry.activated.is_empty());
    assert_eq!(retry.skipped, vec![invites[0].id]);
}

#[tokio::test]
async fn activation_past_the_deadline_expires_invites() {
    let h = Harness::new().await;
    let owner = Uuid::new_v4();
    let user = Uuid::new_v4();
    let (org, g1) = org_with_group(&h.service, owner).await;
    let g2 = common::group_in(&h.service, owner, org.id).await;
    let org_invite = Uuid::new_v4();

    let invites = h
        .service
        .create_dormant_group_invites(
            &token(owner),
            DormantInviteRequest {
                org_invite_id: org_invite,
                invitee_id: Some(user),
                invitee_email: "user@example.com".into(),
                grants: vec![
                    GroupGrant {
                        group_id: g1.id,
                        role: GroupRole::Viewer,
                    },
                    GroupGrant {
                        group_id: g2.id,
                        role: GroupRole::Editor,
                    },
                ],
            },
        )
        .await
        .unwrap();

    let summary = h
        .service
        .activate_group_invites(org_invite, user, Utc::now() - Duration::seconds(1))
        .await
        .unwrap();
    assert!(summary.activated.is_empty());
    assert_eq!(summary.expired.len(), 2);

    for invite in invites {
        let stored = h.store.invites().get_by_id(invite.id).await.unwrap();
        assert_eq!(stored.state, InviteState::Expired);
    }
    assert!(
        h.service
            .can_user_access_group(&token(user), g1.id, Action::Read)
            .await
            .is_err()
    );
}

#[tokio::test]
async fn activation_without_dormant_invites_is_not_found() {
    let h = Harness::new().await;
    let err = h
        .service
        .activate_group_invites(Uuid::new_v4(), Uuid::new_v4(), Utc::now())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn dormant_invites_are_skipped_for_other_users_and_not_answerable_directly() {
    let h = Harness::new().await;
    let owner = Uuid::new_v4();
    let invitee = Uuid::new_v4();
    let (_, group) = org_with_group(&h.service, owner).await;
    let org_invite = Uuid::new_v4();

    let invites = h
        .service
        .create_dormant_group_invites(
            &token(owner),
            DormantInviteRequest {
                org_invite_id: org_invite,
                invitee_id: Some(invitee),
                invitee_email: "invitee@example.com".into(),
                grants: vec![GroupGrant {
                    group_id: group.id,
                    role: GroupRole::Viewer,
                }],
            },
        )
        .await
        .unwrap();

    let err = h
        .service
        .respond_group_invite(&token(invitee), invites[0].id, true)
        .await
        .unwrap_err();
    assert!(matches!(err, ThingsError::AuthorizationDenied { .. }));

    let summary = h
        .service
        .activate_group_invites(org_invite, Uuid::new_v4(), Utc::now() + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(summary.skipped, vec![invites[0].id]);

    // Re-issuing for the same group conflicts while the invite is pending.
    let err = h
        .service
        .create_dormant_group_invites(
            &token(owner),
            DormantInviteRequest {
                org_invite_id: Uuid::new_v4(),
                invitee_id: Some(invitee),
                invitee_email: "invitee@example.com".into(),
                grants: vec![GroupGrant {
                    group_id: group.id,
                    role: GroupRole::Editor,
                }],
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}
