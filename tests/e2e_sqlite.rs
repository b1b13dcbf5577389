//! End-to-end tests for the `SQLite` repositories.
//!
//! Each test runs on its own in-memory database.
//! Run with: `cargo test --features sqlite --test e2e_sqlite`

#![cfg(feature = "sqlite")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use roster::actions::{
    AcceptInvitationAction, ChangeRoleAction, ChangeRoleInput, CreateOrganizationAction,
    CreateOrganizationInput, DeleteOrganizationAction, ExpireInvitationsAction,
    InviteMemberAction, InviteMemberInput, ValidateInvitationAction,
};
use roster::sqlite::{
    migrations, SqliteActiveSelectionRepository, SqliteInvitationRepository,
    SqliteMembershipRepository, SqliteOrganizationRepository,
};
use roster::{
    ActiveSelectionRepository, CreateMembership, InvitationRepository, InvitationStatus,
    MembershipRepository, OrgLocks, OrganizationRepository, Role, RosterError, SessionCache,
};

async fn pool() -> SqlitePool {
    // a single connection keeps every query on the same in-memory database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    migrations::run(&pool).await.expect("migrations");
    pool
}

fn repos(
    pool: &SqlitePool,
) -> (
    SqliteOrganizationRepository,
    SqliteMembershipRepository,
    SqliteInvitationRepository,
) {
    (
        SqliteOrganizationRepository::new(pool.clone()),
        SqliteMembershipRepository::new(pool.clone()),
        SqliteInvitationRepository::new(pool.clone()),
    )
}

fn org_input(name: &str, creator: i64) -> CreateOrganizationInput {
    CreateOrganizationInput {
        name: name.to_owned(),
        industry: "Logistics".to_owned(),
        phone_number: "+15550100".to_owned(),
        email: Some("hello@acme.test".to_owned()),
        address: None,
        creator,
    }
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let pool = pool().await;
    migrations::run(&pool).await.expect("second run");

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _roster_migrations")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(applied, 4);
}

#[tokio::test]
async fn test_organization_roundtrip() {
    let pool = pool().await;
    let (organizations, memberships, _) = repos(&pool);

    let output = CreateOrganizationAction::new(organizations.clone(), memberships.clone())
        .execute(org_input("Acme", 1))
        .await
        .unwrap();

    let fetched = organizations
        .find_by_id(output.organization.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.name, "Acme");
    assert_eq!(fetched.email.as_deref(), Some("hello@acme.test"));

    let membership = memberships
        .find_by_org_and_account(output.organization.id, 1)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(membership.role, Role::Owner);
}

#[tokio::test]
async fn test_duplicate_membership_is_a_conflict() {
    let pool = pool().await;
    let (_, memberships, _) = repos(&pool);

    memberships
        .create(CreateMembership {
            organization_id: 1,
            account_id: 2,
            role: Role::Staff,
        })
        .await
        .unwrap();

    let result = memberships
        .create(CreateMembership {
            organization_id: 1,
            account_id: 2,
            role: Role::Manager,
        })
        .await;

    assert!(matches!(result.unwrap_err(), RosterError::Conflict(_)));
}

#[tokio::test]
async fn test_invite_validate_accept_against_sqlite() {
    let pool = pool().await;
    let (organizations, memberships, invitations) = repos(&pool);
    let locks = OrgLocks::new();

    let org = CreateOrganizationAction::new(organizations.clone(), memberships.clone())
        .execute(org_input("Acme", 1))
        .await
        .unwrap()
        .organization;

    let output = InviteMemberAction::new(memberships.clone(), invitations.clone())
        .execute(InviteMemberInput {
            organization_id: org.id,
            email: "bob@x.com".to_owned(),
            role: Role::Manager,
            actor: 1,
        })
        .await
        .unwrap();

    let view = ValidateInvitationAction::new(invitations.clone(), organizations.clone())
        .execute(&output.token)
        .await
        .unwrap();
    assert_eq!(view.status, InvitationStatus::Pending);
    assert_eq!(view.organization_name, "Acme");

    let membership = AcceptInvitationAction::new(invitations.clone(), memberships.clone(), locks)
        .execute(&output.token, 2)
        .await
        .unwrap();
    assert_eq!(membership.role, Role::Manager);

    let stored = invitations
        .find_by_id(output.invitation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, InvitationStatus::Accepted);
}

#[tokio::test]
async fn test_role_change_persists() {
    let pool = pool().await;
    let (organizations, memberships, _) = repos(&pool);

    let org = CreateOrganizationAction::new(organizations, memberships.clone())
        .execute(org_input("Acme", 1))
        .await
        .unwrap()
        .organization;

    memberships
        .create(CreateMembership {
            organization_id: org.id,
            account_id: 2,
            role: Role::Staff,
        })
        .await
        .unwrap();

    ChangeRoleAction::new(memberships.clone(), OrgLocks::new())
        .execute(ChangeRoleInput {
            organization_id: org.id,
            actor: 1,
            target: 2,
            new_role: Role::Manager,
        })
        .await
        .unwrap();

    let membership = memberships
        .find_by_org_and_account(org.id, 2)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(membership.role, Role::Manager);
}

#[tokio::test]
async fn test_expiry_sweep_persists_expired() {
    let pool = pool().await;
    let (organizations, memberships, invitations) = repos(&pool);

    let org = CreateOrganizationAction::new(organizations, memberships.clone())
        .execute(org_input("Acme", 1))
        .await
        .unwrap()
        .organization;

    let output = InviteMemberAction::new(memberships, invitations.clone())
        .execute(InviteMemberInput {
            organization_id: org.id,
            email: "late@x.com".to_owned(),
            role: Role::Staff,
            actor: 1,
        })
        .await
        .unwrap();

    invitations
        .refresh_token(
            output.invitation.id,
            output.invitation.token_hash.clone(),
            Utc::now() - Duration::hours(1),
        )
        .await
        .unwrap();

    let swept = ExpireInvitationsAction::new(invitations.clone())
        .execute()
        .await
        .unwrap();
    assert_eq!(swept, 1);

    let stored = invitations
        .find_by_id(output.invitation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, InvitationStatus::Expired);
}

#[tokio::test]
async fn test_delete_organization_cascades_in_sqlite() {
    let pool = pool().await;
    let (organizations, memberships, invitations) = repos(&pool);

    let org = CreateOrganizationAction::new(organizations.clone(), memberships.clone())
        .execute(org_input("Doomed", 1))
        .await
        .unwrap()
        .organization;

    InviteMemberAction::new(memberships.clone(), invitations.clone())
        .execute(InviteMemberInput {
            organization_id: org.id,
            email: "p@x.com".to_owned(),
            role: Role::Staff,
            actor: 1,
        })
        .await
        .unwrap();

    DeleteOrganizationAction::new(
        organizations.clone(),
        memberships.clone(),
        invitations.clone(),
        OrgLocks::new(),
    )
    .execute(org.id, 1)
    .await
    .unwrap();

    assert!(organizations.find_by_id(org.id).await.unwrap().is_none());
    assert!(memberships.find_by_organization(org.id).await.unwrap().is_empty());
    assert!(invitations.find_by_organization(org.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_session_cache_over_sqlite() {
    let pool = pool().await;
    let (organizations, memberships, _) = repos(&pool);
    let selections = SqliteActiveSelectionRepository::new(pool.clone());

    let create = CreateOrganizationAction::new(organizations.clone(), memberships.clone());
    let alpha = create.execute(org_input("Alpha", 1)).await.unwrap().organization.id;
    let beta = create.execute(org_input("Beta", 1)).await.unwrap().organization.id;

    let cache = SessionCache::new(1, memberships.clone(), organizations.clone(), selections.clone());
    cache.refresh().await.unwrap();
    assert_eq!(cache.active().unwrap().organization.id, alpha);

    cache.set_active(beta).await.unwrap();
    assert_eq!(selections.get(1).await.unwrap().unwrap().organization_id, beta);

    // a fresh cache, as after a restart, resumes the persisted selection
    let cache = SessionCache::new(1, memberships, organizations, selections);
    cache.refresh().await.unwrap();
    assert_eq!(cache.active().unwrap().organization.id, beta);
}
