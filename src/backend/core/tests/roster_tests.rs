//! Roster projection and client-management integration tests.

mod common;

use std::sync::Arc;

use common::*;
use meridian_core::prelude::*;
use meridian_core::store::Collection;

fn admin() -> User {
    User::new("Ida Admin", "ida@meridian.example", Role::Admin)
}

fn partner() -> User {
    User::new("Priya Shah", "priya@partner.example", Role::Partner)
}

#[tokio::test]
async fn test_roster_contains_exactly_member_applications_sorted() {
    let h = harness();
    let partner = partner();
    let u1 = User::new("Arun Mehta", "arun@example.com", Role::Normal)
        .recruited_by(partner.id.clone());
    let u2 = User::new("Zara Iqbal", "zara@example.com", Role::Normal)
        .recruited_by(partner.id.clone());
    let unrelated = User::new("Noor Ali", "noor@example.com", Role::Normal);

    seed_user(h.store.as_ref(), &partner).await;
    seed_user(h.store.as_ref(), &u1).await;
    seed_user(h.store.as_ref(), &u2).await;
    seed_user(h.store.as_ref(), &unrelated).await;

    let mut older = application(ServiceCategory::Loan, &u1, &u1);
    older.created_at -= chrono::Duration::hours(24);
    let newer = application(ServiceCategory::CaService, &u1, &partner);
    let zaras = application(ServiceCategory::GovernmentScheme, &u2, &u2);
    let noise = application(ServiceCategory::Loan, &unrelated, &unrelated);

    for app in [&older, &newer, &zaras, &noise] {
        seed_application(h.store.as_ref(), app).await;
    }

    let roster = h.portal.view_client_roster(&partner).await.unwrap();
    assert!(!roster.is_degraded());
    assert_eq!(roster.entries.len(), 2);
    assert_eq!(roster.application_count(), 3);

    let arun = &roster.entries[0];
    assert_eq!(arun.client.id, u1.id);
    assert_eq!(arun.applications.len(), 2);
    // Newest first.
    assert_eq!(arun.applications[0].id, newer.id);
    assert_eq!(arun.applications[1].id, older.id);

    let all_ids: Vec<_> = roster
        .entries
        .iter()
        .flat_map(|e| e.applications.iter().map(|a| a.id.clone()))
        .collect();
    assert!(!all_ids.contains(&noise.id));
}

#[tokio::test]
async fn test_roster_degrades_on_category_outage() {
    let inner = Arc::new(InMemoryStore::new());
    let partner = partner();
    let client = User::new("Arun Mehta", "arun@example.com", Role::Normal)
        .recruited_by(partner.id.clone());
    seed_user(inner.as_ref(), &partner).await;
    seed_user(inner.as_ref(), &client).await;

    let loan = application(ServiceCategory::Loan, &client, &client);
    seed_application(inner.as_ref(), &loan).await;

    let flaky = Arc::new(FlakyStore::new(
        inner,
        Collection::CaServiceApplications,
    ));
    let (portal, _) = portal_over(flaky);

    let roster = portal.view_client_roster(&partner).await.unwrap();
    assert!(roster.is_degraded());
    assert_eq!(roster.failed_categories, vec![ServiceCategory::CaService]);
    // The healthy categories still came through.
    assert_eq!(roster.application_count(), 1);
}

#[tokio::test]
async fn test_disassociate_clears_linkage_and_keeps_applications() {
    let h = harness();
    let partner = partner();
    let client = User::new("Arun Mehta", "arun@example.com", Role::Normal)
        .recruited_by(partner.id.clone());
    let app = application(ServiceCategory::Loan, &client, &client);
    seed_user(h.store.as_ref(), &partner).await;
    seed_user(h.store.as_ref(), &client).await;
    seed_application(h.store.as_ref(), &app).await;

    let updated = h
        .portal
        .disassociate_client(&partner, &client.id)
        .await
        .unwrap();
    assert!(updated.partner_id.is_none());

    let stored = h
        .store
        .get(Collection::Users, client.id.as_str())
        .await
        .unwrap()
        .unwrap();
    assert!(stored["partner_id"].is_null());

    // The application record is untouched.
    let stored_app = h
        .store
        .get(Collection::LoanApplications, app.id.as_str())
        .await
        .unwrap();
    assert!(stored_app.is_some());
}

#[tokio::test]
async fn test_cascade_with_reassignment_repoints_applications() {
    let h = harness();
    let partner = partner();
    let target = User::new("Omar Khan", "omar@partner.example", Role::Partner);
    let client = User::new("Arun Mehta", "arun@example.com", Role::Normal)
        .recruited_by(partner.id.clone());

    seed_approved_partner(h.store.as_ref(), &partner, "Shah Advisory").await;
    seed_approved_partner(h.store.as_ref(), &target, "Khan Capital").await;
    seed_user(h.store.as_ref(), &client).await;

    let mut loan = application(ServiceCategory::Loan, &client, &partner);
    loan.partner_id = Some(partner.id.clone());
    let scheme = application(ServiceCategory::GovernmentScheme, &client, &client);
    seed_application(h.store.as_ref(), &loan).await;
    seed_application(h.store.as_ref(), &scheme).await;

    let outcome = h
        .portal
        .permanently_delete_client(&admin(), &client.id, Some(target.id.clone()))
        .await
        .unwrap();
    assert_eq!(outcome.applications_reassigned, 2);
    assert_eq!(outcome.applications_deleted, 0);
    assert!(outcome.reconciliation_required.is_empty());

    // User record is gone.
    let gone = h
        .store
        .get(Collection::Users, client.id.as_str())
        .await
        .unwrap();
    assert!(gone.is_none());

    // Both applications now point at the reassignment target.
    for (collection, id) in [
        (Collection::LoanApplications, &loan.id),
        (Collection::GovernmentSchemeApplications, &scheme.id),
    ] {
        let stored = h.store.get(collection, id.as_str()).await.unwrap().unwrap();
        assert_eq!(stored["partner_id"], target.id.as_str());
    }
}

#[tokio::test]
async fn test_cascade_without_target_deletes_applications() {
    let h = harness();
    let partner = partner();
    let client = User::new("Arun Mehta", "arun@example.com", Role::Normal)
        .recruited_by(partner.id.clone());
    seed_approved_partner(h.store.as_ref(), &partner, "Shah Advisory").await;
    seed_user(h.store.as_ref(), &client).await;

    let loan = application(ServiceCategory::Loan, &client, &client);
    seed_application(h.store.as_ref(), &loan).await;

    let outcome = h
        .portal
        .permanently_delete_client(&admin(), &client.id, None)
        .await
        .unwrap();
    assert_eq!(outcome.applications_deleted, 1);
    assert_eq!(outcome.applications_reassigned, 0);

    let stored = h
        .store
        .get(Collection::LoanApplications, loan.id.as_str())
        .await
        .unwrap();
    assert!(stored.is_none());
}

#[tokio::test]
async fn test_cascade_rejects_unapproved_target_before_commit() {
    let h = harness();
    let partner = partner();
    let unapproved = User::new("Omar Khan", "omar@partner.example", Role::Partner);
    let client = User::new("Arun Mehta", "arun@example.com", Role::Normal)
        .recruited_by(partner.id.clone());
    seed_approved_partner(h.store.as_ref(), &partner, "Shah Advisory").await;
    seed_user(h.store.as_ref(), &unapproved).await;
    seed_user(h.store.as_ref(), &client).await;

    let err = h
        .portal
        .permanently_delete_client(&admin(), &client.id, Some(unapproved.id.clone()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);

    // Validation happens before the commit point: the user survives.
    let stored = h
        .store
        .get(Collection::Users, client.id.as_str())
        .await
        .unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn test_client_detail_includes_applications() {
    let h = harness();
    let partner = partner();
    let client = User::new("Arun Mehta", "arun@example.com", Role::Normal)
        .recruited_by(partner.id.clone());
    seed_user(h.store.as_ref(), &partner).await;
    seed_user(h.store.as_ref(), &client).await;

    let loan = application(ServiceCategory::Loan, &client, &client);
    let filed = application(ServiceCategory::CaService, &client, &partner);
    seed_application(h.store.as_ref(), &loan).await;
    seed_application(h.store.as_ref(), &filed).await;

    let detail = h
        .portal
        .view_client_detail(&partner, &client.id)
        .await
        .unwrap();
    assert_eq!(detail.client.id, client.id);
    assert_eq!(detail.applications.len(), 2);
}
