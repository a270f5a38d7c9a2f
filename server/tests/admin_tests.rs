mod common;

use std::sync::Arc;

use keystone::auth::admin;
use keystone::auth::claims;
use keystone::error::AuthError;
use keystone::security::GateDecision;
use shared::types::{Role, SessionClaims};

use common::{MemoryStore, test_state};

async fn claims_of(store: &MemoryStore, id: &str) -> SessionClaims {
    claims::repair(store, id).await.claims
}

// ---------------------------------------------------------------------------
// Role changes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn admin_promotes_user_to_staff() {
    let store = Arc::new(MemoryStore::new());
    let admin_id = store.seed("admin@x.com", "secret1", Role::Admin);
    let user_id = store.seed("u@x.com", "secret1", Role::User);
    let caller = claims_of(&store, &admin_id).await;

    let change = admin::change_role(&*store, &caller, &user_id, "STAFF")
        .await
        .unwrap();

    assert_eq!(change.id, user_id);
    assert_eq!(change.role, Role::Staff);
    assert_eq!(store.get(&user_id).unwrap().role, Role::Staff);
}

#[tokio::test]
async fn forbidden_role_change_performs_no_mutation() {
    let store = Arc::new(MemoryStore::new());
    let staff_id = store.seed("s@x.com", "secret1", Role::Staff);
    let user_id = store.seed("u@x.com", "secret1", Role::User);
    let caller = claims_of(&store, &staff_id).await;

    let result = admin::change_role(&*store, &caller, &user_id, "ADMIN").await;

    assert!(matches!(result, Err(AuthError::Forbidden(_))));
    assert_eq!(store.get(&user_id).unwrap().role, Role::User);
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn unknown_role_is_a_validation_error() {
    let store = Arc::new(MemoryStore::new());
    let admin_id = store.seed("admin@x.com", "secret1", Role::Admin);
    let user_id = store.seed("u@x.com", "secret1", Role::User);
    let caller = claims_of(&store, &admin_id).await;

    let result = admin::change_role(&*store, &caller, &user_id, "ROOT").await;

    assert!(matches!(result, Err(AuthError::Validation(_))));
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn role_change_for_missing_identity_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    let admin_id = store.seed("admin@x.com", "secret1", Role::Admin);
    let caller = claims_of(&store, &admin_id).await;

    let result = admin::change_role(&*store, &caller, "nobody", "STAFF").await;

    assert!(matches!(result, Err(AuthError::NotFound(_))));
}

#[tokio::test]
async fn last_admin_cannot_be_demoted() {
    let store = Arc::new(MemoryStore::new());
    let admin_id = store.seed("admin@x.com", "secret1", Role::Admin);
    let caller = claims_of(&store, &admin_id).await;

    let result = admin::change_role(&*store, &caller, &admin_id, "USER").await;

    assert!(matches!(result, Err(AuthError::Conflict(_))));
    assert_eq!(store.get(&admin_id).unwrap().role, Role::Admin);
}

#[tokio::test]
async fn demoted_admin_keeps_old_claims_until_repair() {
    let store = Arc::new(MemoryStore::new());
    let a = store.seed("a@x.com", "secret1", Role::Admin);
    let b = store.seed("b@x.com", "secret1", Role::Admin);
    let caller = claims_of(&store, &a).await;
    let stale = claims_of(&store, &b).await;

    admin::change_role(&*store, &caller, &b, "USER").await.unwrap();

    assert_eq!(stale.role, Role::Admin);
    assert_eq!(claims_of(&store, &b).await.role, Role::User);
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn admin_cannot_delete_own_account() {
    let store = Arc::new(MemoryStore::new());
    let admin_id = store.seed("admin@x.com", "secret1", Role::Admin);
    let _other = store.seed("other@x.com", "secret1", Role::Admin);
    let caller = claims_of(&store, &admin_id).await;

    let result = admin::delete_account(&*store, &caller, &admin_id).await;

    assert!(matches!(result, Err(AuthError::Forbidden(_))));
    assert!(store.get(&admin_id).is_some());
}

#[tokio::test]
async fn admin_deletes_other_account() {
    let store = Arc::new(MemoryStore::new());
    let admin_id = store.seed("admin@x.com", "secret1", Role::Admin);
    let user_id = store.seed("u@x.com", "secret1", Role::User);
    let caller = claims_of(&store, &admin_id).await;

    admin::delete_account(&*store, &caller, &user_id)
        .await
        .unwrap();

    assert!(store.get(&user_id).is_none());
    let again = admin::delete_account(&*store, &caller, &user_id).await;
    assert!(matches!(again, Err(AuthError::NotFound(_))));
}

#[tokio::test]
async fn staff_cannot_delete_accounts() {
    let store = Arc::new(MemoryStore::new());
    let staff_id = store.seed("s@x.com", "secret1", Role::Staff);
    let user_id = store.seed("u@x.com", "secret1", Role::User);
    let caller = claims_of(&store, &staff_id).await;

    let result = admin::delete_account(&*store, &caller, &user_id).await;

    assert!(matches!(result, Err(AuthError::Forbidden(_))));
    assert!(store.get(&user_id).is_some());
}

// ---------------------------------------------------------------------------
// Listing and page gate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn only_admins_list_accounts() {
    let store = Arc::new(MemoryStore::new());
    let state = test_state(store.clone());
    let admin_id = store.seed("admin@x.com", "secret1", Role::Admin);
    let staff_id = store.seed("s@x.com", "secret1", Role::Staff);

    let admin_claims = claims_of(&store, &admin_id).await;
    let staff_claims = claims_of(&store, &staff_id).await;

    let listed = admin::list_accounts(&*store, &state.policy, &admin_claims)
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);

    let denied = admin::list_accounts(&*store, &state.policy, &staff_claims).await;
    assert!(matches!(denied, Err(AuthError::Forbidden(_))));
}

#[tokio::test]
async fn storage_outage_during_listing_is_retryable() {
    let store = Arc::new(MemoryStore::new());
    let state = test_state(store.clone());
    let admin_id = store.seed("admin@x.com", "secret1", Role::Admin);
    let caller = claims_of(&store, &admin_id).await;
    store.set_failing(true);

    let err = admin::list_accounts(&*store, &state.policy, &caller)
        .await
        .unwrap_err();
    assert!(err.is_retryable());
}

#[test]
fn staff_on_user_admin_page_lands_on_dashboard() {
    let state = test_state(Arc::new(MemoryStore::new()));

    assert_eq!(
        state.gate.decide(admin::USER_ADMIN_PATH, Some(Role::Staff)),
        GateDecision::Redirect("/dashboard".to_string())
    );
}

#[test]
fn unauthenticated_settings_page_redirects_to_login() {
    let state = test_state(Arc::new(MemoryStore::new()));

    assert_eq!(
        state.gate.decide("/dashboard/settings", None),
        GateDecision::Redirect("/login".to_string())
    );
    assert_eq!(
        state.gate.decide("/th/dashboard/settings", None),
        GateDecision::Redirect("/th/login".to_string())
    );
}
