use tracing::{info, warn};

use shared::types::{Identity, Role, RoleChange, SessionClaims};

use crate::database::IdentityStore;
use crate::error::AuthError;
use crate::security::route_policy::RoutePolicy;

/// Path whose policy decides who may list accounts.
pub const USER_ADMIN_PATH: &str = "/dashboard/admin/users";

// Callers are checked against their claims, not a fresh read.
fn require_admin(caller: &SessionClaims, action: &str) -> Result<(), AuthError> {
    if caller.role.is_admin() {
        return Ok(());
    }

    warn!(
        "{} ({}) is not allowed to {}",
        caller.subject, caller.role, action
    );
    Err(AuthError::Forbidden(
        "Administrator role required".to_string(),
    ))
}

async fn ensure_not_last_admin(
    store: &dyn IdentityStore,
    target: &Identity,
) -> Result<(), AuthError> {
    if target.role.is_admin() && store.count_admins().await? <= 1 {
        warn!("Refusing to remove the last administrator ({})", target.id);
        return Err(AuthError::Conflict(
            "At least one administrator must remain".to_string(),
        ));
    }
    Ok(())
}

/// Set the role of `target_id`. The only path by which a role changes.
pub async fn change_role(
    store: &dyn IdentityStore,
    caller: &SessionClaims,
    target_id: &str,
    new_role: &str,
) -> Result<RoleChange, AuthError> {
    require_admin(caller, "change roles")?;

    let role = Role::parse(new_role)
        .ok_or_else(|| AuthError::Validation(format!("Invalid role: {}", new_role)))?;

    let target = store
        .find_by_id(target_id)
        .await?
        .ok_or_else(|| AuthError::NotFound("User not found".to_string()))?
        .into_identity();

    if role != Role::Admin {
        ensure_not_last_admin(store, &target).await?;
    }

    let updated = store
        .update_role(target_id, role)
        .await?
        .ok_or_else(|| AuthError::NotFound("User not found".to_string()))?;

    info!(
        "{} changed role of {} from {} to {}",
        caller.subject, target_id, target.role, updated.role
    );

    Ok(RoleChange::from(&updated))
}

/// Remove `target_id`. An administrator cannot delete their own account.
pub async fn delete_account(
    store: &dyn IdentityStore,
    caller: &SessionClaims,
    target_id: &str,
) -> Result<(), AuthError> {
    require_admin(caller, "delete accounts")?;

    if caller.subject == target_id {
        warn!("{} attempted to delete their own account", caller.subject);
        return Err(AuthError::Forbidden(
            "You cannot delete your own account".to_string(),
        ));
    }

    let target = store
        .find_by_id(target_id)
        .await?
        .ok_or_else(|| AuthError::NotFound("User not found".to_string()))?
        .into_identity();

    ensure_not_last_admin(store, &target).await?;

    if !store.delete(target_id).await? {
        return Err(AuthError::NotFound("User not found".to_string()));
    }

    info!("{} deleted account {}", caller.subject, target_id);

    Ok(())
}

/// Every account, newest first, for callers the policy admits to the user
/// administration page.
pub async fn list_accounts(
    store: &dyn IdentityStore,
    policy: &RoutePolicy,
    caller: &SessionClaims,
) -> Result<Vec<Identity>, AuthError> {
    if !policy.is_authorized(USER_ADMIN_PATH, Some(caller.role)) {
        warn!("{} ({}) may not list accounts", caller.subject, caller.role);
        return Err(AuthError::Forbidden("Access denied".to_string()));
    }

    Ok(store.list().await?)
}
