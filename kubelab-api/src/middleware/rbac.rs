///! Role checks
///!
///! Each operation names the set of roles allowed to call it.

use crate::error::ApiError;
use kubelab_common::auth::User;
use kubelab_common::Role;

/// Workload operations
pub const POD_ROLES: &[Role] = &[Role::Student, Role::Teacher, Role::Admin];

/// Group management
pub const GROUP_ROLES: &[Role] = &[Role::Teacher, Role::Admin];

/// Role changes
pub const ADMIN_ROLES: &[Role] = &[Role::Admin];

/// Reject with 403 unless the user's role is in `allowed`
pub fn require_role(user: &User, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&user.role) {
        return Ok(());
    }

    tracing::info!(user = %user.username, role = %user.role, "Permission denied");

    let names = allowed.iter().map(Role::as_str).collect::<Vec<_>>().join(", ");
    Err(ApiError::Forbidden(format!(
        "Permission denied: requires one of [{}]",
        names
    )))
}
