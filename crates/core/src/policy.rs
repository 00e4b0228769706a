//! Role-based access rules.
//!
//! `Unauthorized` (no usable credential) and `Forbidden` (valid credential,
//! wrong roles) stay distinct: the former is `TimeError::Authentication`, the
//! latter `TimeError::Authorization`.

use tracing::debug;

use crate::errors::{TimeError, TimeResult};
use crate::models::identity::{Caller, CallerIdentity, Credential, Role};
use crate::ports::IdentityService;

/// May create, update and delete timetables.
pub const TIMETABLE_MANAGERS: &[Role] = &[Role::Admin, Role::Manager];

/// May list a single room's timetables.
pub const ROOM_VIEWERS: &[Role] = &[Role::Admin, Role::Manager, Role::Doctor];

/// May cancel appointments they do not own.
pub const APPOINTMENT_MODERATORS: &[Role] = &[Role::Admin, Role::Manager];

/// Resolves a bearer credential into a [`Caller`].
pub async fn authenticate(
    identity: &dyn IdentityService,
    credential: Credential,
) -> TimeResult<Caller> {
    let resolved = match identity.resolve_caller(&credential).await {
        Ok(resolved) => resolved,
        Err(TimeError::NotFound(_)) | Err(TimeError::Authorization(_)) => {
            return Err(TimeError::Authentication(
                "Invalid or expired token".to_string(),
            ));
        }
        Err(e) => return Err(e),
    };

    debug!(
        "Authenticated caller {} with roles {:?}",
        resolved.user_id, resolved.roles
    );

    Ok(Caller {
        credential,
        identity: resolved,
    })
}

/// Admits the caller only if its roles intersect `required`.
pub fn authorize(identity: &CallerIdentity, required: &[Role]) -> TimeResult<()> {
    if identity.has_any_role(required) {
        return Ok(());
    }

    let names = required
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    Err(TimeError::Authorization(format!(
        "One of the following roles is required: {}",
        names
    )))
}
