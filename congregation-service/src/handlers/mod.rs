pub mod auth;
pub mod congregation;
pub mod context;
pub mod courses;
pub mod events;
pub mod feed;
pub mod invite;
pub mod livestream;
pub mod membership;
pub mod metrics;
pub mod notifications;
pub mod sermons;

use service_core::error::AppError;
use uuid::Uuid;

use crate::models::Membership;
use crate::AppState;

/// Load a membership addressed by ID under a congregation path.
/// Rows belonging to another congregation are reported as missing.
pub(crate) async fn load_target_membership(
    state: &AppState,
    congregation_id: Uuid,
    membership_id: Uuid,
) -> Result<Membership, AppError> {
    state
        .db
        .find_membership_by_id(membership_id)
        .await?
        .filter(|m| m.congregation_id == congregation_id)
        .ok_or_else(|| AppError::not_found("Membership not found"))
}

/// Clamp a client-supplied page size.
pub(crate) fn page_limit(requested: Option<i64>, default: i64, max: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, max)
}
