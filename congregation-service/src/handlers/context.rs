use serde::Serialize;
use service_core::error::AppError;
use service_core::response::ApiResponse;

use crate::middleware::CongregationContext;
use crate::models::{Congregation, Membership};

#[derive(Debug, Serialize)]
pub struct ContextResponse {
    pub congregation: Congregation,
    pub access: &'static str,
    pub membership: Option<Membership>,
}

/// The congregation context-scoped routes act on, with the caller's access.
///
/// GET /context
pub async fn current_context(
    ctx: CongregationContext,
) -> Result<ApiResponse<ContextResponse>, AppError> {
    Ok(ApiResponse::ok(ContextResponse {
        access: ctx.access.label(),
        membership: ctx.access.membership().cloned(),
        congregation: ctx.congregation,
    }))
}
