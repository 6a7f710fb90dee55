pub mod auth;
pub mod context;

pub use auth::{auth_middleware, AuthUser, SESSION_COOKIE};
pub use context::CongregationContext;
