//! Services layer for congregation-service.
//!
//! Persistence, sessions, the access gate and the membership state machine.

pub mod access;
mod database;
mod jwt;
pub mod membership;
pub mod metrics;
mod notifier;
pub mod revocation;

pub use access::{load_access, AccessLevel};
pub use database::{Database, RedeemResult};
pub use jwt::{JwtService, SessionClaims, SessionToken};
pub use membership::MembershipError;
pub use notifier::Notifier;
pub use revocation::{InMemoryRevocationStore, RedisRevocationStore, TokenRevocation};
