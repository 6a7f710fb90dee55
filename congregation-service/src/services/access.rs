//! Congregation access gate.
//!
//! Every congregation-scoped operation resolves the caller's [`AccessLevel`]
//! first and then asks it for the permission it needs. Only an `active`
//! membership ever grants anything; pending, left, removed and banned rows
//! resolve to [`AccessLevel::NonMember`]. Super-admins bypass every
//! congregation-level check, including suspension.

use service_core::error::AppError;
use uuid::Uuid;

use crate::models::{Congregation, MemberRole, Membership, User};
use crate::services::Database;

#[derive(Debug, Clone)]
pub enum AccessLevel {
    SuperAdmin,
    Admin(Membership),
    Member(Membership),
    NonMember,
}

impl AccessLevel {
    /// Resolve the caller's standing in `congregation`.
    pub fn resolve(
        user: &User,
        congregation: &Congregation,
        membership: Option<Membership>,
    ) -> Self {
        if user.is_super_admin() {
            return AccessLevel::SuperAdmin;
        }
        if !congregation.is_active() {
            return AccessLevel::NonMember;
        }
        match membership {
            Some(m) if m.is_active() && m.role().is_admin_role() => AccessLevel::Admin(m),
            Some(m) if m.is_active() => AccessLevel::Member(m),
            _ => AccessLevel::NonMember,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AccessLevel::SuperAdmin => "super_admin",
            AccessLevel::Admin(_) => "admin",
            AccessLevel::Member(_) => "member",
            AccessLevel::NonMember => "non_member",
        }
    }

    pub fn is_super_admin(&self) -> bool {
        matches!(self, AccessLevel::SuperAdmin)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, AccessLevel::SuperAdmin | AccessLevel::Admin(_))
    }

    pub fn is_member(&self) -> bool {
        !matches!(self, AccessLevel::NonMember)
    }

    /// The caller's own active membership, if any.
    pub fn membership(&self) -> Option<&Membership> {
        match self {
            AccessLevel::Admin(m) | AccessLevel::Member(m) => Some(m),
            _ => None,
        }
    }

    /// Effective rank; super-admins outrank every congregation role.
    pub fn rank(&self) -> Option<u8> {
        match self {
            AccessLevel::SuperAdmin => Some(u8::MAX),
            AccessLevel::Admin(m) | AccessLevel::Member(m) => Some(m.role().rank()),
            AccessLevel::NonMember => None,
        }
    }

    pub fn require_member(&self) -> Result<(), AppError> {
        if self.is_member() {
            Ok(())
        } else {
            Err(AppError::forbidden("You are not a member of this congregation"))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden(
                "Congregation admin rights are required for this action",
            ))
        }
    }

    /// Whether the caller may act on `target` (strictly lower rank).
    pub fn can_manage(&self, target: &Membership) -> bool {
        match (self.is_admin(), self.rank()) {
            (true, Some(rank)) => self.is_super_admin() || target.role().rank() < rank,
            _ => false,
        }
    }

    /// Whether the caller may hand out `role`. Pastor is never grantable here.
    pub fn can_grant(&self, role: MemberRole) -> bool {
        if role == MemberRole::Pastor || !self.is_admin() {
            return false;
        }
        self.rank().is_some_and(|rank| role.rank() <= rank)
    }

    /// Whether the caller may edit or delete content authored by `author_user_id`.
    pub fn can_moderate(&self, user_id: Uuid, author_user_id: Uuid) -> bool {
        user_id == author_user_id || self.is_admin()
    }

    /// Private congregations do not exist for non-members.
    pub fn hide_private(&self, congregation: &Congregation) -> Result<(), AppError> {
        if congregation.is_private() && !self.is_member() {
            return Err(AppError::not_found("Congregation not found"));
        }
        Ok(())
    }
}

/// Load a congregation and the caller's access to it.
pub async fn load_access(
    db: &Database,
    user: &User,
    congregation_id: Uuid,
) -> Result<(Congregation, AccessLevel), AppError> {
    let congregation = db
        .find_congregation_by_id(congregation_id)
        .await?
        .ok_or_else(|| AppError::not_found("Congregation not found"))?;

    let membership = db.find_membership(congregation_id, user.user_id).await?;
    let access = AccessLevel::resolve(user, &congregation, membership);

    tracing::debug!(
        user_id = %user.user_id,
        congregation_id = %congregation_id,
        access = access.label(),
        "Resolved congregation access"
    );

    Ok((congregation, access))
}
