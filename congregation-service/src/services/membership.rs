//! Join / invite state machine.
//!
//! ```text
//! none ──join(open)──────────────► active
//! none ──join(approval)──► pending ──approve──► active
//!                                  └─reject───► removed
//! none|pending ──redeem(invite)──► active (invite role)
//! active|pending ──leave──► left      active|pending ──remove──► removed
//! * ──ban──► banned ──unban──► removed
//! ```
//!
//! `left` and `removed` rows may re-enter through join or an invite;
//! `banned` rows may not. The functions here only decide transitions; the
//! database layer applies them inside transactions.

use chrono::{DateTime, Utc};
use service_core::error::AppError;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Congregation, Invite, JoinMode, MemberRole, Membership, MembershipStatus};
use crate::services::access::AccessLevel;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MembershipError {
    #[error("You are already a member of this congregation")]
    AlreadyMember,

    #[error("This congregation only accepts members by invitation")]
    InviteRequired,

    #[error("You are not allowed to join this congregation")]
    Banned,

    #[error("This congregation is suspended")]
    CongregationSuspended,

    #[error("Membership is not awaiting approval")]
    NotPending,

    #[error("Membership is not active")]
    NotActive,

    #[error("Membership is not banned")]
    NotBanned,

    #[error("You cannot change your own membership here")]
    CannotTargetSelf,

    #[error("The pastor's membership cannot be changed here")]
    PastorProtected,

    #[error("That role cannot be granted here")]
    RoleNotGrantable,

    #[error("You do not have rights over this member")]
    InsufficientRank,

    #[error("Only the pastor can hand over the pastor role")]
    NotPastor,

    #[error("This invite has been revoked")]
    InviteRevoked,

    #[error("This invite has expired")]
    InviteExpired,

    #[error("This invite has reached its maximum number of uses")]
    InviteExhausted,

    #[error("You have no membership to leave")]
    NothingToLeave,

    #[error("Transfer the pastor role before leaving")]
    PastorMustTransfer,

    #[error("Membership changed while this request was processed")]
    StateChanged,
}

impl From<MembershipError> for AppError {
    fn from(err: MembershipError) -> Self {
        let message = anyhow::anyhow!(err.to_string());
        match err {
            MembershipError::AlreadyMember | MembershipError::StateChanged => {
                AppError::Conflict(message)
            }
            MembershipError::NotPending
            | MembershipError::NotActive
            | MembershipError::NotBanned
            | MembershipError::NothingToLeave
            | MembershipError::InviteRevoked
            | MembershipError::InviteExpired
            | MembershipError::InviteExhausted => AppError::BadRequest(message),
            MembershipError::InviteRequired
            | MembershipError::Banned
            | MembershipError::CongregationSuspended
            | MembershipError::CannotTargetSelf
            | MembershipError::PastorProtected
            | MembershipError::RoleNotGrantable
            | MembershipError::InsufficientRank
            | MembershipError::NotPastor
            | MembershipError::PastorMustTransfer => AppError::Forbidden(message),
        }
    }
}

/// Result of a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Open congregation: the membership becomes active immediately.
    Activated,
    /// Approval congregation: a pending row awaits an admin.
    PendingApproval,
    /// A pending request already exists; nothing changes.
    AlreadyPending,
}

impl JoinOutcome {
    pub fn status(&self) -> MembershipStatus {
        match self {
            JoinOutcome::Activated => MembershipStatus::Active,
            JoinOutcome::PendingApproval | JoinOutcome::AlreadyPending => {
                MembershipStatus::Pending
            }
        }
    }
}

/// Result of redeeming an invite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemOutcome {
    /// Membership becomes active with this role; one use is consumed.
    Activate(MemberRole),
    /// Already an active member; no use is consumed.
    AlreadyMember,
}

pub fn join(
    congregation: &Congregation,
    existing: Option<&Membership>,
) -> Result<JoinOutcome, MembershipError> {
    if !congregation.is_active() {
        return Err(MembershipError::CongregationSuspended);
    }

    match existing.map(Membership::status) {
        Some(MembershipStatus::Active) => return Err(MembershipError::AlreadyMember),
        Some(MembershipStatus::Pending) => return Ok(JoinOutcome::AlreadyPending),
        Some(MembershipStatus::Banned) => return Err(MembershipError::Banned),
        Some(MembershipStatus::Left) | Some(MembershipStatus::Removed) | None => {}
    }

    match congregation.join_mode() {
        JoinMode::Open => Ok(JoinOutcome::Activated),
        JoinMode::Approval => Ok(JoinOutcome::PendingApproval),
        JoinMode::InviteOnly => Err(MembershipError::InviteRequired),
    }
}

/// Shared guard for admin actions against another member.
fn check_target(
    actor: &AccessLevel,
    actor_user_id: Uuid,
    target: &Membership,
) -> Result<(), MembershipError> {
    if target.user_id == actor_user_id {
        return Err(MembershipError::CannotTargetSelf);
    }
    if target.role() == MemberRole::Pastor {
        return Err(MembershipError::PastorProtected);
    }
    if !actor.can_manage(target) {
        return Err(MembershipError::InsufficientRank);
    }
    Ok(())
}

pub fn approve(
    actor: &AccessLevel,
    actor_user_id: Uuid,
    target: &Membership,
) -> Result<MembershipStatus, MembershipError> {
    check_target(actor, actor_user_id, target)?;
    match target.status() {
        MembershipStatus::Pending => Ok(MembershipStatus::Active),
        _ => Err(MembershipError::NotPending),
    }
}

pub fn reject(
    actor: &AccessLevel,
    actor_user_id: Uuid,
    target: &Membership,
) -> Result<MembershipStatus, MembershipError> {
    check_target(actor, actor_user_id, target)?;
    match target.status() {
        MembershipStatus::Pending => Ok(MembershipStatus::Removed),
        _ => Err(MembershipError::NotPending),
    }
}

pub fn remove(
    actor: &AccessLevel,
    actor_user_id: Uuid,
    target: &Membership,
) -> Result<MembershipStatus, MembershipError> {
    check_target(actor, actor_user_id, target)?;
    match target.status() {
        MembershipStatus::Active | MembershipStatus::Pending => Ok(MembershipStatus::Removed),
        _ => Err(MembershipError::NotActive),
    }
}

pub fn ban(
    actor: &AccessLevel,
    actor_user_id: Uuid,
    target: &Membership,
) -> Result<MembershipStatus, MembershipError> {
    check_target(actor, actor_user_id, target)?;
    match target.status() {
        MembershipStatus::Banned => Err(MembershipError::Banned),
        _ => Ok(MembershipStatus::Banned),
    }
}

pub fn unban(
    actor: &AccessLevel,
    actor_user_id: Uuid,
    target: &Membership,
) -> Result<MembershipStatus, MembershipError> {
    check_target(actor, actor_user_id, target)?;
    match target.status() {
        MembershipStatus::Banned => Ok(MembershipStatus::Removed),
        _ => Err(MembershipError::NotBanned),
    }
}

pub fn change_role(
    actor: &AccessLevel,
    actor_user_id: Uuid,
    target: &Membership,
    new_role: MemberRole,
) -> Result<MemberRole, MembershipError> {
    check_target(actor, actor_user_id, target)?;
    if !target.is_active() {
        return Err(MembershipError::NotActive);
    }
    if !actor.can_grant(new_role) {
        return Err(MembershipError::RoleNotGrantable);
    }
    Ok(new_role)
}

/// Self-service leave. Pending requests can be withdrawn the same way.
pub fn leave(existing: Option<&Membership>) -> Result<MembershipStatus, MembershipError> {
    if existing.is_some_and(|m| m.is_active() && m.role() == MemberRole::Pastor) {
        return Err(MembershipError::PastorMustTransfer);
    }
    match existing.map(Membership::status) {
        Some(MembershipStatus::Active) | Some(MembershipStatus::Pending) => {
            Ok(MembershipStatus::Left)
        }
        _ => Err(MembershipError::NothingToLeave),
    }
}

pub fn set_primary(existing: Option<&Membership>) -> Result<(), MembershipError> {
    match existing {
        Some(m) if m.is_active() => Ok(()),
        _ => Err(MembershipError::NotActive),
    }
}

/// Hand the pastor role to another active member.
pub fn transfer_pastor(
    actor: &AccessLevel,
    actor_user_id: Uuid,
    target: &Membership,
) -> Result<(), MembershipError> {
    let actor_is_pastor = actor
        .membership()
        .is_some_and(|m| m.role() == MemberRole::Pastor);
    if !actor.is_super_admin() && !actor_is_pastor {
        return Err(MembershipError::NotPastor);
    }
    if target.user_id == actor_user_id {
        return Err(MembershipError::CannotTargetSelf);
    }
    if !target.is_active() {
        return Err(MembershipError::NotActive);
    }
    if target.role() == MemberRole::Pastor {
        return Err(MembershipError::PastorProtected);
    }
    Ok(())
}

/// Whether `actor` may create an invite carrying `role`.
pub fn check_invite_role(actor: &AccessLevel, role: MemberRole) -> Result<(), MembershipError> {
    if actor.can_grant(role) {
        Ok(())
    } else {
        Err(MembershipError::RoleNotGrantable)
    }
}

/// Validate the invite itself at `now`, independent of who redeems it.
pub fn check_invite(invite: &Invite, now: DateTime<Utc>) -> Result<(), MembershipError> {
    if invite.is_revoked() {
        return Err(MembershipError::InviteRevoked);
    }
    if invite.is_expired_at(now) {
        return Err(MembershipError::InviteExpired);
    }
    if invite.is_exhausted() {
        return Err(MembershipError::InviteExhausted);
    }
    Ok(())
}

pub fn redeem(
    invite: &Invite,
    congregation: &Congregation,
    existing: Option<&Membership>,
    now: DateTime<Utc>,
) -> Result<RedeemOutcome, MembershipError> {
    check_invite(invite, now)?;

    if !congregation.is_active() {
        return Err(MembershipError::CongregationSuspended);
    }

    redeem_for_status(existing.map(Membership::status), invite.role())
}

/// Membership half of `redeem`. Rerun against the locked row before a use is consumed.
pub fn redeem_for_status(
    current: Option<MembershipStatus>,
    role: MemberRole,
) -> Result<RedeemOutcome, MembershipError> {
    match current {
        Some(MembershipStatus::Active) => Ok(RedeemOutcome::AlreadyMember),
        Some(MembershipStatus::Banned) => Err(MembershipError::Banned),
        _ => Ok(RedeemOutcome::Activate(role)),
    }
}

/// A transition decided on `expected` only applies while the locked row still holds it.
/// `None` means the user had no row in the congregation.
pub fn check_unchanged(
    expected: Option<MembershipStatus>,
    current: Option<&Membership>,
) -> Result<(), MembershipError> {
    if current.map(Membership::status) == expected {
        Ok(())
    } else {
        Err(MembershipError::StateChanged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CongregationStatus, GlobalRole, User};
    use chrono::Duration;

    fn congregation(mode: JoinMode) -> Congregation {
        Congregation::new("c".into(), "C".into(), None, mode, Uuid::new_v4())
    }

    fn row(c: &Congregation, role: MemberRole, status: MembershipStatus) -> Membership {
        Membership::new(c.congregation_id, Uuid::new_v4(), role, status)
    }

    fn actor(c: &Congregation, role: MemberRole) -> (Uuid, AccessLevel) {
        let user = User::new("x@example.org".into(), "X".into(), "h".into(), GlobalRole::User);
        let m = Membership::new(c.congregation_id, user.user_id, role, MembershipStatus::Active);
        (user.user_id, AccessLevel::resolve(&user, c, Some(m)))
    }

    fn invite(c: &Congregation) -> Invite {
        Invite::new(
            c.congregation_id,
            "hash".into(),
            MemberRole::Deacon,
            Some(2),
            Some(Utc::now() + Duration::hours(1)),
            Uuid::new_v4(),
        )
    }

    #[test]
    fn open_join_activates() {
        let c = congregation(JoinMode::Open);
        assert_eq!(join(&c, None), Ok(JoinOutcome::Activated));
        assert_eq!(JoinOutcome::Activated.status(), MembershipStatus::Active);
    }

    #[test]
    fn approval_join_is_pending_and_idempotent() {
        let c = congregation(JoinMode::Approval);
        assert_eq!(join(&c, None), Ok(JoinOutcome::PendingApproval));

        let pending = row(&c, MemberRole::Member, MembershipStatus::Pending);
        assert_eq!(join(&c, Some(&pending)), Ok(JoinOutcome::AlreadyPending));
    }

    #[test]
    fn invite_only_rejects_join() {
        let c = congregation(JoinMode::InviteOnly);
        assert_eq!(join(&c, None), Err(MembershipError::InviteRequired));
    }

    #[test]
    fn join_rejects_members_banned_and_suspended() {
        let c = congregation(JoinMode::Open);
        let active = row(&c, MemberRole::Member, MembershipStatus::Active);
        let banned = row(&c, MemberRole::Member, MembershipStatus::Banned);
        assert_eq!(join(&c, Some(&active)), Err(MembershipError::AlreadyMember));
        assert_eq!(join(&c, Some(&banned)), Err(MembershipError::Banned));

        let mut suspended = congregation(JoinMode::Open);
        suspended.status = CongregationStatus::Suspended.as_str().to_string();
        assert_eq!(join(&suspended, None), Err(MembershipError::CongregationSuspended));
    }

    #[test]
    fn former_members_can_rejoin() {
        let c = congregation(JoinMode::Approval);
        for status in [MembershipStatus::Left, MembershipStatus::Removed] {
            let former = row(&c, MemberRole::Elder, status);
            assert_eq!(join(&c, Some(&former)), Ok(JoinOutcome::PendingApproval));
        }
    }

    #[test]
    fn only_pending_rows_can_be_approved_or_rejected() {
        let c = congregation(JoinMode::Approval);
        let (admin_id, admin) = actor(&c, MemberRole::Admin);

        let pending = row(&c, MemberRole::Member, MembershipStatus::Pending);
        assert_eq!(approve(&admin, admin_id, &pending), Ok(MembershipStatus::Active));
        assert_eq!(reject(&admin, admin_id, &pending), Ok(MembershipStatus::Removed));

        let active = row(&c, MemberRole::Member, MembershipStatus::Active);
        assert_eq!(approve(&admin, admin_id, &active), Err(MembershipError::NotPending));
        assert_eq!(reject(&admin, admin_id, &active), Err(MembershipError::NotPending));
    }

    #[test]
    fn plain_members_cannot_approve() {
        let c = congregation(JoinMode::Approval);
        let (member_id, member) = actor(&c, MemberRole::Deacon);
        let pending = row(&c, MemberRole::Member, MembershipStatus::Pending);

        assert_eq!(
            approve(&member, member_id, &pending),
            Err(MembershipError::InsufficientRank)
        );
    }

    #[test]
    fn pastor_cannot_be_removed_or_reassigned() {
        let c = congregation(JoinMode::Open);
        let pastor = row(&c, MemberRole::Pastor, MembershipStatus::Active);
        let super_admin = AccessLevel::SuperAdmin;
        let actor_id = Uuid::new_v4();

        assert_eq!(
            remove(&super_admin, actor_id, &pastor),
            Err(MembershipError::PastorProtected)
        );
        assert_eq!(
            change_role(&super_admin, actor_id, &pastor, MemberRole::Member),
            Err(MembershipError::PastorProtected)
        );
        assert_eq!(
            ban(&super_admin, actor_id, &pastor),
            Err(MembershipError::PastorProtected)
        );
    }

    #[test]
    fn pastor_role_is_never_granted_by_role_change() {
        let c = congregation(JoinMode::Open);
        let target = row(&c, MemberRole::Member, MembershipStatus::Active);

        assert_eq!(
            change_role(&AccessLevel::SuperAdmin, Uuid::new_v4(), &target, MemberRole::Pastor),
            Err(MembershipError::RoleNotGrantable)
        );
    }

    #[test]
    fn admins_cannot_target_themselves() {
        let c = congregation(JoinMode::Open);
        let (admin_id, admin) = actor(&c, MemberRole::Admin);
        let own = admin.membership().cloned().unwrap();

        assert_eq!(
            change_role(&admin, admin_id, &own, MemberRole::Member),
            Err(MembershipError::CannotTargetSelf)
        );
        assert_eq!(
            remove(&admin, admin_id, &own),
            Err(MembershipError::CannotTargetSelf)
        );
    }

    #[test]
    fn role_changes_respect_hierarchy() {
        let c = congregation(JoinMode::Open);
        let (leader_id, leader) = actor(&c, MemberRole::Leader);
        let member = row(&c, MemberRole::Member, MembershipStatus::Active);
        let elder = row(&c, MemberRole::Elder, MembershipStatus::Active);

        assert_eq!(
            change_role(&leader, leader_id, &member, MemberRole::Leader),
            Ok(MemberRole::Leader)
        );
        assert_eq!(
            change_role(&leader, leader_id, &member, MemberRole::Admin),
            Err(MembershipError::RoleNotGrantable)
        );
        assert_eq!(
            change_role(&leader, leader_id, &elder, MemberRole::Member),
            Err(MembershipError::InsufficientRank)
        );
    }

    #[test]
    fn role_change_requires_active_target() {
        let c = congregation(JoinMode::Approval);
        let (admin_id, admin) = actor(&c, MemberRole::Admin);
        let pending = row(&c, MemberRole::Member, MembershipStatus::Pending);

        assert_eq!(
            change_role(&admin, admin_id, &pending, MemberRole::Deacon),
            Err(MembershipError::NotActive)
        );
    }

    #[test]
    fn ban_and_unban_cycle() {
        let c = congregation(JoinMode::Open);
        let (admin_id, admin) = actor(&c, MemberRole::Admin);
        let mut target = row(&c, MemberRole::Member, MembershipStatus::Active);

        assert_eq!(ban(&admin, admin_id, &target), Ok(MembershipStatus::Banned));
        assert_eq!(unban(&admin, admin_id, &target), Err(MembershipError::NotBanned));

        target.status = MembershipStatus::Banned.as_str().to_string();
        assert_eq!(ban(&admin, admin_id, &target), Err(MembershipError::Banned));
        assert_eq!(unban(&admin, admin_id, &target), Ok(MembershipStatus::Removed));
    }

    #[test]
    fn leave_from_active_or_pending_only() {
        let c = congregation(JoinMode::Open);
        let active = row(&c, MemberRole::Member, MembershipStatus::Active);
        let pending = row(&c, MemberRole::Member, MembershipStatus::Pending);
        let left = row(&c, MemberRole::Member, MembershipStatus::Left);

        assert_eq!(leave(Some(&active)), Ok(MembershipStatus::Left));
        assert_eq!(leave(Some(&pending)), Ok(MembershipStatus::Left));
        assert_eq!(leave(Some(&left)), Err(MembershipError::NothingToLeave));
        assert_eq!(leave(None), Err(MembershipError::NothingToLeave));
    }

    #[test]
    fn pastor_must_hand_over_before_leaving() {
        let c = congregation(JoinMode::Open);
        let pastor = row(&c, MemberRole::Pastor, MembershipStatus::Active);

        assert_eq!(leave(Some(&pastor)), Err(MembershipError::PastorMustTransfer));
    }

    #[test]
    fn primary_requires_active_membership() {
        let c = congregation(JoinMode::Open);
        let pending = row(&c, MemberRole::Member, MembershipStatus::Pending);
        let active = row(&c, MemberRole::Member, MembershipStatus::Active);

        assert_eq!(set_primary(Some(&pending)), Err(MembershipError::NotActive));
        assert_eq!(set_primary(None), Err(MembershipError::NotActive));
        assert_eq!(set_primary(Some(&active)), Ok(()));
    }

    #[test]
    fn pastor_transfer_needs_pastor_or_super_admin() {
        let c = congregation(JoinMode::Open);
        let (pastor_id, pastor) = actor(&c, MemberRole::Pastor);
        let (admin_id, admin) = actor(&c, MemberRole::Admin);
        let target = row(&c, MemberRole::Elder, MembershipStatus::Active);
        let pending = row(&c, MemberRole::Member, MembershipStatus::Pending);

        assert_eq!(transfer_pastor(&pastor, pastor_id, &target), Ok(()));
        assert_eq!(
            transfer_pastor(&admin, admin_id, &target),
            Err(MembershipError::NotPastor)
        );
        assert_eq!(
            transfer_pastor(&AccessLevel::SuperAdmin, Uuid::new_v4(), &target),
            Ok(())
        );
        assert_eq!(
            transfer_pastor(&pastor, pastor_id, &pending),
            Err(MembershipError::NotActive)
        );
    }

    #[test]
    fn invite_redemption_activates_with_invite_role() {
        let c = congregation(JoinMode::InviteOnly);
        let inv = invite(&c);

        assert_eq!(
            redeem(&inv, &c, None, Utc::now()),
            Ok(RedeemOutcome::Activate(MemberRole::Deacon))
        );

        let pending = row(&c, MemberRole::Member, MembershipStatus::Pending);
        assert_eq!(
            redeem(&inv, &c, Some(&pending), Utc::now()),
            Ok(RedeemOutcome::Activate(MemberRole::Deacon))
        );
    }

    #[test]
    fn redeeming_as_active_member_is_idempotent() {
        let c = congregation(JoinMode::InviteOnly);
        let inv = invite(&c);
        let active = row(&c, MemberRole::Member, MembershipStatus::Active);

        assert_eq!(
            redeem(&inv, &c, Some(&active), Utc::now()),
            Ok(RedeemOutcome::AlreadyMember)
        );
    }

    #[test]
    fn expired_revoked_and_exhausted_invites_are_rejected() {
        let c = congregation(JoinMode::InviteOnly);
        let now = Utc::now();

        let mut expired = invite(&c);
        expired.expires_utc = Some(now);
        assert_eq!(redeem(&expired, &c, None, now), Err(MembershipError::InviteExpired));

        let mut revoked = invite(&c);
        revoked.revoked_utc = Some(now);
        assert_eq!(redeem(&revoked, &c, None, now), Err(MembershipError::InviteRevoked));

        let mut exhausted = invite(&c);
        exhausted.use_count = 2;
        assert_eq!(
            redeem(&exhausted, &c, None, now),
            Err(MembershipError::InviteExhausted)
        );
    }

    #[test]
    fn unlimited_invite_never_exhausts() {
        let c = congregation(JoinMode::InviteOnly);
        let mut inv = invite(&c);
        inv.max_uses = None;
        inv.expires_utc = None;
        inv.use_count = 10_000;

        assert!(check_invite(&inv, Utc::now()).is_ok());
    }

    #[test]
    fn banned_users_cannot_redeem() {
        let c = congregation(JoinMode::InviteOnly);
        let inv = invite(&c);
        let banned = row(&c, MemberRole::Member, MembershipStatus::Banned);

        assert_eq!(
            redeem(&inv, &c, Some(&banned), Utc::now()),
            Err(MembershipError::Banned)
        );
    }

    #[test]
    fn invite_roles_follow_grant_rules() {
        let c = congregation(JoinMode::InviteOnly);
        let (_, leader) = actor(&c, MemberRole::Leader);

        assert!(check_invite_role(&leader, MemberRole::Member).is_ok());
        assert_eq!(
            check_invite_role(&leader, MemberRole::Admin),
            Err(MembershipError::RoleNotGrantable)
        );
        assert_eq!(
            check_invite_role(&AccessLevel::SuperAdmin, MemberRole::Pastor),
            Err(MembershipError::RoleNotGrantable)
        );
    }

    #[test]
    fn errors_map_to_http_classes() {
        assert!(matches!(
            AppError::from(MembershipError::AlreadyMember),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(MembershipError::InviteExpired),
            AppError::BadRequest(_)
        ));
        assert!(matches!(
            AppError::from(MembershipError::PastorProtected),
            AppError::Forbidden(_)
        ));
    }

    #[test]
    fn locked_row_must_match_the_decided_status() {
        let c = congregation(JoinMode::Approval);
        let pending = row(&c, MemberRole::Member, MembershipStatus::Pending);
        let left = row(&c, MemberRole::Member, MembershipStatus::Left);
        let banned = row(&c, MemberRole::Member, MembershipStatus::Banned);

        assert_eq!(check_unchanged(Some(MembershipStatus::Pending), Some(&pending)), Ok(()));
        assert_eq!(check_unchanged(None, None), Ok(()));
        assert_eq!(
            check_unchanged(Some(MembershipStatus::Pending), Some(&left)),
            Err(MembershipError::StateChanged)
        );
        assert_eq!(
            check_unchanged(Some(MembershipStatus::Active), Some(&banned)),
            Err(MembershipError::StateChanged)
        );
        assert_eq!(check_unchanged(None, Some(&pending)), Err(MembershipError::StateChanged));
    }

    #[test]
    fn redeem_rechecked_on_fresh_status() {
        assert_eq!(
            redeem_for_status(Some(MembershipStatus::Active), MemberRole::Elder),
            Ok(RedeemOutcome::AlreadyMember)
        );
        assert_eq!(
            redeem_for_status(Some(MembershipStatus::Banned), MemberRole::Elder),
            Err(MembershipError::Banned)
        );
        assert_eq!(
            redeem_for_status(Some(MembershipStatus::Removed), MemberRole::Elder),
            Ok(RedeemOutcome::Activate(MemberRole::Elder))
        );
        assert!(matches!(
            AppError::from(MembershipError::StateChanged),
            AppError::Conflict(_)
        ));
    }
}
