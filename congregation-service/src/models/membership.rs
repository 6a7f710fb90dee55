//! Membership model - a user's standing within one congregation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Congregation-level role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Member,
    Leader,
    Deacon,
    Elder,
    Pastor,
    Admin,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Member => "member",
            MemberRole::Leader => "leader",
            MemberRole::Deacon => "deacon",
            MemberRole::Elder => "elder",
            MemberRole::Pastor => "pastor",
            MemberRole::Admin => "admin",
        }
    }

    /// Position in the role hierarchy; higher outranks lower.
    pub fn rank(&self) -> u8 {
        match self {
            MemberRole::Member => 0,
            MemberRole::Leader => 1,
            MemberRole::Deacon => 2,
            MemberRole::Elder => 3,
            MemberRole::Admin => 4,
            MemberRole::Pastor => 5,
        }
    }

    /// Roles that grant congregation management rights.
    pub fn is_admin_role(&self) -> bool {
        matches!(
            self,
            MemberRole::Admin | MemberRole::Leader | MemberRole::Pastor
        )
    }
}

impl FromStr for MemberRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(MemberRole::Member),
            "leader" => Ok(MemberRole::Leader),
            "deacon" => Ok(MemberRole::Deacon),
            "elder" => Ok(MemberRole::Elder),
            "pastor" => Ok(MemberRole::Pastor),
            "admin" => Ok(MemberRole::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Membership state codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Pending,
    Active,
    Left,
    Removed,
    Banned,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Pending => "pending",
            MembershipStatus::Active => "active",
            MembershipStatus::Left => "left",
            MembershipStatus::Removed => "removed",
            MembershipStatus::Banned => "banned",
        }
    }
}

impl FromStr for MembershipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MembershipStatus::Pending),
            "active" => Ok(MembershipStatus::Active),
            "left" => Ok(MembershipStatus::Left),
            "removed" => Ok(MembershipStatus::Removed),
            "banned" => Ok(MembershipStatus::Banned),
            _ => Err(format!("Invalid membership status: {}", s)),
        }
    }
}

/// Membership entity (user x congregation).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Membership {
    pub membership_id: Uuid,
    pub congregation_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub status: String,
    pub is_primary: bool,
    pub joined_utc: Option<DateTime<Utc>>,
    pub decided_by_user_id: Option<Uuid>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Membership {
    /// Create a membership row in the given state.
    pub fn new(
        congregation_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
        status: MembershipStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            membership_id: Uuid::new_v4(),
            congregation_id,
            user_id,
            role: role.as_str().to_string(),
            status: status.as_str().to_string(),
            is_primary: false,
            joined_utc: (status == MembershipStatus::Active).then_some(now),
            decided_by_user_id: None,
            created_utc: now,
            updated_utc: now,
        }
    }

    /// Unknown stored roles carry no privileges.
    pub fn role(&self) -> MemberRole {
        self.role.parse().unwrap_or(MemberRole::Member)
    }

    /// Unknown stored statuses are treated as having left.
    pub fn status(&self) -> MembershipStatus {
        self.status.parse().unwrap_or(MembershipStatus::Left)
    }

    pub fn is_active(&self) -> bool {
        self.status() == MembershipStatus::Active
    }
}

/// Membership joined with the member's public profile, for rosters.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MemberView {
    pub membership_id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub is_primary: bool,
    pub joined_utc: Option<DateTime<Utc>>,
    pub created_utc: DateTime<Utc>,
}

/// A user's membership joined with the congregation name, for "my congregations".
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserMembershipView {
    pub membership_id: Uuid,
    pub congregation_id: Uuid,
    pub congregation_name: String,
    pub congregation_slug: String,
    pub role: String,
    pub status: String,
    pub is_primary: bool,
    pub joined_utc: Option<DateTime<Utc>>,
}
