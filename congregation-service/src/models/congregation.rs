//! Congregation model - the tenant boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// How new members get in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinMode {
    Open,
    Approval,
    #[serde(alias = "invite")]
    InviteOnly,
}

impl JoinMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinMode::Open => "open",
            JoinMode::Approval => "approval",
            JoinMode::InviteOnly => "invite_only",
        }
    }
}

impl FromStr for JoinMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(JoinMode::Open),
            "approval" => Ok(JoinMode::Approval),
            "invite_only" | "invite" => Ok(JoinMode::InviteOnly),
            _ => Err(format!("Invalid join mode: {}", s)),
        }
    }
}

/// Congregation state codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CongregationStatus {
    Active,
    Suspended,
}

impl CongregationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CongregationStatus::Active => "active",
            CongregationStatus::Suspended => "suspended",
        }
    }
}

/// Congregation entity.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Congregation {
    pub congregation_id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub join_mode: String,
    pub status: String,
    pub created_by_user_id: Uuid,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Congregation {
    /// Create a new, active congregation.
    pub fn new(
        slug: String,
        name: String,
        description: Option<String>,
        join_mode: JoinMode,
        created_by_user_id: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            congregation_id: Uuid::new_v4(),
            slug,
            name,
            description,
            join_mode: join_mode.as_str().to_string(),
            status: CongregationStatus::Active.as_str().to_string(),
            created_by_user_id,
            created_utc: now,
            updated_utc: now,
        }
    }

    /// Unknown stored values fall back to the most restrictive mode.
    pub fn join_mode(&self) -> JoinMode {
        self.join_mode.parse().unwrap_or(JoinMode::InviteOnly)
    }

    pub fn is_active(&self) -> bool {
        self.status == CongregationStatus::Active.as_str()
    }

    /// Invite-only congregations are hidden from non-members.
    pub fn is_private(&self) -> bool {
        self.join_mode() == JoinMode::InviteOnly
    }
}

/// Derive a URL slug from a display name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("St. Mark's  Chapel!"), "st-mark-s-chapel");
        assert_eq!(slugify("  Grace Fellowship "), "grace-fellowship");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn join_mode_accepts_invite_alias() {
        assert_eq!("invite".parse::<JoinMode>().unwrap(), JoinMode::InviteOnly);
        assert_eq!("invite_only".parse::<JoinMode>().unwrap(), JoinMode::InviteOnly);
        assert!("closed".parse::<JoinMode>().is_err());

        let mode: JoinMode = serde_json::from_str("\"invite\"").unwrap();
        assert_eq!(mode, JoinMode::InviteOnly);
    }

    #[test]
    fn unknown_join_mode_is_private() {
        let mut congregation = Congregation::new(
            "grace".into(),
            "Grace".into(),
            None,
            JoinMode::Open,
            Uuid::new_v4(),
        );
        assert!(!congregation.is_private());

        congregation.join_mode = "mystery".into();
        assert!(congregation.is_private());
    }
}
