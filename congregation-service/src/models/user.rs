//! User model - global identities that join congregations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Global (cross-congregation) role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalRole {
    User,
    SuperAdmin,
}

impl GlobalRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            GlobalRole::User => "user",
            GlobalRole::SuperAdmin => "super_admin",
        }
    }
}

/// User entity.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub global_role: String,
    pub created_utc: DateTime<Utc>,
}

impl User {
    /// Create a new user.
    pub fn new(
        email: String,
        display_name: String,
        password_hash: String,
        global_role: GlobalRole,
    ) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            email,
            display_name,
            password_hash,
            global_role: global_role.as_str().to_string(),
            created_utc: Utc::now(),
        }
    }

    pub fn is_super_admin(&self) -> bool {
        self.global_role == GlobalRole::SuperAdmin.as_str()
    }

    /// Public view without credentials.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            user_id: self.user_id,
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            global_role: self.global_role.clone(),
            created_utc: self.created_utc,
        }
    }
}

/// User response for API (without sensitive fields).
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub global_role: String,
    pub created_utc: DateTime<Utc>,
}
