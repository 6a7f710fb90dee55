//! Feed models: posts, comments and reactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Post {
    pub post_id: Uuid,
    pub congregation_id: Uuid,
    pub author_user_id: Uuid,
    pub body: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Post {
    pub fn new(congregation_id: Uuid, author_user_id: Uuid, body: String) -> Self {
        let now = Utc::now();
        Self {
            post_id: Uuid::new_v4(),
            congregation_id,
            author_user_id,
            body,
            created_utc: now,
            updated_utc: now,
        }
    }
}

/// Post as shown in the feed, with author and engagement counts.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FeedPost {
    pub post_id: Uuid,
    pub congregation_id: Uuid,
    pub author_user_id: Uuid,
    pub author_name: String,
    pub body: String,
    pub comment_count: i64,
    pub reaction_count: i64,
    pub viewer_reaction: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Comment {
    pub comment_id: Uuid,
    pub post_id: Uuid,
    pub author_user_id: Uuid,
    pub body: String,
    pub created_utc: DateTime<Utc>,
}

impl Comment {
    pub fn new(post_id: Uuid, author_user_id: Uuid, body: String) -> Self {
        Self {
            comment_id: Uuid::new_v4(),
            post_id,
            author_user_id,
            body,
            created_utc: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CommentView {
    pub comment_id: Uuid,
    pub post_id: Uuid,
    pub author_user_id: Uuid,
    pub author_name: String,
    pub body: String,
    pub created_utc: DateTime<Utc>,
}

/// One reaction per user per post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Amen,
    Pray,
    Heart,
}

impl ReactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Amen => "amen",
            ReactionKind::Pray => "pray",
            ReactionKind::Heart => "heart",
        }
    }
}
