use chrono::{DateTime, Utc};
use service_core::error::AppError;
use uuid::Uuid;

use super::Database;
use crate::models::{Comment, CommentView, FeedPost, Post, ReactionKind};

const FEED_SELECT: &str = r#"
    SELECT p.post_id, p.congregation_id, p.author_user_id, u.display_name AS author_name, p.body,
           (SELECT COUNT(*) FROM post_comments c WHERE c.post_id = p.post_id) AS comment_count,
           (SELECT COUNT(*) FROM post_reactions r WHERE r.post_id = p.post_id) AS reaction_count,
           (SELECT r.kind FROM post_reactions r
             WHERE r.post_id = p.post_id AND r.user_id = $1) AS viewer_reaction,
           p.created_utc, p.updated_utc
    FROM posts p
    JOIN users u ON u.user_id = p.author_user_id
"#;

impl Database {
    // ==================== Post Operations ====================

    /// Newest first; `before` pages backwards by creation time.
    pub async fn list_feed(
        &self,
        congregation_id: Uuid,
        viewer_id: Uuid,
        before: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<FeedPost>, AppError> {
        let query = format!(
            "{} WHERE p.congregation_id = $2 AND ($3::timestamptz IS NULL OR p.created_utc < $3) \
             ORDER BY p.created_utc DESC LIMIT $4",
            FEED_SELECT
        );
        let posts = sqlx::query_as::<_, FeedPost>(&query)
            .bind(viewer_id)
            .bind(congregation_id)
            .bind(before)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }

    pub async fn find_feed_post(
        &self,
        post_id: Uuid,
        viewer_id: Uuid,
    ) -> Result<Option<FeedPost>, AppError> {
        let query = format!("{} WHERE p.post_id = $2", FEED_SELECT);
        let post = sqlx::query_as::<_, FeedPost>(&query)
            .bind(viewer_id)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    pub async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE post_id = $1")
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    pub async fn insert_post(&self, post: &Post) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO posts (post_id, congregation_id, author_user_id, body, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(post.post_id)
        .bind(post.congregation_id)
        .bind(post.author_user_id)
        .bind(&post.body)
        .bind(post.created_utc)
        .bind(post.updated_utc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update_post_body(&self, post_id: Uuid, body: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE posts SET body = $2, updated_utc = now() WHERE post_id = $1")
            .bind(post_id)
            .bind(body)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_post(&self, post_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM posts WHERE post_id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ==================== Comment Operations ====================

    pub async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentView>, AppError> {
        let comments = sqlx::query_as::<_, CommentView>(
            r#"
            SELECT c.comment_id, c.post_id, c.author_user_id, u.display_name AS author_name,
                   c.body, c.created_utc
            FROM post_comments c
            JOIN users u ON u.user_id = c.author_user_id
            WHERE c.post_id = $1
            ORDER BY c.created_utc ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    pub async fn find_comment(&self, comment_id: Uuid) -> Result<Option<Comment>, AppError> {
        let comment =
            sqlx::query_as::<_, Comment>("SELECT * FROM post_comments WHERE comment_id = $1")
                .bind(comment_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(comment)
    }

    pub async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO post_comments (comment_id, post_id, author_user_id, body, created_utc)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(comment.comment_id)
        .bind(comment.post_id)
        .bind(comment.author_user_id)
        .bind(&comment.body)
        .bind(comment.created_utc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete_comment(&self, comment_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM post_comments WHERE comment_id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ==================== Reaction Operations ====================

    /// One reaction per user per post; a second call replaces the kind.
    pub async fn set_reaction(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        kind: ReactionKind,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO post_reactions (post_id, user_id, kind, created_utc)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (post_id, user_id) DO UPDATE SET kind = EXCLUDED.kind
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .bind(kind.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn clear_reaction(&self, post_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM post_reactions WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
