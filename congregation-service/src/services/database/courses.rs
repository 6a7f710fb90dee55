use service_core::error::AppError;
use uuid::Uuid;

use super::Database;
use crate::models::{Course, Lesson, LessonWithProgress};

impl Database {
    // ==================== Course Operations ====================

    pub async fn list_courses(
        &self,
        congregation_id: Uuid,
        include_unpublished: bool,
    ) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(
            r#"
            SELECT * FROM courses
            WHERE congregation_id = $1 AND (published OR $2)
            ORDER BY created_utc DESC
            "#,
        )
        .bind(congregation_id)
        .bind(include_unpublished)
        .fetch_all(&self.pool)
        .await?;
        Ok(courses)
    }

    pub async fn find_course(&self, course_id: Uuid) -> Result<Option<Course>, AppError> {
        let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE course_id = $1")
            .bind(course_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(course)
    }

    pub async fn insert_course(&self, course: &Course) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO courses
                (course_id, congregation_id, title, description, published, created_by_user_id, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(course.course_id)
        .bind(course.congregation_id)
        .bind(&course.title)
        .bind(&course.description)
        .bind(course.published)
        .bind(course.created_by_user_id)
        .bind(course.created_utc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update_course(&self, course: &Course) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE courses SET title = $2, description = $3, published = $4 WHERE course_id = $1",
        )
        .bind(course.course_id)
        .bind(&course.title)
        .bind(&course.description)
        .bind(course.published)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete_course(&self, course_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM courses WHERE course_id = $1")
            .bind(course_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ==================== Lesson Operations ====================

    /// Lessons in position order with the viewer's completion time.
    pub async fn list_lessons(
        &self,
        course_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<LessonWithProgress>, AppError> {
        let lessons = sqlx::query_as::<_, LessonWithProgress>(
            r#"
            SELECT l.lesson_id, l.course_id, l.title, l.body, l.position, p.completed_utc
            FROM lessons l
            LEFT JOIN lesson_progress p ON p.lesson_id = l.lesson_id AND p.user_id = $2
            WHERE l.course_id = $1
            ORDER BY l.position ASC, l.created_utc ASC
            "#,
        )
        .bind(course_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lessons)
    }

    pub async fn find_lesson(&self, lesson_id: Uuid) -> Result<Option<Lesson>, AppError> {
        let lesson = sqlx::query_as::<_, Lesson>("SELECT * FROM lessons WHERE lesson_id = $1")
            .bind(lesson_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(lesson)
    }

    /// Position after the current last lesson.
    pub async fn next_lesson_position(&self, course_id: Uuid) -> Result<i32, AppError> {
        let position = sqlx::query_scalar::<_, i32>(
            "SELECT COALESCE(MAX(position), 0) + 1 FROM lessons WHERE course_id = $1",
        )
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(position)
    }

    pub async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO lessons (lesson_id, course_id, title, body, position, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(lesson.lesson_id)
        .bind(lesson.course_id)
        .bind(&lesson.title)
        .bind(&lesson.body)
        .bind(lesson.position)
        .bind(lesson.created_utc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update_lesson(&self, lesson: &Lesson) -> Result<(), AppError> {
        sqlx::query("UPDATE lessons SET title = $2, body = $3, position = $4 WHERE lesson_id = $1")
            .bind(lesson.lesson_id)
            .bind(&lesson.title)
            .bind(&lesson.body)
            .bind(lesson.position)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_lesson(&self, lesson_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM lessons WHERE lesson_id = $1")
            .bind(lesson_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ==================== Progress Operations ====================

    /// Idempotent: completing twice keeps the first completion time.
    pub async fn mark_lesson_complete(&self, lesson_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO lesson_progress (lesson_id, user_id, completed_utc)
            VALUES ($1, $2, now())
            ON CONFLICT (lesson_id, user_id) DO NOTHING
            "#,
        )
        .bind(lesson_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn clear_lesson_progress(&self, lesson_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM lesson_progress WHERE lesson_id = $1 AND user_id = $2")
            .bind(lesson_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// `(completed, total)` lesson counts for one user.
    pub async fn course_progress_counts(
        &self,
        course_id: Uuid,
        user_id: Uuid,
    ) -> Result<(i64, i64), AppError> {
        let counts = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(p.lesson_id), COUNT(l.lesson_id)
            FROM lessons l
            LEFT JOIN lesson_progress p ON p.lesson_id = l.lesson_id AND p.user_id = $2
            WHERE l.course_id = $1
            "#,
        )
        .bind(course_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }
}
