//! Course and lesson models with per-user progress.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Course {
    pub course_id: Uuid,
    pub congregation_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub published: bool,
    pub created_by_user_id: Uuid,
    pub created_utc: DateTime<Utc>,
}

impl Course {
    pub fn new(
        congregation_id: Uuid,
        title: String,
        description: Option<String>,
        published: bool,
        created_by_user_id: Uuid,
    ) -> Self {
        Self {
            course_id: Uuid::new_v4(),
            congregation_id,
            title,
            description,
            published,
            created_by_user_id,
            created_utc: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Lesson {
    pub lesson_id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub body: String,
    pub position: i32,
    pub created_utc: DateTime<Utc>,
}

impl Lesson {
    pub fn new(course_id: Uuid, title: String, body: String, position: i32) -> Self {
        Self {
            lesson_id: Uuid::new_v4(),
            course_id,
            title,
            body,
            position,
            created_utc: Utc::now(),
        }
    }
}

/// Lesson with the viewer's completion time.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LessonWithProgress {
    pub lesson_id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub body: String,
    pub position: i32,
    pub completed_utc: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseProgress {
    pub course_id: Uuid,
    pub completed_lessons: i64,
    pub total_lessons: i64,
    pub percent_complete: u8,
}

impl CourseProgress {
    pub fn new(course_id: Uuid, completed_lessons: i64, total_lessons: i64) -> Self {
        let percent_complete = if total_lessons <= 0 {
            0
        } else {
            ((completed_lessons.clamp(0, total_lessons) * 100) / total_lessons) as u8
        };
        Self {
            course_id,
            completed_lessons,
            total_lessons,
            percent_complete,
        }
    }
}
