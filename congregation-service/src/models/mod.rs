//! Domain models for congregation-service.

pub mod congregation;
pub mod course;
pub mod event;
pub mod invite;
pub mod livestream;
pub mod membership;
pub mod notification;
pub mod post;
pub mod sermon;
pub mod user;

pub use congregation::{slugify, Congregation, CongregationStatus, JoinMode};
pub use course::{Course, CourseProgress, Lesson, LessonWithProgress};
pub use event::{Event, RsvpCounts, RsvpStatus};
pub use invite::{Invite, InviteResponse};
pub use livestream::{ChatMessage, Livestream, LivestreamStatus};
pub use membership::{MemberRole, MemberView, Membership, MembershipStatus, UserMembershipView};
pub use notification::{Notification, NotificationKind};
pub use post::{Comment, CommentView, FeedPost, Post, ReactionKind};
pub use sermon::Sermon;
pub use user::{GlobalRole, User, UserProfile};
