use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    AnnouncementPriority ("announcement priority") {
        Normal => "normal",
        Important => "important",
        Urgent => "urgent",
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub priority: String,
    pub target_all: bool,
    pub target_plans: Vec<String>,
    pub target_users: Vec<Uuid>,
    pub attachment_url: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// An announcement as seen by one recipient.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct UserAnnouncement {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub priority: String,
    pub attachment_url: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub read: bool,
}
