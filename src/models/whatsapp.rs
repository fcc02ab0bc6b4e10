use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    InstanceStatus ("instance status") {
        Disconnected => "disconnected",
        Connecting => "connecting",
        Connected => "connected",
        Error => "error",
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct WhatsappInstance {
    pub id: Uuid,
    pub user_id: Uuid,
    pub instance_name: String,
    pub phone_number: Option<String>,
    pub status: String,
    pub is_ai_active: bool,
    pub qr_code: Option<String>,
    #[serde(skip)]
    pub session_data_enc: Option<Vec<u8>>,
    pub last_connected_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WhatsappInstance {
    pub fn has_session(&self) -> bool {
        self.session_data_enc.is_some()
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct WhatsappContact {
    pub id: Uuid,
    pub instance_id: Uuid,
    pub phone_number: String,
    pub name: Option<String>,
    pub profile_pic_url: Option<String>,
    pub is_online: bool,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub unread_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct WhatsappMessage {
    pub id: Uuid,
    pub instance_id: Uuid,
    pub contact_id: Uuid,
    pub content: Option<String>,
    pub media_type: Option<String>,
    pub media_url: Option<String>,
    pub is_from_me: bool,
    pub is_ai_response: bool,
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
