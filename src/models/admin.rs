use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Administrator record, addressed at login by a 7-digit matricula.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AdminRecord {
    pub id: Uuid,
    pub matricula: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub cpf: String,
    pub full_name: String,
    pub is_active: bool,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
