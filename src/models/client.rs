use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    ClientStatus ("client status") {
        Active => "active",
        Inactive => "inactive",
        Suspended => "suspended",
    }
}

/// An approved tenant. Doubles as the tenant's profile.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub matricula: String,
    pub email: String,
    pub cpf: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub segmento: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub plan: String,
    pub status: String,
    pub is_active: bool,
    pub trial_days: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub observations: Option<String>,
    pub user_id: Option<Uuid>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// Both the flag and the status must agree for the client to sign in.
    pub fn can_sign_in(&self) -> bool {
        self.is_active && self.status == ClientStatus::Active.as_str()
    }
}
