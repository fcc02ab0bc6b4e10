use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    RequestStatus ("request status") {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AccountRequest {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub cpf: Option<String>,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub segmento: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub message: Option<String>,
    pub status: String,
    pub matricula: String,
    pub rejection_reason: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl AccountRequest {
    pub fn status(&self) -> Option<RequestStatus> {
        self.status.parse().ok()
    }
}
