use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    /// Ordered from least to most privileged.
    Role ("role") {
        Client => "client",
        Admin => "admin",
        SuperAdmin => "super_admin",
    }
}

impl Role {
    fn rank(&self) -> u8 {
        match self {
            Role::Client => 0,
            Role::Admin => 1,
            Role::SuperAdmin => 2,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }

    /// Highest role in the set; `None` when the user holds no role.
    pub fn highest<I: IntoIterator<Item = Role>>(roles: I) -> Option<Role> {
        roles.into_iter().max_by_key(Role::rank)
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct UserRole {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub created_at: DateTime<Utc>,
}
