//! Matricula numbers: the 6-digit (client) and 7-digit (admin) login identifiers.

use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::db;
use crate::models::{AdminRecord, Client, RequestStatus};
use crate::validation::digits_only;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginType {
    Admin,
    Client,
}

impl LoginType {
    pub fn expected_len(self) -> usize {
        match self {
            LoginType::Admin => 7,
            LoginType::Client => 6,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "admin" => Some(LoginType::Admin),
            "client" => Some(LoginType::Client),
            _ => None,
        }
    }

    /// Capitalised noun used in error messages.
    pub fn noun(self) -> &'static str {
        match self {
            LoginType::Admin => "Admin",
            LoginType::Client => "Client",
        }
    }
}

/// Strip punctuation and check the digit count for `login_type`.
pub fn normalize(raw: &str, login_type: LoginType) -> Option<String> {
    let digits = digits_only(raw);
    (digits.len() == login_type.expected_len()).then_some(digits)
}

/// Uniform random matricula with exactly `len` digits (no leading zero).
pub fn generate(len: u32) -> String {
    let low = 10u64.pow(len - 1);
    let high = 10u64.pow(len);
    rand::rng().random_range(low..high).to_string()
}

/// A record addressed by a matricula.
#[derive(Debug, Clone)]
pub enum MatriculaRecord {
    Client(Client),
    Admin(AdminRecord),
}

impl MatriculaRecord {
    pub fn email(&self) -> &str {
        match self {
            MatriculaRecord::Client(c) => &c.email,
            MatriculaRecord::Admin(a) => &a.email,
        }
    }

    pub fn cpf(&self) -> &str {
        match self {
            MatriculaRecord::Client(c) => &c.cpf,
            MatriculaRecord::Admin(a) => &a.cpf,
        }
    }

    pub fn full_name(&self) -> &str {
        match self {
            MatriculaRecord::Client(c) => &c.full_name,
            MatriculaRecord::Admin(a) => &a.full_name,
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            MatriculaRecord::Client(c) => c.can_sign_in(),
            MatriculaRecord::Admin(a) => a.is_active,
        }
    }
}

pub async fn find_record(
    pool: &PgPool,
    login_type: LoginType,
    matricula: &str,
) -> Result<Option<MatriculaRecord>, sqlx::Error> {
    Ok(match login_type {
        LoginType::Client => db::clients::find_by_matricula(pool, matricula)
            .await?
            .map(MatriculaRecord::Client),
        LoginType::Admin => db::admins::find_by_matricula(pool, matricula)
            .await?
            .map(MatriculaRecord::Admin),
    })
}

/// Where a matricula stands, without exposing the record behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatriculaLookup {
    Active,
    Inactive,
    Pending,
    Rejected(Option<String>),
    NotFound,
}

impl MatriculaLookup {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatriculaLookup::Active => "active",
            MatriculaLookup::Inactive => "inactive",
            MatriculaLookup::Pending => "pending",
            MatriculaLookup::Rejected(_) => "rejected",
            MatriculaLookup::NotFound => "not_found",
        }
    }
}

/// Clients are resolved against approved clients first, then signup requests.
pub async fn lookup(
    pool: &PgPool,
    login_type: LoginType,
    matricula: &str,
) -> Result<MatriculaLookup, sqlx::Error> {
    if let Some(record) = find_record(pool, login_type, matricula).await? {
        return Ok(if record.is_active() {
            MatriculaLookup::Active
        } else {
            MatriculaLookup::Inactive
        });
    }

    if login_type == LoginType::Admin {
        return Ok(MatriculaLookup::NotFound);
    }

    let Some(request) = db::account_requests::find_by_matricula(pool, matricula).await? else {
        return Ok(MatriculaLookup::NotFound);
    };

    Ok(match request.status() {
        Some(RequestStatus::Pending) => MatriculaLookup::Pending,
        Some(RequestStatus::Rejected) => MatriculaLookup::Rejected(request.rejection_reason),
        // Approved requests always have a client row; reaching here means it was removed.
        Some(RequestStatus::Approved) | None => MatriculaLookup::NotFound,
    })
}
