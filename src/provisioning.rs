//! Turns a matricula record into a sign-in capable auth account.

use sqlx::PgPool;

use crate::auth::password;
use crate::db;
use crate::error::{AppError, is_unique_violation};
use crate::matricula::{self, LoginType, MatriculaRecord};
use crate::models::{Role, User};
use crate::validation::digits_only;

#[derive(Debug)]
pub struct Provisioned {
    pub user: User,
    pub record: MatriculaRecord,
    /// False when the auth account already existed.
    pub created: bool,
}

/// Resolve and validate the record behind `raw_matricula`, then ensure it has an
/// auth account with the matching role. Existing accounts keep their password.
pub async fn provision(
    pool: &PgPool,
    login_type: LoginType,
    raw_matricula: &str,
) -> Result<Provisioned, AppError> {
    let matricula = matricula::normalize(raw_matricula, login_type)
        .ok_or_else(|| AppError::BadRequest("Invalid matricula".to_string()))?;

    let record = matricula::find_record(pool, login_type, &matricula)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} not found", login_type.noun())))?;

    if !record.is_active() {
        return Err(AppError::Forbidden(format!("{} inactive", login_type.noun())));
    }

    let email = record.email().trim().to_string();
    let cpf = digits_only(record.cpf());
    if email.is_empty() || cpf.is_empty() {
        return Err(AppError::BadRequest("Missing email/cpf".to_string()));
    }

    let (user, created) = match db::users::find_by_email(pool, &email).await? {
        Some(user) => (user, false),
        None => {
            let pw_hash = password::hash(&cpf).map_err(AppError::Internal)?;
            match db::users::create(pool, &email, &pw_hash, record.full_name(), true).await {
                Ok(user) => (user, true),
                // Lost a race with a concurrent provision of the same email.
                Err(e) if is_unique_violation(&e) => {
                    let user = db::users::find_by_email(pool, &email)
                        .await?
                        .ok_or_else(|| AppError::Internal(format!("User {email} vanished")))?;
                    (user, false)
                }
                Err(e) => return Err(e.into()),
            }
        }
    };

    let role = match login_type {
        LoginType::Admin => Role::Admin,
        LoginType::Client => Role::Client,
    };

    let mut tx = pool.begin().await?;
    db::user_roles::assign(&mut *tx, user.id, role).await?;
    match &record {
        MatriculaRecord::Client(c) => db::clients::link_user(&mut *tx, c.id, user.id).await?,
        MatriculaRecord::Admin(a) => db::admins::link_user(&mut *tx, a.id, user.id).await?,
    }
    tx.commit().await?;

    if created {
        tracing::info!(user_id = %user.id, %matricula, "Provisioned {} account", role);
    }

    Ok(Provisioned {
        user,
        record,
        created,
    })
}
