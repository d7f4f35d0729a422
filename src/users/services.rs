use sqlx::PgConnection;
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::services::{datetime::ensure_utc, password::hash_password};
use crate::users::{
    errors::UserError,
    repo::UserChanges,
    repo_types::{NewUser, User, UserPatch},
};

pub const DEFAULT_OFFSET: i64 = 0;
pub const DEFAULT_LIMIT: i64 = 100;

/// A concurrent writer can claim the email between the lookup and the write; the
/// unique index then rejects ours.
fn email_conflict(err: sqlx::Error, email: &str) -> UserError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            warn!(%email, "email claimed concurrently");
            return UserError::AlreadyExists {
                email: email.to_string(),
            };
        }
    }
    UserError::Database(err)
}

#[instrument(skip(conn, new_user), fields(email = %new_user.email))]
pub async fn create(conn: &mut PgConnection, new_user: NewUser) -> Result<User, UserError> {
    if User::find_by_email(&mut *conn, &new_user.email).await?.is_some() {
        warn!("email already registered");
        return Err(UserError::AlreadyExists {
            email: new_user.email,
        });
    }

    let hashed_password = hash_password(&new_user.password).map_err(UserError::Password)?;
    let user = User::insert(
        &mut *conn,
        Uuid::new_v4(),
        &new_user.first_name,
        &new_user.last_name,
        &new_user.email,
        &hashed_password,
        new_user.is_superuser,
    )
    .await
    .map_err(|e| email_conflict(e, &new_user.email))?;

    info!(user_id = %user.id, "user created");
    Ok(user)
}

pub async fn get_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<User>, UserError> {
    Ok(User::find_by_id(conn, id).await?)
}

pub async fn get_by_email(conn: &mut PgConnection, email: &str) -> Result<Option<User>, UserError> {
    Ok(User::find_by_email(conn, email).await?)
}

/// Like [`get_by_id`] but a missing row is an error.
pub async fn get_existing(conn: &mut PgConnection, id: Uuid) -> Result<User, UserError> {
    get_by_id(conn, id)
        .await?
        .ok_or(UserError::IdDoesNotExist { id })
}

pub async fn list(conn: &mut PgConnection, offset: i64, limit: i64) -> Result<Vec<User>, UserError> {
    let users = User::list(conn, offset, limit).await?;
    debug!(offset, limit, returned = users.len(), "listed users");
    Ok(users)
}

/// Apply the fields set in `patch`. The password, if present, is rehashed.
#[instrument(skip(conn, patch), fields(user_id = %id))]
pub async fn update(conn: &mut PgConnection, id: Uuid, patch: UserPatch) -> Result<User, UserError> {
    if let Some(email) = &patch.email {
        if let Some(owner) = User::find_by_email(&mut *conn, email).await? {
            if owner.id != id {
                warn!(%email, "email already registered to another user");
                return Err(UserError::AlreadyExists {
                    email: email.clone(),
                });
            }
        }
    }

    let hashed_password = patch
        .password
        .as_deref()
        .map(hash_password)
        .transpose()
        .map_err(UserError::Password)?;

    let deleted_at = patch.deleted_at.map(ensure_utc).transpose()?;

    let email = patch.email.clone();
    let changes = UserChanges {
        first_name: patch.first_name,
        last_name: patch.last_name,
        email: patch.email,
        is_superuser: patch.is_superuser,
        hashed_password,
        deleted_at,
    };

    let user = User::apply_changes(&mut *conn, id, changes)
        .await
        .map_err(|e| match &email {
            Some(email) => email_conflict(e, email),
            None => UserError::Database(e),
        })?
        .ok_or(UserError::IdDoesNotExist { id })?;
    info!("user updated");
    Ok(user)
}

/// Mark the user deleted. The row stays in the table.
#[instrument(skip(conn), fields(user_id = %id))]
pub async fn soft_delete(conn: &mut PgConnection, id: Uuid) -> Result<User, UserError> {
    let user = get_existing(&mut *conn, id).await?;
    if let Some(deleted_at) = user.deleted_at {
        warn!(%deleted_at, "user has been previously deleted");
        return Err(UserError::PreviouslyDeleted {
            email: user.email,
            deleted_at,
        });
    }

    let patch = UserPatch {
        deleted_at: Some(OffsetDateTime::now_utc()),
        ..UserPatch::default()
    };
    let user = update(conn, id, patch).await?;
    info!("user soft deleted");
    Ok(user)
}
