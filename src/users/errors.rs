use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::services::datetime::{utc_isoformat, DatetimeError};

#[derive(Debug, Error)]
pub enum UserError {
    /// Emails are unique across every row, soft-deleted ones included.
    #[error("User {email} already exists. Cannot create a user who already exists.")]
    AlreadyExists { email: String },

    #[error("User id {id} does not exist.")]
    IdDoesNotExist { id: Uuid },

    #[error("User {email} has been previously deleted at {}.", utc_isoformat(.deleted_at))]
    PreviouslyDeleted {
        email: String,
        deleted_at: OffsetDateTime,
    },

    #[error("password hashing failed")]
    Password(#[source] anyhow::Error),

    #[error(transparent)]
    Datetime(#[from] DatetimeError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl UserError {
    /// True for failures that are not the caller's fault.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            UserError::Password(_) | UserError::Datetime(_) | UserError::Database(_)
        )
    }
}
