use sqlx::{PgConnection, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::{User, USER_COLUMNS};

/// Column values written on update; the password is already hashed.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub is_superuser: Option<bool>,
    pub hashed_password: Option<String>,
    pub deleted_at: Option<OffsetDateTime>,
}

impl User {
    /// Find a user by id, whatever its deletion state.
    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Find a user by email.
    pub async fn find_by_email(conn: &mut PgConnection, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Page through users ordered by first name, last name, then id.
    pub async fn list(conn: &mut PgConnection, offset: i64, limit: i64) -> sqlx::Result<Vec<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            ORDER BY first_name ASC, last_name ASC, id ASC
            OFFSET $1
            LIMIT $2
            "#
        ))
        .bind(offset)
        .bind(limit)
        .fetch_all(&mut *conn)
        .await
    }

    /// Insert a user; `created_at` and `updated_at` are filled by the database.
    pub async fn insert(
        conn: &mut PgConnection,
        id: Uuid,
        first_name: &str,
        last_name: &str,
        email: &str,
        hashed_password: &str,
        is_superuser: bool,
    ) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, first_name, last_name, email, hashed_password, is_superuser)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(hashed_password)
        .bind(is_superuser)
        .fetch_one(&mut *conn)
        .await
    }

    /// Apply `changes` to one row. Returns `None` if the id is unknown.
    pub async fn apply_changes(
        conn: &mut PgConnection,
        id: Uuid,
        changes: UserChanges,
    ) -> sqlx::Result<Option<User>> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET ");
        let mut set = qb.separated(", ");
        if let Some(v) = changes.first_name {
            set.push("first_name = ").push_bind_unseparated(v);
        }
        if let Some(v) = changes.last_name {
            set.push("last_name = ").push_bind_unseparated(v);
        }
        if let Some(v) = changes.email {
            set.push("email = ").push_bind_unseparated(v);
        }
        if let Some(v) = changes.is_superuser {
            set.push("is_superuser = ").push_bind_unseparated(v);
        }
        if let Some(v) = changes.hashed_password {
            set.push("hashed_password = ").push_bind_unseparated(v);
        }
        if let Some(v) = changes.deleted_at {
            set.push("deleted_at = ").push_bind_unseparated(v);
        }
        // An empty change set still bumps updated_at through the trigger.
        set.push("id = id");

        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(USER_COLUMNS);

        let user = qb
            .build_query_as::<User>()
            .fetch_optional(&mut *conn)
            .await?;
        Ok(user)
    }

    pub async fn count(conn: &mut PgConnection) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *conn)
            .await
    }
}
