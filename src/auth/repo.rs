use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{ContactBackfill, User, UserCredentials};

const PUBLIC_COLUMNS: &str = "id, name, email, role, phone, age, gender, created_at";

impl User {
    /// Fetch the public projection by id.
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {PUBLIC_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user. The caller supplies an already-hashed password.
    /// A unique-violation on email is returned as-is for the handler to map.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
        phone: Option<&str>,
        age: Option<i32>,
        gender: Option<&str>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, phone, age, gender)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PUBLIC_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(phone)
        .bind(age)
        .bind(gender)
        .fetch_one(db)
        .await
    }

    /// Fill in contact fields that are still NULL; existing values win.
    pub async fn backfill_contact(
        db: &PgPool,
        id: Uuid,
        backfill: &ContactBackfill,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET phone  = COALESCE(phone, $2),
                age    = COALESCE(age, $3),
                gender = COALESCE(gender, $4)
            WHERE id = $1
            RETURNING {PUBLIC_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(backfill.phone.as_deref())
        .bind(backfill.age)
        .bind(backfill.gender.as_deref())
        .fetch_one(db)
        .await?;
        Ok(user)
    }
}

impl UserCredentials {
    /// Find a user by email, including the normally hidden password hash.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<UserCredentials>> {
        let row = sqlx::query_as::<_, UserCredentials>(&format!(
            "SELECT {PUBLIC_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }
}

/// True when the error is the email unique-index firing, i.e. a concurrent or
/// repeated registration lost the race to an existing row.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}
