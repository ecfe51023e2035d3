use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Account role; new registrations always start as `Patient`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
    Admin,
}

/// Public projection of a user row. The password hash is never part of the
/// column list that produces this type.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Credential-bearing projection, returned only by the login/registration
/// lookup. Deliberately not `Serialize`.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

/// Fields a recognized duplicate registration may fill in on an existing
/// record. Only columns that are currently NULL are ever written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactBackfill {
    pub phone: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
}

impl ContactBackfill {
    pub fn is_empty(&self) -> bool {
        self.phone.is_none() && self.age.is_none() && self.gender.is_none()
    }
}
