use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database. Users are created unverified and are never
/// deleted; the activation code stays in place even after a successful
/// activation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub address: Option<String>,
    pub image: Option<String>,
    #[serde(skip_serializing)]
    pub activation_code: i32,
    pub verified: bool,
    pub created_at: OffsetDateTime,
}

const COLUMNS: &str = "id, first_name, last_name, email, password_hash, address, image, \
                       activation_code, verified, created_at";

/// Fields persisted at registration time. The password arrives here already
/// hashed; the image is an object-store key.
pub struct NewUser<'a> {
    pub id: Uuid,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub address: Option<&'a str>,
    pub image: Option<&'a str>,
    pub activation_code: i32,
}

/// Partial profile update. `None` fields are left untouched.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub password_hash: Option<String>,
    pub image: Option<String>,
}

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    pub async fn create(db: &PgPool, new: NewUser<'_>) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users
                (id, first_name, last_name, email, password_hash, address, image, activation_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(new.id)
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.address)
        .bind(new.image)
        .bind(new.activation_code)
        .fetch_one(db)
        .await
    }

    /// Atomic find-and-update: the email/code match and the verified flip
    /// happen in one statement, so a wrong code can never mark anyone
    /// verified. Returns `None` when no record matches both.
    pub async fn activate(db: &PgPool, email: &str, code: i32) -> anyhow::Result<Option<Uuid>> {
        let row = sqlx::query_as::<_, (Uuid,)>(
            r#"
            UPDATE users SET verified = TRUE
            WHERE email = $1 AND activation_code = $2
            RETURNING id
            "#,
        )
        .bind(email)
        .bind(code)
        .fetch_optional(db)
        .await?;
        Ok(row.map(|(id,)| id))
    }

    /// Applies only the supplied fields; the row is always the caller's own
    /// (the id comes from verified token claims). Email is deliberately not
    /// updatable — task ownership is keyed on it.
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        update: ProfileUpdate,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                first_name    = COALESCE($2, first_name),
                last_name     = COALESCE($3, last_name),
                address       = COALESCE($4, address),
                password_hash = COALESCE($5, password_hash),
                image         = COALESCE($6, image)
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.first_name)
        .bind(update.last_name)
        .bind(update.address)
        .bind(update.password_hash)
        .bind(update.image)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }
}
