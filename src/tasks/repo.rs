use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Task record. `creator_email` is the owning identity, fixed at creation;
/// every read and delete filters on (id AND creator_email) together — a
/// matching id under another owner looks exactly like a missing row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub creator_email: String,
    pub created_at: OffsetDateTime,
}

const COLUMNS: &str = "id, title, description, creator_email, created_at";

impl Task {
    pub async fn create(
        db: &PgPool,
        creator_email: &str,
        title: &str,
        description: &str,
    ) -> anyhow::Result<Task> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (id, title, description, creator_email)
            VALUES ($1, $2, $3, $4)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(description)
        .bind(creator_email)
        .fetch_one(db)
        .await?;
        Ok(task)
    }

    pub async fn find_by_owner(
        db: &PgPool,
        id: Uuid,
        creator_email: &str,
    ) -> anyhow::Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {COLUMNS} FROM tasks WHERE id = $1 AND creator_email = $2"
        ))
        .bind(id)
        .bind(creator_email)
        .fetch_optional(db)
        .await?;
        Ok(task)
    }

    pub async fn list_by_owner(db: &PgPool, creator_email: &str) -> anyhow::Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {COLUMNS} FROM tasks WHERE creator_email = $1 ORDER BY created_at ASC"
        ))
        .bind(creator_email)
        .fetch_all(db)
        .await?;
        Ok(tasks)
    }

    /// Atomic find-and-delete: the ownership check and the delete are one
    /// statement. Returns `None` when no row matches both id and owner.
    pub async fn delete_by_owner(
        db: &PgPool,
        id: Uuid,
        creator_email: &str,
    ) -> anyhow::Result<Option<Uuid>> {
        let row = sqlx::query_as::<_, (Uuid,)>(
            "DELETE FROM tasks WHERE id = $1 AND creator_email = $2 RETURNING id",
        )
        .bind(id)
        .bind(creator_email)
        .fetch_optional(db)
        .await?;
        Ok(row.map(|(id,)| id))
    }
}
