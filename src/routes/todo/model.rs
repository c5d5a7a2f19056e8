use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

pub const MAX_TITLE_LEN: usize = 256;

const COLUMNS: &str = "id, owner_id, title, is_complete, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Todo {
    pub id: i64,
    pub owner_id: String,
    pub title: String,
    pub is_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    pub title: String,
    #[serde(default)]
    pub is_complete: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoRequest {
    pub title: Option<String>,
    pub is_complete: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListTodosQuery {
    pub completed: Option<bool>,
}

/// Trims the title and checks its length, returning the cleaned value.
pub fn validate_title(title: &str) -> Result<String, String> {
    let title = title.trim();
    if title.is_empty() {
        return Err("title must not be empty".into());
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(format!("title must be at most {MAX_TITLE_LEN} characters"));
    }
    Ok(title.to_string())
}

impl Todo {
    pub async fn create(
        pool: &SqlitePool,
        owner_id: &str,
        title: &str,
        is_complete: bool,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "INSERT INTO todos (owner_id, title, is_complete, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING {COLUMNS}"
        ))
        .bind(owner_id)
        .bind(title)
        .bind(is_complete)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        tracing::debug!(id = todo.id, owner = %owner_id, "todo created");
        Ok(todo)
    }

    pub async fn list_for_owner(
        pool: &SqlitePool,
        owner_id: &str,
        completed: Option<bool>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!(
            "SELECT {COLUMNS} FROM todos \
             WHERE owner_id = ? AND (? IS NULL OR is_complete = ?) \
             ORDER BY id"
        ))
        .bind(owner_id)
        .bind(completed)
        .bind(completed)
        .fetch_all(pool)
        .await
    }

    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!("SELECT {COLUMNS} FROM todos ORDER BY id"))
            .fetch_all(pool)
            .await
    }

    pub async fn find_for_owner(
        pool: &SqlitePool,
        id: i64,
        owner_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!(
            "SELECT {COLUMNS} FROM todos WHERE id = ? AND owner_id = ?"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
    }

    /// Applies the fields that are present. `None` when the todo does not
    /// exist or belongs to someone else.
    pub async fn update_for_owner(
        pool: &SqlitePool,
        id: i64,
        owner_id: &str,
        title: Option<&str>,
        is_complete: Option<bool>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!(
            "UPDATE todos \
             SET title = COALESCE(?, title), \
                 is_complete = COALESCE(?, is_complete), \
                 updated_at = ? \
             WHERE id = ? AND owner_id = ? \
             RETURNING {COLUMNS}"
        ))
        .bind(title)
        .bind(is_complete)
        .bind(Utc::now())
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete_for_owner(
        pool: &SqlitePool,
        id: i64,
        owner_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_any(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
