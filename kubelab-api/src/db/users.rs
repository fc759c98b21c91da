///! User account storage

use kubelab_common::auth::User;
use kubelab_common::Role;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    password_hash: &str,
    role: Role,
) -> sqlx::Result<i64> {
    let result = sqlx::query("INSERT INTO users (username, password_hash, role) VALUES (?, ?, ?)")
        .bind(username)
        .bind(password_hash)
        .bind(role.as_str())
        .execute(pool)
        .await?;

    Ok(result.last_insert_rowid())
}

pub async fn get_user_by_username(pool: &SqlitePool, username: &str) -> sqlx::Result<Option<User>> {
    let row = sqlx::query("SELECT id, username, password_hash, role FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(row_to_user))
}

pub async fn get_user(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<User>> {
    let row = sqlx::query("SELECT id, username, password_hash, role FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(row_to_user))
}

pub async fn count_users(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
}

/// Returns false when no user has this id
pub async fn update_role(pool: &SqlitePool, id: i64, role: Role) -> sqlx::Result<bool> {
    let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
        .bind(role.as_str())
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn row_to_user(row: &SqliteRow) -> User {
    let role: String = row.get("role");

    User {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        role: role.parse().unwrap_or_default(),
    }
}
