///! Group storage
///!
///! Groups share workloads with their member users. Membership ids that do
///! not match an existing user or workload are skipped on insert.

use kubelab_common::GroupInfo;
use sqlx::{Row, SqliteConnection, SqlitePool};

/// Create a group with its initial members, returning the new id
pub async fn create_group(
    pool: &SqlitePool,
    name: &str,
    user_ids: &[i64],
    pod_ids: &[i64],
) -> sqlx::Result<i64> {
    let mut tx = pool.begin().await?;

    let group_id = sqlx::query("INSERT INTO lab_groups (name) VALUES (?)")
        .bind(name)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

    add_users(&mut tx, group_id, user_ids).await?;
    add_pods(&mut tx, group_id, pod_ids).await?;

    tx.commit().await?;

    Ok(group_id)
}

/// Rename a group and optionally replace its membership
///
/// Returns false when the group does not exist.
pub async fn update_group(
    pool: &SqlitePool,
    group_id: i64,
    name: &str,
    user_ids: Option<&[i64]>,
    pod_ids: Option<&[i64]>,
) -> sqlx::Result<bool> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query("UPDATE lab_groups SET name = ? WHERE id = ?")
        .bind(name)
        .bind(group_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if updated == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    if let Some(user_ids) = user_ids {
        sqlx::query("DELETE FROM group_users WHERE group_id = ?")
            .bind(group_id)
            .execute(&mut *tx)
            .await?;
        add_users(&mut tx, group_id, user_ids).await?;
    }

    if let Some(pod_ids) = pod_ids {
        sqlx::query("DELETE FROM group_pods WHERE group_id = ?")
            .bind(group_id)
            .execute(&mut *tx)
            .await?;
        add_pods(&mut tx, group_id, pod_ids).await?;
    }

    tx.commit().await?;

    Ok(true)
}

pub async fn delete_group(pool: &SqlitePool, group_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM lab_groups WHERE id = ?")
        .bind(group_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn get_group(pool: &SqlitePool, group_id: i64) -> sqlx::Result<Option<GroupInfo>> {
    let row = sqlx::query("SELECT id, name FROM lab_groups WHERE id = ?")
        .bind(group_id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(Some(load_members(pool, row.get("id"), row.get("name")).await?)),
        None => Ok(None),
    }
}

pub async fn list_groups(pool: &SqlitePool) -> sqlx::Result<Vec<GroupInfo>> {
    let rows = sqlx::query("SELECT id, name FROM lab_groups ORDER BY id")
        .fetch_all(pool)
        .await?;

    let mut groups = Vec::with_capacity(rows.len());
    for row in rows {
        groups.push(load_members(pool, row.get("id"), row.get("name")).await?);
    }

    Ok(groups)
}

async fn load_members(pool: &SqlitePool, id: i64, name: String) -> sqlx::Result<GroupInfo> {
    let users: Vec<String> = sqlx::query_scalar(
        "SELECT u.username FROM group_users gu
         JOIN users u ON u.id = gu.user_id
         WHERE gu.group_id = ?
         ORDER BY u.username",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let pods: Vec<String> = sqlx::query_scalar(
        "SELECT p.name FROM group_pods gp
         JOIN pods p ON p.id = gp.pod_id
         WHERE gp.group_id = ?
         ORDER BY p.name",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(GroupInfo {
        id,
        name,
        users,
        pods,
    })
}

async fn add_users(conn: &mut SqliteConnection, group_id: i64, user_ids: &[i64]) -> sqlx::Result<()> {
    for &user_id in user_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO group_users (group_id, user_id)
             SELECT ?, id FROM users WHERE id = ?",
        )
        .bind(group_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn add_pods(conn: &mut SqliteConnection, group_id: i64, pod_ids: &[i64]) -> sqlx::Result<()> {
    for &pod_id in pod_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO group_pods (group_id, pod_id)
             SELECT ?, id FROM pods WHERE id = ?",
        )
        .bind(group_id)
        .bind(pod_id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}
