///! Workload record storage

use super::{decode_ports, encode_ports};
use kubelab_common::PodSummary;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// Stored workload record joined with its owner's username
#[derive(Debug, Clone, PartialEq)]
pub struct PodRecord {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub ports: Vec<i32>,
    pub node_ports: Vec<i32>,
    pub ip: String,
    pub status: String,
    pub hostname: Option<String>,
    pub user_id: i64,
    pub owner: String,
}

impl PodRecord {
    pub fn to_summary(&self) -> PodSummary {
        PodSummary {
            id: self.id,
            name: self.name.clone(),
            image: self.image.clone(),
            ports: self.ports.clone(),
            node_ports: self.node_ports.clone(),
            ip: self.ip.clone(),
            status: self.status.clone(),
            owner: self.owner.clone(),
            hostname: self.hostname.clone(),
        }
    }
}

/// Fields written when a workload is first recorded
#[derive(Debug, Clone)]
pub struct NewPod<'a> {
    pub name: &'a str,
    pub image: &'a str,
    pub ports: &'a [i32],
    pub node_ports: &'a [i32],
    pub ip: &'a str,
    pub status: &'a str,
    pub hostname: Option<&'a str>,
    pub user_id: i64,
}

const SELECT_POD: &str = "SELECT p.id, p.name, p.image, p.ports, p.node_ports, p.ip, p.status,
        p.hostname, p.user_id, u.username AS owner
     FROM pods p JOIN users u ON u.id = p.user_id";

pub async fn create_pod(pool: &SqlitePool, pod: &NewPod<'_>) -> sqlx::Result<i64> {
    let result = sqlx::query(
        "INSERT INTO pods (name, image, ports, node_ports, ip, status, hostname, user_id)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(pod.name)
    .bind(pod.image)
    .bind(encode_ports(pod.ports))
    .bind(encode_ports(pod.node_ports))
    .bind(pod.ip)
    .bind(pod.status)
    .bind(pod.hostname)
    .bind(pod.user_id)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn pod_exists(pool: &SqlitePool, name: &str) -> sqlx::Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pods WHERE name = ?")
        .bind(name)
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}

pub async fn count_owned(pool: &SqlitePool, user_id: i64) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM pods WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

/// Record with this name, only if owned by `user_id`
pub async fn get_owned_pod(
    pool: &SqlitePool,
    name: &str,
    user_id: i64,
) -> sqlx::Result<Option<PodRecord>> {
    let row = sqlx::query(&format!("{} WHERE p.name = ? AND p.user_id = ?", SELECT_POD))
        .bind(name)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(row_to_pod))
}

/// Records owned by the user or shared with one of the user's groups
///
/// Each record appears once, ordered by id.
pub async fn list_visible_pods(pool: &SqlitePool, user_id: i64) -> sqlx::Result<Vec<PodRecord>> {
    let rows = sqlx::query(&format!(
        "{} WHERE p.user_id = ?
            OR p.id IN (
                SELECT gp.pod_id FROM group_pods gp
                JOIN group_users gu ON gu.group_id = gp.group_id
                WHERE gu.user_id = ?
            )
         ORDER BY p.id",
        SELECT_POD
    ))
    .bind(user_id)
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(row_to_pod).collect())
}

/// Write back the last observed status and IP
pub async fn update_observed(pool: &SqlitePool, id: i64, status: &str, ip: &str) -> sqlx::Result<()> {
    sqlx::query("UPDATE pods SET status = ?, ip = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(status)
        .bind(ip)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn delete_pod(pool: &SqlitePool, id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM pods WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn row_to_pod(row: &SqliteRow) -> PodRecord {
    let ports: String = row.get("ports");
    let node_ports: String = row.get("node_ports");

    PodRecord {
        id: row.get("id"),
        name: row.get("name"),
        image: row.get("image"),
        ports: decode_ports(&ports),
        node_ports: decode_ports(&node_ports),
        ip: row.get("ip"),
        status: row.get("status"),
        hostname: row.get("hostname"),
        user_id: row.get("user_id"),
        owner: row.get("owner"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{groups, is_unique_violation, test_database, users};
    use kubelab_common::Role;

    fn new_pod<'a>(name: &'a str, user_id: i64) -> NewPod<'a> {
        NewPod {
            name,
            image: "nginx",
            ports: &[80, 8080],
            node_ports: &[30000, 30001],
            ip: "10.42.0.5",
            status: "Running",
            hostname: None,
            user_id,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_owned() {
        let db = test_database().await;
        let alice = users::create_user(db.pool(), "alice", "h", Role::Student).await.unwrap();
        let bob = users::create_user(db.pool(), "bob", "h", Role::Student).await.unwrap();

        create_pod(db.pool(), &new_pod("alice-web", alice)).await.unwrap();

        let pod = get_owned_pod(db.pool(), "alice-web", alice).await.unwrap().unwrap();
        assert_eq!(pod.ports, vec![80, 8080]);
        assert_eq!(pod.node_ports, vec![30000, 30001]);
        assert_eq!(pod.owner, "alice");

        assert!(get_owned_pod(db.pool(), "alice-web", bob).await.unwrap().is_none());
        assert!(pod_exists(db.pool(), "alice-web").await.unwrap());
        assert_eq!(count_owned(db.pool(), alice).await.unwrap(), 1);
        assert_eq!(count_owned(db.pool(), bob).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unique_name() {
        let db = test_database().await;
        let alice = users::create_user(db.pool(), "alice", "h", Role::Student).await.unwrap();

        create_pod(db.pool(), &new_pod("alice-web", alice)).await.unwrap();
        let err = create_pod(db.pool(), &new_pod("alice-web", alice)).await.unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_visible_pods_are_deduplicated() {
        let db = test_database().await;
        let alice = users::create_user(db.pool(), "alice", "h", Role::Student).await.unwrap();
        let bob = users::create_user(db.pool(), "bob", "h", Role::Teacher).await.unwrap();

        let web = create_pod(db.pool(), &new_pod("alice-web", alice)).await.unwrap();
        let db_pod = create_pod(db.pool(), &new_pod("bob-db", bob)).await.unwrap();

        // alice reaches bob-db through two groups and alice-web both directly and via a group
        groups::create_group(db.pool(), "g1", &[alice, bob], &[web, db_pod]).await.unwrap();
        groups::create_group(db.pool(), "g2", &[alice], &[db_pod]).await.unwrap();

        let visible = list_visible_pods(db.pool(), alice).await.unwrap();
        let names: Vec<_> = visible.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["alice-web", "bob-db"]);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = test_database().await;
        let alice = users::create_user(db.pool(), "alice", "h", Role::Student).await.unwrap();
        let id = create_pod(db.pool(), &new_pod("alice-web", alice)).await.unwrap();

        update_observed(db.pool(), id, "Pending", "Not Available").await.unwrap();
        let pod = get_owned_pod(db.pool(), "alice-web", alice).await.unwrap().unwrap();
        assert_eq!(pod.status, "Pending");
        assert_eq!(pod.ip, "Not Available");

        assert!(delete_pod(db.pool(), id).await.unwrap());
        assert!(!delete_pod(db.pool(), id).await.unwrap());
        assert!(!pod_exists(db.pool(), "alice-web").await.unwrap());
    }
}
