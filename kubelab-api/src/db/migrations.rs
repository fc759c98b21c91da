///! Database migrations

use kubelab_common::Result;
use sqlx::SqlitePool;

/// Ordered schema changes, one statement each
pub const MIGRATIONS: &[(&str, &str)] = &[
    ("001_create_users_table", MIGRATION_001_CREATE_USERS),
    ("002_create_pods_table", MIGRATION_002_CREATE_PODS),
    ("003_create_pods_user_index", MIGRATION_003_CREATE_PODS_USER_INDEX),
    ("004_create_lab_groups_table", MIGRATION_004_CREATE_GROUPS),
    ("005_create_group_users_table", MIGRATION_005_CREATE_GROUP_USERS),
    ("006_create_group_pods_table", MIGRATION_006_CREATE_GROUP_PODS),
];

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            executed_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| kubelab_common::Error::System(format!("Failed to create migrations table: {}", e)))?;

    for (name, sql) in MIGRATIONS {
        run_migration(pool, name, sql).await?;
    }

    Ok(())
}

async fn run_migration(pool: &SqlitePool, name: &str, sql: &str) -> Result<()> {
    use sqlx::Row;

    let row = sqlx::query("SELECT COUNT(*) as count FROM migrations WHERE name = ?")
        .bind(name)
        .fetch_one(pool)
        .await
        .map_err(|e| kubelab_common::Error::System(format!("Migration check failed: {}", e)))?;

    let count: i64 = row.get("count");
    if count > 0 {
        tracing::debug!("Migration {} already applied", name);
        return Ok(());
    }

    tracing::info!("Running migration: {}", name);

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| kubelab_common::Error::System(format!("Migration {} failed: {}", name, e)))?;

    sqlx::query(sql)
        .execute(&mut *tx)
        .await
        .map_err(|e| kubelab_common::Error::System(format!("Migration {} failed: {}", name, e)))?;

    sqlx::query("INSERT INTO migrations (name) VALUES (?)")
        .bind(name)
        .execute(&mut *tx)
        .await
        .map_err(|e| kubelab_common::Error::System(format!("Failed to record migration: {}", e)))?;

    tx.commit()
        .await
        .map_err(|e| kubelab_common::Error::System(format!("Migration {} failed: {}", name, e)))?;

    tracing::info!("Migration {} completed", name);

    Ok(())
}

const MIGRATION_001_CREATE_USERS: &str = "
CREATE TABLE users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'undefined',
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

const MIGRATION_002_CREATE_PODS: &str = "
CREATE TABLE pods (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    image TEXT NOT NULL,
    ports TEXT NOT NULL,
    node_ports TEXT NOT NULL,
    ip TEXT NOT NULL,
    status TEXT NOT NULL,
    hostname TEXT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

const MIGRATION_003_CREATE_PODS_USER_INDEX: &str =
    "CREATE INDEX idx_pods_user_id ON pods(user_id)";

const MIGRATION_004_CREATE_GROUPS: &str = "
CREATE TABLE lab_groups (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

const MIGRATION_005_CREATE_GROUP_USERS: &str = "
CREATE TABLE group_users (
    group_id INTEGER NOT NULL REFERENCES lab_groups(id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    PRIMARY KEY (group_id, user_id)
)";

const MIGRATION_006_CREATE_GROUP_PODS: &str = "
CREATE TABLE group_pods (
    group_id INTEGER NOT NULL REFERENCES lab_groups(id) ON DELETE CASCADE,
    pod_id INTEGER NOT NULL REFERENCES pods(id) ON DELETE CASCADE,
    PRIMARY KEY (group_id, pod_id)
)";
