use sqlx::SqlitePool;
use anyhow::Result;
use chrono::Utc;

/// Groups every forum starts with / 内置用户组
pub const GUESTS_GROUP: &str = "guests";
pub const REGISTERED_USERS_GROUP: &str = "registered-users";
pub const ADMINISTRATORS_GROUP: &str = "administrators";

/// Run database migrations / 运行数据库迁移
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            uid INTEGER PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            enabled INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_groups (
            name TEXT PRIMARY KEY,
            description TEXT,
            is_admin INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_group_members (
            uid INTEGER NOT NULL,
            group_name TEXT NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (uid, group_name),
            FOREIGN KEY (uid) REFERENCES users(uid) ON DELETE CASCADE,
            FOREIGN KEY (group_name) REFERENCES user_groups(name) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            uid INTEGER NOT NULL,
            expires_at TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (uid) REFERENCES users(uid) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            cid INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            slug TEXT NOT NULL DEFAULT '',
            icon TEXT,
            parent_cid INTEGER NOT NULL DEFAULT 0,
            sort_order INTEGER NOT NULL DEFAULT 0,
            sub_categories_per_page INTEGER NOT NULL DEFAULT 10,
            num_recent_replies INTEGER NOT NULL DEFAULT 1,
            topic_count INTEGER NOT NULL DEFAULT 0,
            post_count INTEGER NOT NULL DEFAULT 0,
            disabled INTEGER NOT NULL DEFAULT 0,
            link TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_categories_parent ON categories(parent_cid, sort_order)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS category_privileges (
            cid INTEGER NOT NULL,
            group_name TEXT NOT NULL,
            privilege TEXT NOT NULL,
            PRIMARY KEY (cid, group_name, privilege)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS category_watch (
            uid INTEGER NOT NULL,
            cid INTEGER NOT NULL,
            state TEXT NOT NULL,
            PRIMARY KEY (uid, cid)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS topics (
            tid INTEGER PRIMARY KEY,
            cid INTEGER NOT NULL,
            uid INTEGER NOT NULL DEFAULT 0,
            title TEXT NOT NULL,
            slug TEXT NOT NULL,
            last_posted_at INTEGER NOT NULL,
            deleted INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_topics_recent ON topics(cid, last_posted_at)")
        .execute(pool)
        .await?;

    // Sorted sets: member order within a key is (score, member)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sorted_sets (
            set_key TEXT NOT NULL,
            member TEXT NOT NULL,
            score REAL NOT NULL DEFAULT 0,
            PRIMARY KEY (set_key, member)
        ) WITHOUT ROWID
        "#,
    )
    .execute(pool)
    .await?;

    let now = Utc::now().to_rfc3339();
    for (name, description, is_admin) in [
        (GUESTS_GROUP, "Visitors without an account", false),
        (REGISTERED_USERS_GROUP, "Every signed-in user", false),
        (ADMINISTRATORS_GROUP, "Forum administrators", true),
    ] {
        sqlx::query(
            "INSERT OR IGNORE INTO user_groups (name, description, is_admin, created_at) VALUES (?, ?, ?, ?)"
        )
        .bind(name)
        .bind(description)
        .bind(is_admin)
        .bind(&now)
        .execute(pool)
        .await?;
    }

    tracing::info!("Database migrations completed");
    Ok(())
}

/// Single-connection in-memory database with migrations applied / 测试用内存数据库
#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}
