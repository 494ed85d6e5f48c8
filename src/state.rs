use sqlx::SqlitePool;
use std::sync::Arc;

use category_search_backend::storage::{SqliteForum, SqlitePrivileges};
use category_search_backend::CategorySearch;

/// Shared handler state / 全局状态
pub struct AppState {
    pub db: SqlitePool,
    pub forum: SqliteForum,
    pub privileges: SqlitePrivileges,
    pub search: Arc<CategorySearch>,
}

impl AppState {
    pub fn new(db: SqlitePool, search: Arc<CategorySearch>) -> Self {
        Self {
            forum: SqliteForum::new(db.clone()),
            privileges: SqlitePrivileges::new(db.clone()),
            db,
            search,
        }
    }
}

/// Migrated in-memory database with the default engine / 测试用状态
#[cfg(test)]
pub async fn test_state() -> Arc<AppState> {
    let db = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    category_search_backend::db::run_migrations(&db).await.unwrap();

    let forum = Arc::new(SqliteForum::new(db.clone()));
    let privileges = Arc::new(SqlitePrivileges::new(db.clone()));
    let search = CategorySearch::new(forum.clone(), forum.clone(), privileges, forum);
    Arc::new(AppState::new(db, Arc::new(search)))
}
