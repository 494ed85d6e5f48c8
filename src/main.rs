use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod auth;
mod state;

use category_search_backend::config;
use category_search_backend::db;
use category_search_backend::search::{CategorySearch, ExcludeCategories, SearchSettings};
use category_search_backend::storage::{SqliteForum, SqlitePrivileges};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "category_search_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration / 加载配置
    config::init_config().map_err(anyhow::Error::msg)?;
    let app_config = config::config();
    tracing::info!("Server will listen on {}:{}", app_config.server.host, app_config.server.port);

    // Create data directory if not exists / 创建数据目录
    let data_dir = app_config.get_data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!("Created data directory: {:?}", data_dir);
    }

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| app_config.get_database_url());

    let pool = SqlitePool::connect(&database_url).await?;

    db::run_migrations(&pool).await?;

    let forum = Arc::new(SqliteForum::new(pool.clone()));
    if app_config.search.rebuild_index_on_start {
        // Logged only / 重建失败仅记录日志
        if let Err(e) = forum.rebuild_name_index().await {
            tracing::warn!("Failed to rebuild category name index: {}", e);
        }
    }

    let privileges = Arc::new(SqlitePrivileges::new(pool.clone()));
    let mut search = CategorySearch::new(forum.clone(), forum.clone(), privileges, forum)
        .with_settings(SearchSettings::from(&app_config.search));
    if !app_config.search.excluded_cids.is_empty() {
        search = search.with_hook(Arc::new(ExcludeCategories::new(
            app_config.search.excluded_cids.iter().copied(),
        )));
    }
    tracing::info!("Category search ready with {} hook(s)", search.hooks().len());

    let state = Arc::new(AppState::new(pool, Arc::new(search)));

    let app = api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let bind_addr = app_config.get_bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await?;

    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
