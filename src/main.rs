use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use listing_catalog_server::config::AppConfig;
use listing_catalog_server::db;
use listing_catalog_server::search::index::{OpenSearchIndex, SearchIndex};
use listing_catalog_server::search::SearchGateway;
use listing_catalog_server::store::postgres::PostgresStore;
use listing_catalog_server::store::sqlite::SqliteStore;
use listing_catalog_server::store::DualStore;
use listing_catalog_server::{router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // ログ初期化
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = AppConfig::from_env();

    // プライマリは lazy 接続。起動時に到達不能でもセカンダリへの
    // フォールバックで運用を継続できる。
    let pg_pool = db::connect_primary(&config.primary_db_url)?;
    if let Err(err) = db::ensure_primary_schema(&pg_pool).await {
        warn!(
            "Primary schema init failed (continuing, fallback remains available): {}",
            err
        );
    }
    let sqlite_pool = db::init_secondary(&config.sqlite_path).await?;

    let store = Arc::new(DualStore::new(
        Arc::new(PostgresStore::new(pg_pool.clone())),
        Arc::new(SqliteStore::new(sqlite_pool.clone())),
    ));

    // インデックスなしでも起動する。検索は relational フォールバックが受ける。
    let index: Arc<dyn SearchIndex> = Arc::new(OpenSearchIndex::new(
        config.opensearch_endpoint.clone(),
        config.opensearch_index.clone(),
    ));
    if let Err(err) = index.ensure_index().await {
        warn!("Search index init failed (continuing without index): {}", err);
    }

    let search = SearchGateway::new(store.clone(), index);
    let state = Arc::new(AppState { store, search });
    let app = router(state);

    info!("🚀 Listing Catalog API Server listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 終了時にプールを閉じる
    pg_pool.close().await;
    sqlite_pool.close().await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
