//! Listing Catalog Server
//!
//! 物件系 Listing のカタログ API。書き込みはプライマリ (PostgreSQL) →
//! セカンダリ (SQLite) のフォールバック付きで永続化し、検索は OpenSearch 互換
//! インデックスを優先、失敗時は同じ述語を relational データ上で評価する。

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod search;
pub mod store;

use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use search::SearchGateway;
use store::DualStore;

/// ハンドラへ注入する共有状態
pub struct AppState {
    pub store: Arc<DualStore>,
    pub search: SearchGateway,
}

/// ルーター構築
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::listings::health_check))
        .route(
            "/api/listings",
            get(handlers::listings::list_listings).post(handlers::listings::create_listing),
        )
        .route(
            "/api/listings/search",
            get(handlers::listings::search_listings),
        )
        .route(
            "/api/listings/:id",
            get(handlers::listings::get_listing)
                .put(handlers::listings::update_listing)
                .delete(handlers::listings::delete_listing),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
