//! カタログ操作のエンドツーエンドシナリオ。
//! インデックスが落ちている状態でも、作成 → 検索 → 削除の一連の流れが
//! relational フォールバックだけで成立することを確認する。

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;

use listing_catalog_server::db;
use listing_catalog_server::error::{IndexError, StoreError};
use listing_catalog_server::models::{CreateListingRequest, Listing};
use listing_catalog_server::search::index::{IndexPage, SearchIndex};
use listing_catalog_server::search::query::{CompiledQuery, SearchParams};
use listing_catalog_server::search::SearchGateway;
use listing_catalog_server::store::sqlite::SqliteStore;
use listing_catalog_server::store::DualStore;

struct DownIndex;

#[async_trait]
impl SearchIndex for DownIndex {
    async fn ensure_index(&self) -> Result<(), IndexError> {
        Err(IndexError::Unavailable("connection refused".to_string()))
    }
    async fn upsert(&self, _listing: &Listing) -> Result<(), IndexError> {
        Err(IndexError::Unavailable("connection refused".to_string()))
    }
    async fn remove(&self, _id: &str) -> Result<(), IndexError> {
        Err(IndexError::Unavailable("connection refused".to_string()))
    }
    async fn search(&self, _query: &CompiledQuery) -> Result<IndexPage, IndexError> {
        Err(IndexError::Unavailable("connection refused".to_string()))
    }
}

async fn memory_dual_store() -> Arc<DualStore> {
    let primary = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::create_schema(&primary).await.unwrap();
    let secondary = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::create_schema(&secondary).await.unwrap();
    Arc::new(DualStore::new(
        Arc::new(SqliteStore::new(primary)),
        Arc::new(SqliteStore::new(secondary)),
    ))
}

#[tokio::test]
async fn test_create_search_delete_flow() {
    let store = memory_dual_store().await;
    let gateway = SearchGateway::new(store.clone(), Arc::new(DownIndex));

    // 作成
    let req = CreateListingRequest {
        title: "Beach House".to_string(),
        description: None,
        location: Some("Miami".to_string()),
        category: Some("Real Estate".to_string()),
        price: 1500.0,
        image_urls: vec![],
        vendor_name: "John".to_string(),
        vendor_email: "john@x.com".to_string(),
        vendor_phone: None,
        vendor_service_offered: None,
        vendor_rating: None,
    };
    req.validate().unwrap();
    let created = store.create(&req).await.unwrap();
    gateway.mirror_upsert(&created).await; // インデックス停止中でも書き込みは失敗しない
    assert!(created.updated_at >= created.created_at);

    // カテゴリ一致の検索で見つかる
    let hit = gateway
        .search(&SearchParams {
            category: Some("Real Estate".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(hit.total, 1);
    assert_eq!(hit.listings[0].id, created.id);
    assert_eq!(hit.listings[0].title, "Beach House");

    // 別カテゴリでは見つからない
    let miss = gateway
        .search(&SearchParams {
            category: Some("Office".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(miss.total, 0);
    assert!(miss.listings.is_empty());

    // 削除後の get は NotFound
    store.delete(&created.id).await.unwrap();
    gateway.mirror_remove(&created.id).await;
    assert!(matches!(
        store.get(&created.id).await,
        Err(StoreError::NotFound)
    ));
}
