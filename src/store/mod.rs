//! Store Module
//! プライマリ (PostgreSQL) → セカンダリ (SQLite) のフォールバック付き CRUD

pub mod postgres;
pub mod sqlite;


use async_trait::async_trait;
use chrono::Utc;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{join_image_urls, CreateListingRequest, Listing, UpdateListingRequest};

/// 単一バックエンドに対する listings の CRUD。
/// 両実装は同じ行形式（フィールド名・型）を返すこと。
#[async_trait]
pub trait ListingStore: Send + Sync {
    fn name(&self) -> &'static str;
    async fn create(&self, listing: &Listing) -> Result<Listing, StoreError>;
    async fn get(&self, id: &str) -> Result<Listing, StoreError>;
    async fn get_all(&self) -> Result<Vec<Listing>, StoreError>;
    async fn update(&self, listing: &Listing) -> Result<Listing, StoreError>;
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// Dual-Store Router
///
/// すべての操作をまずプライマリへ、失敗時に一度だけセカンダリへ流す。
/// NotFound は権威ある応答として扱い、フォールバックしない。
pub struct DualStore {
    primary: Arc<dyn ListingStore>,
    secondary: Arc<dyn ListingStore>,
}

impl DualStore {
    pub fn new(primary: Arc<dyn ListingStore>, secondary: Arc<dyn ListingStore>) -> Self {
        Self { primary, secondary }
    }

    /// フォールバック付き実行。リトライは 1 ホップのみ、ループしない。
    async fn attempt<'a, T>(
        &'a self,
        op: &'static str,
        run: impl Fn(&'a dyn ListingStore) -> BoxFuture<'a, Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match run(self.primary.as_ref()).await {
            Ok(value) => Ok(value),
            Err(StoreError::NotFound) => Err(StoreError::NotFound),
            Err(err) => {
                warn!(
                    "{} failed on {}: {} (falling back to {})",
                    op,
                    self.primary.name(),
                    err,
                    self.secondary.name()
                );
                match run(self.secondary.as_ref()).await {
                    Ok(value) => Ok(value),
                    Err(StoreError::NotFound) => Err(StoreError::NotFound),
                    Err(err) => {
                        error!("{} failed on {} as well: {}", op, self.secondary.name(), err);
                        Err(StoreError::Unavailable)
                    }
                }
            }
        }
    }

    /// Listing 作成。ID とタイムスタンプはストア選択の前にここで割り当てるため、
    /// どちらのストアに書かれても（後でインデックスに写像されても）同じ ID になる。
    pub async fn create(&self, req: &CreateListingRequest) -> Result<Listing, StoreError> {
        let now = Utc::now();
        let listing = Listing {
            id: Uuid::new_v4().to_string(),
            title: req.title.trim().to_string(),
            description: req.description.clone(),
            location: req.location.clone(),
            category: req.category.clone(),
            price: req.price,
            image_urls: join_image_urls(&req.image_urls),
            vendor_name: req.vendor_name.clone(),
            vendor_email: req.vendor_email.clone(),
            vendor_phone: req.vendor_phone.clone(),
            vendor_service_offered: req.vendor_service_offered.clone(),
            vendor_rating: req.vendor_rating,
            created_at: now,
            updated_at: now,
        };
        self.attempt("create", |store| store.create(&listing)).await
    }

    pub async fn get(&self, id: &str) -> Result<Listing, StoreError> {
        self.attempt("read", |store| store.get(id)).await
    }

    pub async fn get_all(&self) -> Result<Vec<Listing>, StoreError> {
        self.attempt("read-all", |store| store.get_all()).await
    }

    /// 部分更新。現在行を読み、指定フィールドだけマージして全行書き戻す。
    pub async fn update(
        &self,
        id: &str,
        req: &UpdateListingRequest,
    ) -> Result<Listing, StoreError> {
        let current = self.get(id).await?;
        let merged = req.apply_to(&current, Utc::now());
        self.attempt("update", |store| store.update(&merged)).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.attempt("delete", |store| store.delete(id)).await
    }
}
