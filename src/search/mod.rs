//! Search Module
//! インデックス優先・relational フォールバックの検索と、書き込みのミラー反映

pub mod aggregate;
pub mod index;
pub mod query;


use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::error::StoreError;
use crate::models::{Listing, ListingResponse};
use crate::store::DualStore;
use self::aggregate::{aggregate, Aggregations};
use self::index::{IndexPage, SearchIndex};
use self::query::{compile, scan, CompiledQuery, SearchParams};

/// 検索結果ページ。どちらの経路で処理されても同じ形。
#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub listings: Vec<ListingResponse>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
    pub aggregations: Aggregations,
}

/// Search Gateway
///
/// クエリは一度だけコンパイルし、まずインデックスへ。失敗（到達不能・タイムアウト・
/// 不正応答）のときは Dual-Store Router から全行を引いて同じ述語をメモリ上で評価する。
#[derive(Clone)]
pub struct SearchGateway {
    store: Arc<DualStore>,
    index: Arc<dyn SearchIndex>,
}

impl SearchGateway {
    pub fn new(store: Arc<DualStore>, index: Arc<dyn SearchIndex>) -> Self {
        Self { store, index }
    }

    pub async fn search(&self, params: &SearchParams) -> Result<SearchPage, StoreError> {
        let compiled = compile(params);
        match self.index.search(&compiled).await {
            Ok(page) => Ok(assemble(&compiled, page)),
            Err(err) => {
                warn!("Search index failed: {} (falling back to relational scan)", err);
                self.search_relational(&compiled).await
            }
        }
    }

    /// relational フォールバック。両ストアも落ちている場合のみエラーになる。
    async fn search_relational(&self, compiled: &CompiledQuery) -> Result<SearchPage, StoreError> {
        let rows = self.store.get_all().await?;
        let (page_rows, total) = scan(compiled, rows);
        let aggregations = aggregate(&page_rows);
        let listings = page_rows.iter().map(ListingResponse::from).collect();
        Ok(paged(compiled, listings, total as u64, aggregations))
    }

    /// 書き込み成功後のインデックス反映。失敗はログだけ残して無視する
    /// （書き込み自体を失敗させない。ストアとの不整合ウィンドウは許容）。
    pub async fn mirror_upsert(&self, listing: &Listing) {
        if let Err(err) = self.index.upsert(listing).await {
            warn!(
                "Index upsert failed for {} (write succeeded, mirror skipped): {}",
                listing.id, err
            );
        }
    }

    pub async fn mirror_remove(&self, id: &str) {
        if let Err(err) = self.index.remove(id).await {
            warn!(
                "Index delete failed for {} (write succeeded, mirror skipped): {}",
                id, err
            );
        }
    }
}

fn assemble(compiled: &CompiledQuery, page: IndexPage) -> SearchPage {
    paged(compiled, page.listings, page.total, page.aggregations)
}

fn paged(
    compiled: &CompiledQuery,
    listings: Vec<ListingResponse>,
    total: u64,
    aggregations: Aggregations,
) -> SearchPage {
    SearchPage {
        listings,
        total,
        page: compiled.page,
        limit: compiled.limit,
        pages: total.div_ceil(compiled.limit as u64) as u32,
        aggregations,
    }
}
