//! Search Index Client
//! OpenSearch 互換 HTTP API に対するインデックス操作と検索

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::aggregate::{Aggregations, PriceRange};
use super::query::CompiledQuery;
use crate::error::IndexError;
use crate::models::{Listing, ListingResponse};

/// 検索インデックスバックエンドの抽象。
/// 実装の失敗は呼び出し側（Search Gateway / ミラー書き込み）が回復する。
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// インデックスの存在確認と、なければスキーマ付き作成
    async fn ensure_index(&self) -> Result<(), IndexError>;
    /// ドキュメントを ID で upsert する
    async fn upsert(&self, listing: &Listing) -> Result<(), IndexError>;
    /// ドキュメントを ID で削除する。存在しなければ成功扱い。
    async fn remove(&self, id: &str) -> Result<(), IndexError>;
    /// コンパイル済みクエリを実行する
    async fn search(&self, query: &CompiledQuery) -> Result<IndexPage, IndexError>;
}

/// インデックス検索の生の結果ページ
#[derive(Debug, Clone)]
pub struct IndexPage {
    pub listings: Vec<ListingResponse>,
    pub total: u64,
    pub aggregations: Aggregations,
}

// ========================================
// OpenSearch 実装
// ========================================

pub struct OpenSearchIndex {
    client: reqwest::Client,
    endpoint: String,
    index: String,
}

impl OpenSearchIndex {
    pub fn new(endpoint: String, index: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            index,
        }
    }

    fn index_url(&self) -> String {
        format!("{}/{}", self.endpoint, self.index)
    }

    fn doc_url(&self, id: &str) -> String {
        format!("{}/{}/_doc/{}", self.endpoint, self.index, id)
    }
}

#[async_trait]
impl SearchIndex for OpenSearchIndex {
    async fn ensure_index(&self) -> Result<(), IndexError> {
        let exists = self
            .client
            .head(self.index_url())
            .send()
            .await
            .map_err(IndexError::from)?;
        if exists.status().is_success() {
            return Ok(());
        }

        // location/category は lowercase normalizer 付き keyword。
        // term フィルタが relational 経路の LOWER() 一致と同じ意味になる。
        let body = json!({
            "settings": {
                "analysis": {
                    "normalizer": {
                        "lowercase": { "type": "custom", "filter": ["lowercase"] }
                    }
                }
            },
            "mappings": {
                "properties": {
                    "id": { "type": "keyword" },
                    "title": { "type": "text" },
                    "description": { "type": "text" },
                    "location": { "type": "keyword", "normalizer": "lowercase" },
                    "category": { "type": "keyword", "normalizer": "lowercase" },
                    "price": { "type": "float" },
                    "image_urls": { "type": "keyword", "index": false },
                    "vendor_name": { "type": "keyword" },
                    "vendor_email": { "type": "keyword" },
                    "vendor_phone": { "type": "keyword" },
                    "vendor_service_offered": { "type": "keyword" },
                    "vendor_rating": { "type": "float" },
                    "created_at": { "type": "date" },
                    "updated_at": { "type": "date" }
                }
            }
        });

        let res = self
            .client
            .put(self.index_url())
            .json(&body)
            .send()
            .await
            .map_err(IndexError::from)?;
        if !res.status().is_success() {
            return Err(IndexError::Unavailable(format!(
                "index create returned {}",
                res.status()
            )));
        }

        info!("Search index created: {}", self.index);
        Ok(())
    }

    async fn upsert(&self, listing: &Listing) -> Result<(), IndexError> {
        let doc = ListingResponse::from(listing);
        let res = self
            .client
            .put(self.doc_url(&listing.id))
            .json(&doc)
            .send()
            .await
            .map_err(IndexError::from)?;
        if !res.status().is_success() {
            return Err(IndexError::Unavailable(format!(
                "document upsert returned {}",
                res.status()
            )));
        }
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), IndexError> {
        let res = self
            .client
            .delete(self.doc_url(id))
            .send()
            .await
            .map_err(IndexError::from)?;
        // 404 は既に存在しないだけなので成功扱い
        if !res.status().is_success() && res.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(IndexError::Unavailable(format!(
                "document delete returned {}",
                res.status()
            )));
        }
        Ok(())
    }

    async fn search(&self, query: &CompiledQuery) -> Result<IndexPage, IndexError> {
        let body = query.to_index_body();
        let res = self
            .client
            .post(format!("{}/_search", self.index_url()))
            .json(&body)
            .send()
            .await
            .map_err(IndexError::from)?;
        if !res.status().is_success() {
            return Err(IndexError::Unavailable(format!(
                "search returned {}",
                res.status()
            )));
        }
        let parsed: SearchBody = res
            .json()
            .await
            .map_err(|e| IndexError::Malformed(e.to_string()))?;
        parsed.into_page()
    }
}

// ========================================
// レスポンス解析
// ========================================

#[derive(Deserialize)]
struct SearchBody {
    hits: Hits,
    aggregations: Option<RawAggregations>,
}

#[derive(Deserialize)]
struct Hits {
    total: HitTotal,
    hits: Vec<Hit>,
}

#[derive(Deserialize)]
struct HitTotal {
    value: u64,
}

#[derive(Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: ListingResponse,
}

#[derive(Deserialize)]
struct RawAggregations {
    categories: TermsAgg,
    locations: TermsAgg,
    price_stats: StatsAgg,
}

#[derive(Deserialize)]
struct TermsAgg {
    buckets: Vec<Bucket>,
}

#[derive(Deserialize)]
struct Bucket {
    key: String,
}

#[derive(Deserialize)]
struct StatsAgg {
    count: u64,
    min: Option<f64>,
    max: Option<f64>,
}

impl SearchBody {
    fn into_page(self) -> Result<IndexPage, IndexError> {
        let aggs = self
            .aggregations
            .ok_or_else(|| IndexError::Malformed("missing aggregations".to_string()))?;

        let price_range = match (aggs.price_stats.count, aggs.price_stats.min, aggs.price_stats.max)
        {
            (0, _, _) => None,
            (_, Some(min), Some(max)) => Some(PriceRange { min, max }),
            _ => None,
        };

        Ok(IndexPage {
            listings: self.hits.hits.into_iter().map(|h| h.source).collect(),
            total: self.hits.total.value,
            aggregations: Aggregations {
                categories: sorted_keys(aggs.categories),
                locations: sorted_keys(aggs.locations),
                price_range,
            },
        })
    }
}

fn sorted_keys(agg: TermsAgg) -> Vec<String> {
    let mut keys: Vec<String> = agg
        .buckets
        .into_iter()
        .map(|b| b.key)
        .filter(|k| !k.is_empty())
        .collect();
    keys.sort();
    keys
}
