//! Query Compiler
//! 検索リクエストをバックエンド非依存の述語・ソート・ページング記述子に一度だけ
//! コンパイルし、インデックス経路と relational 経路の両方で解釈する

use serde::Deserialize;
use serde_json::{json, Value};
use std::cmp::Ordering;

use crate::models::Listing;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 50;

// ========================================
// 入力
// ========================================

/// GET /api/listings/search のクエリ文字列
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub q: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_rating: Option<f64>,
    pub sort_by: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

// ========================================
// コンパイル結果
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    Relevance,
    PriceAsc,
    PriceDesc,
    RatingDesc,
    DateDesc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetField {
    Location,
    Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericField {
    Price,
    VendorRating,
}

impl FacetField {
    pub fn index_name(&self) -> &'static str {
        match self {
            FacetField::Location => "location",
            FacetField::Category => "category",
        }
    }
}

impl NumericField {
    pub fn index_name(&self) -> &'static str {
        match self {
            NumericField::Price => "price",
            NumericField::VendorRating => "vendor_rating",
        }
    }
}

/// フィルタ述語。relational 経路では `matches`、インデックス経路では
/// `to_index_clause` として解釈される。
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// 大文字小文字を無視した完全一致
    Equals { field: FacetField, value: String },
    /// 両端含む数値範囲。値を持たない行は条件を満たさない（SQL の NULL 比較と同じ）。
    Range {
        field: NumericField,
        min: Option<f64>,
        max: Option<f64>,
    },
}

#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub text: Option<String>,
    pub filters: Vec<Filter>,
    pub sort: SortMode,
    pub page: u32,
    pub limit: u32,
}

// ========================================
// コンパイル
// ========================================

pub fn compile(params: &SearchParams) -> CompiledQuery {
    let mut filters = Vec::new();

    if let Some(location) = non_empty(&params.location) {
        filters.push(Filter::Equals {
            field: FacetField::Location,
            value: location,
        });
    }
    if let Some(category) = non_empty(&params.category) {
        filters.push(Filter::Equals {
            field: FacetField::Category,
            value: category,
        });
    }
    if params.min_price.is_some() || params.max_price.is_some() {
        filters.push(Filter::Range {
            field: NumericField::Price,
            min: params.min_price,
            max: params.max_price,
        });
    }
    if let Some(min_rating) = params.min_rating {
        filters.push(Filter::Range {
            field: NumericField::VendorRating,
            min: Some(min_rating),
            max: None,
        });
    }

    CompiledQuery {
        text: non_empty(&params.q),
        filters,
        sort: parse_sort(params.sort_by.as_deref()),
        page: params.page.unwrap_or(DEFAULT_PAGE).max(1),
        limit: params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn parse_sort(sort_by: Option<&str>) -> SortMode {
    match sort_by {
        Some("price_asc") => SortMode::PriceAsc,
        Some("price_desc") => SortMode::PriceDesc,
        Some("rating_desc") => SortMode::RatingDesc,
        Some("date_desc") => SortMode::DateDesc,
        _ => SortMode::Relevance,
    }
}

// ========================================
// relational 経路の解釈
// ========================================

impl Filter {
    pub fn matches(&self, listing: &Listing) -> bool {
        match self {
            Filter::Equals { field, value } => {
                let actual = match field {
                    FacetField::Location => listing.location.as_deref(),
                    FacetField::Category => listing.category.as_deref(),
                };
                actual
                    .map(|v| v.eq_ignore_ascii_case(value))
                    .unwrap_or(false)
            }
            Filter::Range { field, min, max } => {
                let actual = match field {
                    NumericField::Price => Some(listing.price),
                    NumericField::VendorRating => listing.vendor_rating,
                };
                match actual {
                    None => false,
                    Some(v) => {
                        min.map_or(true, |m| v >= m) && max.map_or(true, |m| v <= m)
                    }
                }
            }
        }
    }
}

impl CompiledQuery {
    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            let in_title = listing.title.to_lowercase().contains(&needle);
            let in_description = listing
                .description
                .as_deref()
                .map(|d| d.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !in_title && !in_description {
                return false;
            }
        }
        self.filters.iter().all(|f| f.matches(listing))
    }

    /// relational 経路のソート。relevance はスコアを持たないため newest-first に落ちる。
    /// 同値は created_at 降順 → id 昇順で決定的に順序付ける。
    pub fn compare(&self, a: &Listing, b: &Listing) -> Ordering {
        let primary = match self.sort {
            SortMode::PriceAsc => a.price.total_cmp(&b.price),
            SortMode::PriceDesc => b.price.total_cmp(&a.price),
            SortMode::RatingDesc => rating_key(b).total_cmp(&rating_key(a)),
            SortMode::Relevance | SortMode::DateDesc => Ordering::Equal,
        };
        primary
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id))
    }
}

fn rating_key(listing: &Listing) -> f64 {
    listing.vendor_rating.unwrap_or(f64::NEG_INFINITY)
}

/// コンパイル済みクエリを行集合へ適用する: フィルタ → ソート → ページ切り出し。
/// 範囲外オフセットは空ページ（エラーにしない）。
pub fn scan(query: &CompiledQuery, mut rows: Vec<Listing>) -> (Vec<Listing>, usize) {
    rows.retain(|l| query.matches(l));
    rows.sort_by(|a, b| query.compare(a, b));
    let total = rows.len();
    let page = rows
        .into_iter()
        .skip(query.offset())
        .take(query.limit as usize)
        .collect();
    (page, total)
}

// ========================================
// インデックス経路の解釈 (OpenSearch DSL)
// ========================================

impl Filter {
    pub fn to_index_clause(&self) -> Value {
        match self {
            Filter::Equals { field, value } => {
                let mut term = serde_json::Map::new();
                // keyword は lowercase normalizer 付きでマップしてあるので
                // 値も小文字に揃えて relational 経路と同じ意味にする
                term.insert(field.index_name().to_string(), json!(value.to_lowercase()));
                json!({ "term": term })
            }
            Filter::Range { field, min, max } => {
                let mut bounds = serde_json::Map::new();
                if let Some(m) = min {
                    bounds.insert("gte".to_string(), json!(m));
                }
                if let Some(m) = max {
                    bounds.insert("lte".to_string(), json!(m));
                }
                let mut range = serde_json::Map::new();
                range.insert(field.index_name().to_string(), Value::Object(bounds));
                json!({ "range": range })
            }
        }
    }
}

impl CompiledQuery {
    pub fn to_index_body(&self) -> Value {
        let mut must = Vec::new();
        if let Some(text) = &self.text {
            must.push(json!({
                "multi_match": {
                    "query": text,
                    "fields": ["title^2", "description"],
                    "fuzziness": "AUTO"
                }
            }));
        }

        let filter: Vec<Value> = self.filters.iter().map(Filter::to_index_clause).collect();

        let mut sort = Vec::new();
        match self.sort {
            SortMode::Relevance => sort.push(json!({ "_score": "desc" })),
            SortMode::PriceAsc => sort.push(json!({ "price": "asc" })),
            SortMode::PriceDesc => sort.push(json!({ "price": "desc" })),
            SortMode::RatingDesc => sort.push(json!({ "vendor_rating": "desc" })),
            SortMode::DateDesc => {}
        }
        sort.push(json!({ "created_at": "desc" }));
        sort.push(json!({ "id": "asc" }));

        json!({
            "query": { "bool": { "must": must, "filter": filter } },
            "sort": sort,
            "from": self.offset(),
            "size": self.limit,
            "aggs": {
                "categories": { "terms": { "field": "category" } },
                "locations": { "terms": { "field": "location" } },
                "price_stats": { "stats": { "field": "price" } }
            }
        })
    }
}
