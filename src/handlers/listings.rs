//! Listings API Handlers
//! /api/listings エンドポイント

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::error::ApiError;
use crate::models::{CreateListingRequest, ListingResponse, UpdateListingRequest};
use crate::search::aggregate::Aggregations;
use crate::search::query::SearchParams;
use crate::AppState;

// ========================================
// Response Types
// ========================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ListingListResponse {
    pub success: bool,
    pub listings: Vec<ListingResponse>,
    pub total: usize,
}

#[derive(Serialize)]
pub struct ListingDetailResponse {
    pub success: bool,
    pub listing: ListingResponse,
}

#[derive(Serialize)]
pub struct DeleteListingResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct SearchListingsResponse {
    pub success: bool,
    pub listings: Vec<ListingResponse>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
    pub aggregations: Aggregations,
}

// ========================================
// Handlers
// ========================================

/// ヘルスチェック
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "listing-catalog-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/listings - Listing一覧取得（新しい順）
pub async fn list_listings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListingListResponse>, ApiError> {
    let listings = state.store.get_all().await?;
    let responses: Vec<ListingResponse> = listings.iter().map(ListingResponse::from).collect();
    let total = responses.len();
    Ok(Json(ListingListResponse {
        success: true,
        listings: responses,
        total,
    }))
}

/// GET /api/listings/search - 検索
/// インデックス優先、失敗時は relational フォールバック（結果形式は同一）
pub async fn search_listings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchListingsResponse>, ApiError> {
    let result = state.search.search(&params).await?;
    Ok(Json(SearchListingsResponse {
        success: true,
        listings: result.listings,
        total: result.total,
        page: result.page,
        limit: result.limit,
        pages: result.pages,
        aggregations: result.aggregations,
    }))
}

/// GET /api/listings/:id - Listing詳細取得
pub async fn get_listing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ListingDetailResponse>, ApiError> {
    let listing = state.store.get(&id).await?;
    Ok(Json(ListingDetailResponse {
        success: true,
        listing: ListingResponse::from(&listing),
    }))
}

/// POST /api/listings - Listing作成
pub async fn create_listing(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateListingRequest>,
) -> Result<(StatusCode, Json<ListingDetailResponse>), ApiError> {
    req.validate()?;

    let listing = state.store.create(&req).await?;
    state.search.mirror_upsert(&listing).await;

    info!("Listing created: id={}, title={}", listing.id, listing.title);

    Ok((
        StatusCode::CREATED,
        Json(ListingDetailResponse {
            success: true,
            listing: ListingResponse::from(&listing),
        }),
    ))
}

/// PUT /api/listings/:id - Listing更新（部分更新）
pub async fn update_listing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateListingRequest>,
) -> Result<Json<ListingDetailResponse>, ApiError> {
    req.validate()?;

    let listing = state.store.update(&id, &req).await?;
    state.search.mirror_upsert(&listing).await;

    info!("Listing updated: id={}", listing.id);

    Ok(Json(ListingDetailResponse {
        success: true,
        listing: ListingResponse::from(&listing),
    }))
}

/// DELETE /api/listings/:id - Listing削除（物理削除）
pub async fn delete_listing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteListingResponse>, ApiError> {
    state.store.delete(&id).await?;
    state.search.mirror_remove(&id).await;

    info!("Listing deleted: id={}", id);

    Ok(Json(DeleteListingResponse {
        success: true,
        message: "Listing deleted successfully".to_string(),
    }))
}
