//! Data Models
//! Listing のデータ構造定義（DB行・リクエスト・レスポンス）

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// ========================================
// Listing
// ========================================

/// Listing (DB row)
///
/// PostgreSQL / SQLite の両方で同じフィールド名・型にそろえる。
/// image_urls はカンマ区切り TEXT（API では配列として往復する）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub price: f64,
    pub image_urls: String,
    pub vendor_name: String,
    pub vendor_email: String,
    pub vendor_phone: Option<String>,
    pub vendor_service_offered: Option<String>,
    pub vendor_rating: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing 作成リクエスト
///
/// 画像はアップロード済み URI の列で受け取る（アップロード自体は外部パイプライン）。
#[derive(Debug, Clone, Deserialize)]
pub struct CreateListingRequest {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub vendor_name: String,
    pub vendor_email: String,
    pub vendor_phone: Option<String>,
    pub vendor_service_offered: Option<String>,
    pub vendor_rating: Option<f64>,
}

/// Listing 更新リクエスト（部分更新: 未指定フィールドは現在値を維持）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateListingRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub image_urls: Option<Vec<String>>,
    pub vendor_name: Option<String>,
    pub vendor_email: Option<String>,
    pub vendor_phone: Option<String>,
    pub vendor_service_offered: Option<String>,
    pub vendor_rating: Option<f64>,
}

/// Listing レスポンス（API返却用・検索インデックスのドキュメント形式と共用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub price: f64,
    pub image_urls: Vec<String>,
    pub vendor_name: String,
    pub vendor_email: String,
    pub vendor_phone: Option<String>,
    pub vendor_service_offered: Option<String>,
    pub vendor_rating: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Listing> for ListingResponse {
    fn from(l: &Listing) -> Self {
        ListingResponse {
            id: l.id.clone(),
            title: l.title.clone(),
            description: l.description.clone(),
            location: l.location.clone(),
            category: l.category.clone(),
            price: l.price,
            image_urls: split_image_urls(&l.image_urls),
            vendor_name: l.vendor_name.clone(),
            vendor_email: l.vendor_email.clone(),
            vendor_phone: l.vendor_phone.clone(),
            vendor_service_offered: l.vendor_service_offered.clone(),
            vendor_rating: l.vendor_rating,
            created_at: l.created_at,
            updated_at: l.updated_at,
        }
    }
}

// ========================================
// image_urls 変換
// ========================================

/// カンマ区切り TEXT → URI 列。空要素は落とす。
pub fn split_image_urls(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// URI 列 → カンマ区切り TEXT
pub fn join_image_urls(urls: &[String]) -> String {
    urls.join(",")
}

// ========================================
// バリデーション
// ========================================

impl CreateListingRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::Validation("title is required".to_string()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ApiError::Validation(
                "price must be a non-negative number".to_string(),
            ));
        }
        if self.vendor_name.trim().is_empty() {
            return Err(ApiError::Validation("vendor_name is required".to_string()));
        }
        validate_email(&self.vendor_email)?;
        validate_rating(self.vendor_rating)?;
        Ok(())
    }
}

impl UpdateListingRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(ApiError::Validation("title must not be empty".to_string()));
            }
        }
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Err(ApiError::Validation(
                    "price must be a non-negative number".to_string(),
                ));
            }
        }
        if let Some(email) = &self.vendor_email {
            validate_email(email)?;
        }
        validate_rating(self.vendor_rating)?;
        Ok(())
    }

    /// 部分更新のマージ。image_urls は既存列への追記、それ以外は上書きか現在値維持。
    pub fn apply_to(&self, current: &Listing, now: DateTime<Utc>) -> Listing {
        let mut image_urls = split_image_urls(&current.image_urls);
        if let Some(more) = &self.image_urls {
            image_urls.extend(more.iter().cloned());
        }
        Listing {
            id: current.id.clone(),
            title: self.title.clone().unwrap_or_else(|| current.title.clone()),
            description: self
                .description
                .clone()
                .or_else(|| current.description.clone()),
            location: self.location.clone().or_else(|| current.location.clone()),
            category: self.category.clone().or_else(|| current.category.clone()),
            price: self.price.unwrap_or(current.price),
            image_urls: join_image_urls(&image_urls),
            vendor_name: self
                .vendor_name
                .clone()
                .unwrap_or_else(|| current.vendor_name.clone()),
            vendor_email: self
                .vendor_email
                .clone()
                .unwrap_or_else(|| current.vendor_email.clone()),
            vendor_phone: self
                .vendor_phone
                .clone()
                .or_else(|| current.vendor_phone.clone()),
            vendor_service_offered: self
                .vendor_service_offered
                .clone()
                .or_else(|| current.vendor_service_offered.clone()),
            vendor_rating: self.vendor_rating.or(current.vendor_rating),
            created_at: current.created_at,
            updated_at: now,
        }
    }
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(ApiError::Validation(
            "a valid vendor_email is required".to_string(),
        ));
    }
    Ok(())
}

fn validate_rating(rating: Option<f64>) -> Result<(), ApiError> {
    if let Some(r) = rating {
        if !(0.0..=5.0).contains(&r) {
            return Err(ApiError::Validation(
                "vendor_rating must be between 0 and 5".to_string(),
            ));
        }
    }
    Ok(())
}
