//! Error Types
//! ストア障害・インデックス障害・入力エラーの区別

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::warn;

/// リレーショナルストア層のエラー
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 対象 ID が存在しない。権威ある応答なのでフォールバックしない。
    #[error("listing not found")]
    NotFound,

    /// プライマリ・セカンダリ両方が失敗した
    #[error("all stores unavailable")]
    Unavailable,

    /// 単一バックエンドの失敗（ルーター内部でフォールバックを誘発する）
    #[error("store backend error: {0}")]
    Backend(#[from] sqlx::Error),
}

/// 検索インデックス層のエラー。常にローカルで回復され、呼び出し元へは致命化しない。
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("search index unavailable: {0}")]
    Unavailable(String),

    #[error("search index request timed out")]
    Timeout,

    #[error("malformed search index response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for IndexError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            IndexError::Timeout
        } else {
            IndexError::Unavailable(err.to_string())
        }
    }
}

/// ハンドラが返す API エラー
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("listing not found")]
    NotFound,

    #[error("database operation failed")]
    Store(#[source] StoreError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound,
            other => ApiError::Store(other),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::Unavailable) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        warn!("API Error: {}", self);
        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
