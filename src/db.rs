//! Database Module
//! PostgreSQL（プライマリ）と SQLite（セカンダリ）のプール構築とスキーマ作成

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Postgres, Sqlite};
use tracing::info;

pub type PgPool = Pool<Postgres>;
pub type SqlitePool = Pool<Sqlite>;

/// プライマリストアへ lazy 接続する。
/// 起動時に到達不能でもプロセスは立ち上がり、操作ごとにセカンダリへフォールバックできる。
pub fn connect_primary(db_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new().max_connections(5).connect_lazy(db_url)?;
    Ok(pool)
}

/// プライマリ側の listings スキーマを作成する。失敗は呼び出し側で warn に落とす。
pub async fn ensure_primary_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS listings (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            location TEXT,
            category TEXT,
            price DOUBLE PRECISION NOT NULL,
            image_urls TEXT NOT NULL DEFAULT '',
            vendor_name TEXT NOT NULL,
            vendor_email TEXT NOT NULL,
            vendor_phone TEXT,
            vendor_service_offered TEXT,
            vendor_rating DOUBLE PRECISION,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
    "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_listings_category ON listings(category)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_listings_location ON listings(location)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_listings_created_at ON listings(created_at)")
        .execute(pool)
        .await?;

    info!("Primary schema ready");
    Ok(())
}

/// セカンダリ (SQLite) を初期化
pub async fn init_secondary(db_path: &str) -> Result<SqlitePool> {
    let db_url = format!("sqlite:{}?mode=rwc", db_path);

    info!("Initializing secondary database: {}", db_path);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    create_schema(&pool).await?;

    info!("Secondary database initialized successfully");
    Ok(pool)
}

/// SQLite 側スキーマ作成。フィールド名・型はプライマリと揃える。
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS listings (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            location TEXT,
            category TEXT,
            price REAL NOT NULL,
            image_urls TEXT NOT NULL DEFAULT '',
            vendor_name TEXT NOT NULL,
            vendor_email TEXT NOT NULL,
            vendor_phone TEXT,
            vendor_service_offered TEXT,
            vendor_rating REAL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
    "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_listings_category ON listings(category)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_listings_location ON listings(location)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_listings_created_at ON listings(created_at)")
        .execute(pool)
        .await?;

    Ok(())
}
