//! セカンダリストア (SQLite)
//! プライマリと同じ操作を `?` プレースホルダで実装し、同じ行形式を返す

use async_trait::async_trait;

use super::ListingStore;
use crate::db::SqlitePool;
use crate::error::StoreError;
use crate::models::Listing;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingStore for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn create(&self, listing: &Listing) -> Result<Listing, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO listings (
                id, title, description, location, category, price,
                image_urls, vendor_name, vendor_email, vendor_phone,
                vendor_service_offered, vendor_rating, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        )
        .bind(&listing.id)
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(&listing.location)
        .bind(&listing.category)
        .bind(listing.price)
        .bind(&listing.image_urls)
        .bind(&listing.vendor_name)
        .bind(&listing.vendor_email)
        .bind(&listing.vendor_phone)
        .bind(&listing.vendor_service_offered)
        .bind(listing.vendor_rating)
        .bind(listing.created_at)
        .bind(listing.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(listing.clone())
    }

    async fn get(&self, id: &str) -> Result<Listing, StoreError> {
        sqlx::query_as::<_, Listing>("SELECT * FROM listings WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn get_all(&self) -> Result<Vec<Listing>, StoreError> {
        let rows =
            sqlx::query_as::<_, Listing>("SELECT * FROM listings ORDER BY created_at DESC, id ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    async fn update(&self, listing: &Listing) -> Result<Listing, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE listings SET
                title = ?, description = ?, location = ?, category = ?,
                price = ?, image_urls = ?, vendor_name = ?, vendor_email = ?,
                vendor_phone = ?, vendor_service_offered = ?, vendor_rating = ?,
                updated_at = ?
            WHERE id = ?
        "#,
        )
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(&listing.location)
        .bind(&listing.category)
        .bind(listing.price)
        .bind(&listing.image_urls)
        .bind(&listing.vendor_name)
        .bind(&listing.vendor_email)
        .bind(&listing.vendor_phone)
        .bind(&listing.vendor_service_offered)
        .bind(listing.vendor_rating)
        .bind(listing.updated_at)
        .bind(&listing.id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(listing.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM listings WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
