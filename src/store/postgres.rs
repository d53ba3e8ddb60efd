//! プライマリストア (PostgreSQL)

use async_trait::async_trait;

use super::ListingStore;
use crate::db::PgPool;
use crate::error::StoreError;
use crate::models::Listing;

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingStore for PostgresStore {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    async fn create(&self, listing: &Listing) -> Result<Listing, StoreError> {
        let row = sqlx::query_as::<_, Listing>(
            r#"
            INSERT INTO listings (
                id, title, description, location, category, price,
                image_urls, vendor_name, vendor_email, vendor_phone,
                vendor_service_offered, vendor_rating, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
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
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get(&self, id: &str) -> Result<Listing, StoreError> {
        sqlx::query_as::<_, Listing>("SELECT * FROM listings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn get_all(&self) -> Result<Vec<Listing>, StoreError> {
        let rows = sqlx::query_as::<_, Listing>(
            "SELECT * FROM listings ORDER BY created_at DESC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn update(&self, listing: &Listing) -> Result<Listing, StoreError> {
        sqlx::query_as::<_, Listing>(
            r#"
            UPDATE listings SET
                title = $2, description = $3, location = $4, category = $5,
                price = $6, image_urls = $7, vendor_name = $8, vendor_email = $9,
                vendor_phone = $10, vendor_service_offered = $11, vendor_rating = $12,
                updated_at = $13
            WHERE id = $1
            RETURNING *
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
        .bind(listing.updated_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
