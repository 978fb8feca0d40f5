//! Listing store: get/put by listing identifier
//!
//! `put` is an upsert with no uniqueness or conflict check. Each put is a
//! single atomic step, so readers never see a partially written listing.

use async_trait::async_trait;
use pla_common::Result;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::models::ProductListing;

#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<ProductListing>>;

    async fn put(&self, listing: ProductListing) -> Result<()>;

    async fn count(&self) -> Result<usize>;
}

/// Process-lifetime map; contents are lost on restart
#[derive(Debug, Default)]
pub struct InMemoryListingStore {
    listings: RwLock<HashMap<String, ProductListing>>,
    /// Simulated round trip after each write
    latency: Duration,
}

impl InMemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            listings: RwLock::new(HashMap::new()),
            latency,
        }
    }
}

#[async_trait]
impl ListingStore for InMemoryListingStore {
    async fn get(&self, id: &str) -> Result<Option<ProductListing>> {
        Ok(self.listings.read().await.get(id).cloned())
    }

    async fn put(&self, listing: ProductListing) -> Result<()> {
        self.listings
            .write()
            .await
            .insert(listing.id.clone(), listing);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.listings.read().await.len())
    }
}

/// Durable store in the `listings` table
#[derive(Debug, Clone)]
pub struct SqliteListingStore {
    pool: SqlitePool,
}

impl SqliteListingStore {
    /// Expects the schema from [`crate::db::init_tables`]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingStore for SqliteListingStore {
    async fn get(&self, id: &str) -> Result<Option<ProductListing>> {
        let row = sqlx::query(
            "SELECT id, title, description, price, image_url, category FROM listings WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| ProductListing {
            id: row.get("id"),
            title: row.get("title"),
            description: row.get("description"),
            price: row.get("price"),
            image_url: row.get("image_url"),
            category: row.get("category"),
        }))
    }

    async fn put(&self, listing: ProductListing) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO listings (id, title, description, price, image_url, category, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&listing.id)
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(listing.price)
        .bind(&listing.image_url)
        .bind(&listing.category)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM listings")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}
