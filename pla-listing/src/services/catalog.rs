//! Fetch-by-identifier for the review page
//!
//! [`SyntheticCatalog`] ignores where an identifier came from and always
//! returns synthesized data: the review page of any upload session shows
//! the same reference products, price and category, with a random title.
//!
//! [`SavedListingCatalog`] consults the listing store first and only
//! synthesizes for identifiers it has never saved. It is opt-in
//! (`review.prefer_saved_listings`).

use async_trait::async_trait;
use pla_common::Result;
use std::sync::Arc;

use crate::db::ListingStore;
use crate::models::{ProductAnalysis, SimilarProduct};
use crate::services::fallback_generator::{generate_fallback_description, generate_fallback_title};

pub const PLACEHOLDER_IMAGE_URL: &str = "/placeholder.svg?height=500&width=500";
pub const PLACEHOLDER_THUMBNAIL_URL: &str = "/placeholder.svg?height=100&width=100";
pub const SYNTHETIC_PRICE: f64 = 699.99;
pub const SYNTHETIC_CATEGORY: &str = "Electronics > Smartphones";

const SIMILAR_PRODUCTS: [(&str, &str, f64); 3] = [
    ("1", "Premium Smartphone X", 799.99),
    ("2", "Budget Smartphone Y", 499.99),
    ("3", "Mid-range Smartphone Z", 599.99),
];

const COMPETITOR_PRODUCTS: [(&str, &str, f64); 3] = [
    ("4", "Competitor Phone A", 749.99),
    ("5", "Competitor Phone B", 649.99),
    ("6", "Competitor Phone C", 699.99),
];

#[async_trait]
pub trait AnalysisLookup: Send + Sync {
    /// `Ok(None)` when the identifier is unknown to this lookup
    async fn product_analysis(&self, id: &str) -> Result<Option<ProductAnalysis>>;
}

fn reference_products(rows: &[(&str, &str, f64)]) -> Vec<SimilarProduct> {
    rows.iter()
        .map(|(id, title, price)| SimilarProduct {
            id: id.to_string(),
            title: title.to_string(),
            price: *price,
            image_url: PLACEHOLDER_THUMBNAIL_URL.to_string(),
        })
        .collect()
}

/// Always succeeds with synthesized content
#[derive(Debug, Default, Clone)]
pub struct SyntheticCatalog;

impl SyntheticCatalog {
    pub fn new() -> Self {
        Self
    }

    pub fn synthesize(&self, id: &str) -> ProductAnalysis {
        ProductAnalysis {
            id: id.to_string(),
            image_url: PLACEHOLDER_IMAGE_URL.to_string(),
            title: generate_fallback_title(),
            description: generate_fallback_description(),
            suggested_price: SYNTHETIC_PRICE,
            category: SYNTHETIC_CATEGORY.to_string(),
            similar_products: reference_products(&SIMILAR_PRODUCTS),
            competitor_products: reference_products(&COMPETITOR_PRODUCTS),
        }
    }
}

#[async_trait]
impl AnalysisLookup for SyntheticCatalog {
    async fn product_analysis(&self, id: &str) -> Result<Option<ProductAnalysis>> {
        if id.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.synthesize(id)))
    }
}

/// Saved listings first, synthesized data for unknown identifiers
pub struct SavedListingCatalog {
    store: Arc<dyn ListingStore>,
    fallback: SyntheticCatalog,
}

impl SavedListingCatalog {
    pub fn new(store: Arc<dyn ListingStore>) -> Self {
        Self {
            store,
            fallback: SyntheticCatalog::new(),
        }
    }
}

#[async_trait]
impl AnalysisLookup for SavedListingCatalog {
    async fn product_analysis(&self, id: &str) -> Result<Option<ProductAnalysis>> {
        if id.is_empty() {
            return Ok(None);
        }

        match self.store.get(id).await? {
            Some(listing) => {
                tracing::debug!(listing_id = %id, "Review data loaded from saved listing");
                Ok(Some(ProductAnalysis {
                    id: listing.id,
                    image_url: listing.image_url,
                    title: listing.title,
                    description: listing.description,
                    suggested_price: listing.price,
                    category: listing.category,
                    similar_products: reference_products(&SIMILAR_PRODUCTS),
                    competitor_products: reference_products(&COMPETITOR_PRODUCTS),
                }))
            }
            None => self.fallback.product_analysis(id).await,
        }
    }
}
