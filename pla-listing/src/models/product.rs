//! Product records: analysis results, saved listings, export artifacts

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Reference product shown next to an analysis (read-only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarProduct {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub image_url: String,
}

/// Analysis result fetched by identifier for the review page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAnalysis {
    pub id: String,
    pub image_url: String,
    pub title: String,
    pub description: String,
    pub suggested_price: f64,
    pub category: String,
    pub similar_products: Vec<SimilarProduct>,
    pub competitor_products: Vec<SimilarProduct>,
}

/// User-approved listing, written by the review workflow on save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListing {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image_url: String,
    pub category: String,
}

/// Downloadable export of a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingExport {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image_url: String,
    pub category: String,
    /// ISO 8601, millisecond precision, UTC
    pub timestamp: String,
}

impl ListingExport {
    pub fn from_listing(listing: &ProductListing, generated_at: DateTime<Utc>) -> Self {
        Self {
            title: listing.title.clone(),
            description: listing.description.clone(),
            price: listing.price,
            image_url: listing.image_url.clone(),
            category: listing.category.clone(),
            timestamp: generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Download file name for a listing id
    pub fn file_name(listing_id: &str) -> String {
        format!("product-listing-{}.json", listing_id)
    }
}
