//! Review session registry
//!
//! One [`ReviewSession`] per analysis identifier. Opening a review fetches
//! the analysis through [`AnalysisLookup`]; re-opening replaces the session
//! and discards unsaved edits. Save and export take a copy of the current
//! values under the lock and run the store call without it.
//!
//! The registry is bounded: opening a review beyond capacity drops the
//! least recently used one, and idle reviews are swept. Saved listings
//! live in the store and are unaffected.

use chrono::Utc;
use pla_common::events::{EventBus, PlaEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::registry::SessionRegistry;
use super::review::{ReviewField, ReviewSession, ReviewSnapshot};
use super::ReviewError;
use crate::db::ListingStore;
use crate::models::{ListingExport, ProductListing};
use crate::services::AnalysisLookup;

type ReviewHandle = Arc<Mutex<ReviewSession>>;

#[derive(Clone)]
pub struct ReviewSessions {
    sessions: SessionRegistry<String, ReviewHandle>,
    lookup: Arc<dyn AnalysisLookup>,
    store: Arc<dyn ListingStore>,
    event_bus: EventBus,
}

impl ReviewSessions {
    pub fn new(
        lookup: Arc<dyn AnalysisLookup>,
        store: Arc<dyn ListingStore>,
        event_bus: EventBus,
        capacity: usize,
    ) -> Self {
        Self {
            sessions: SessionRegistry::new(capacity),
            lookup,
            store,
            event_bus,
        }
    }

    /// Fetch the analysis for `analysis_id` and start reviewing it
    pub async fn open(&self, analysis_id: &str) -> Result<ReviewSnapshot, ReviewError> {
        let record = match self.lookup.product_analysis(analysis_id).await {
            Ok(Some(record)) => record,
            Ok(None) => return Err(ReviewError::NotFound(analysis_id.to_string())),
            Err(e) => {
                error!(analysis_id = %analysis_id, error = %e, "Analysis lookup failed");
                return Err(ReviewError::ServiceFailure(e.to_string()));
            }
        };

        let session = ReviewSession::new(record);
        let snapshot = session.snapshot();
        let replaced = self
            .sessions
            .insert(analysis_id.to_string(), Arc::new(Mutex::new(session)))
            .await;

        info!(analysis_id = %analysis_id, replaced, "Review session opened");
        Ok(snapshot)
    }

    async fn handle(&self, analysis_id: &str) -> Result<ReviewHandle, ReviewError> {
        self.sessions
            .get(analysis_id)
            .await
            .ok_or_else(|| ReviewError::NotFound(analysis_id.to_string()))
    }

    pub async fn snapshot(&self, analysis_id: &str) -> Result<ReviewSnapshot, ReviewError> {
        let session = self.handle(analysis_id).await?;
        let snapshot = session.lock().await.snapshot();
        Ok(snapshot)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.len().await
    }

    /// Drop reviews idle for longer than `idle`; unsaved edits are lost
    pub async fn sweep_idle(&self, idle: Duration) -> usize {
        self.sessions.sweep_idle(idle).await
    }

    pub async fn start_edit(
        &self,
        analysis_id: &str,
        field: ReviewField,
    ) -> Result<ReviewSnapshot, ReviewError> {
        let session = self.handle(analysis_id).await?;
        let mut review = session.lock().await;
        review.start_edit(field);
        debug!(analysis_id = %analysis_id, field = %field, "Editing field");
        Ok(review.snapshot())
    }

    pub async fn update(
        &self,
        analysis_id: &str,
        field: ReviewField,
        text: String,
    ) -> Result<ReviewSnapshot, ReviewError> {
        let session = self.handle(analysis_id).await?;
        let mut review = session.lock().await;
        review.update(field, text)?;
        Ok(review.snapshot())
    }

    pub async fn confirm(
        &self,
        analysis_id: &str,
        field: ReviewField,
    ) -> Result<ReviewSnapshot, ReviewError> {
        let session = self.handle(analysis_id).await?;
        let mut review = session.lock().await;
        review.confirm(field);
        debug!(analysis_id = %analysis_id, field = %field, "Field confirmed");
        Ok(review.snapshot())
    }

    pub async fn cancel(
        &self,
        analysis_id: &str,
        field: ReviewField,
    ) -> Result<ReviewSnapshot, ReviewError> {
        let session = self.handle(analysis_id).await?;
        let mut review = session.lock().await;
        review.cancel(field);
        debug!(analysis_id = %analysis_id, field = %field, "Field edit cancelled");
        Ok(review.snapshot())
    }

    /// Persist the current values as a listing
    ///
    /// Fields still in edit mode are saved with their in-progress text.
    pub async fn save(&self, analysis_id: &str) -> Result<ProductListing, ReviewError> {
        let session = self.handle(analysis_id).await?;
        let listing = session.lock().await.to_listing()?;

        if let Err(e) = self.store.put(listing.clone()).await {
            error!(listing_id = %listing.id, error = %e, "Failed to save listing");
            self.event_bus.emit_lossy(PlaEvent::notify_error(
                "Save failed",
                "There was an error saving your product listing. Please try again.",
            ));
            return Err(ReviewError::ServiceFailure(e.to_string()));
        }

        info!(listing_id = %listing.id, price = listing.price, "Listing saved");
        self.event_bus.emit_lossy(PlaEvent::ListingSaved {
            listing_id: listing.id.clone(),
            timestamp: Utc::now(),
        });
        self.event_bus.emit_lossy(PlaEvent::notify(
            "Product saved",
            "Your product listing has been saved successfully.",
        ));
        Ok(listing)
    }

    /// Pretty-printed JSON document and its download file name
    pub async fn export(&self, analysis_id: &str) -> Result<(String, String), ReviewError> {
        let session = self.handle(analysis_id).await?;
        let export = session.lock().await.to_export(Utc::now())?;

        let body = serde_json::to_string_pretty(&export)
            .map_err(|e| ReviewError::Serialization(e.to_string()))?;
        let file_name = ListingExport::file_name(analysis_id);

        info!(listing_id = %analysis_id, file_name = %file_name, "Listing exported");
        self.event_bus.emit_lossy(PlaEvent::ListingExported {
            listing_id: analysis_id.to_string(),
            timestamp: Utc::now(),
        });
        self.event_bus.emit_lossy(PlaEvent::notify(
            "Export complete",
            "Your product listing has been exported as JSON.",
        ));
        Ok((file_name, body))
    }

    /// Read back a saved listing
    pub async fn saved_listing(&self, listing_id: &str) -> Result<ProductListing, ReviewError> {
        match self.store.get(listing_id).await {
            Ok(Some(listing)) => Ok(listing),
            Ok(None) => Err(ReviewError::NotFound(listing_id.to_string())),
            Err(e) => Err(ReviewError::ServiceFailure(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryListingStore;
    use crate::services::{SavedListingCatalog, SyntheticCatalog};

    fn sessions_with(store: Arc<dyn ListingStore>, lookup: Arc<dyn AnalysisLookup>) -> ReviewSessions {
        ReviewSessions::new(lookup, store, EventBus::new(16), 16)
    }

    fn sessions() -> (ReviewSessions, Arc<InMemoryListingStore>) {
        let store = Arc::new(InMemoryListingStore::new());
        let sessions = sessions_with(store.clone(), Arc::new(SyntheticCatalog::new()));
        (sessions, store)
    }

    #[tokio::test]
    async fn test_open_synthesizes_review() {
        let (sessions, _) = sessions();
        let snapshot = sessions.open("lq3k9x0abcdef").await.unwrap();

        assert_eq!(snapshot.analysis.id, "lq3k9x0abcdef");
        assert_eq!(snapshot.analysis.category, "Electronics > Smartphones");
        assert_eq!(snapshot.analysis.similar_products.len(), 3);
        assert_eq!(snapshot.analysis.competitor_products.len(), 3);
        assert_eq!(snapshot.formatted_price.as_deref(), Some("$699.99"));
    }

    #[tokio::test]
    async fn test_empty_identifier_not_found() {
        let (sessions, _) = sessions();
        assert_eq!(
            sessions.open("").await.unwrap_err(),
            ReviewError::NotFound(String::new())
        );
        assert!(matches!(
            sessions.snapshot("never-opened").await,
            Err(ReviewError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_save_then_get_returns_equal_record() {
        let (sessions, store) = sessions();
        sessions.open("abc").await.unwrap();
        sessions.start_edit("abc", ReviewField::Title).await.unwrap();
        sessions
            .update("abc", ReviewField::Title, "Refurbished Phone".to_string())
            .await
            .unwrap();
        sessions.confirm("abc", ReviewField::Title).await.unwrap();

        let saved = sessions.save("abc").await.unwrap();
        assert_eq!(saved.title, "Refurbished Phone");
        assert_eq!(store.get("abc").await.unwrap(), Some(saved.clone()));
        assert_eq!(sessions.saved_listing("abc").await.unwrap(), saved);
    }

    #[tokio::test]
    async fn test_save_rejects_invalid_price() {
        let (sessions, store) = sessions();
        sessions.open("abc").await.unwrap();
        sessions.start_edit("abc", ReviewField::Price).await.unwrap();
        sessions
            .update("abc", ReviewField::Price, "cheap".to_string())
            .await
            .unwrap();

        assert!(matches!(
            sessions.save("abc").await,
            Err(ReviewError::InvalidPrice(_))
        ));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_export_document() {
        let (sessions, _) = sessions();
        sessions.open("abc").await.unwrap();

        let (file_name, body) = sessions.export("abc").await.unwrap();
        assert_eq!(file_name, "product-listing-abc.json");

        let doc: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(doc["price"], 699.99);
        assert_eq!(doc["category"], "Electronics > Smartphones");
        assert!(doc["imageUrl"].is_string());
        assert!(doc["timestamp"].as_str().unwrap().ends_with('Z'));
        // Export never carries the identifier
        assert!(doc.get("id").is_none());
    }

    #[tokio::test]
    async fn test_reopen_discards_unsaved_edits() {
        let (sessions, _) = sessions();
        sessions.open("abc").await.unwrap();
        sessions.start_edit("abc", ReviewField::Price).await.unwrap();
        sessions
            .update("abc", ReviewField::Price, "1".to_string())
            .await
            .unwrap();

        let snapshot = sessions.open("abc").await.unwrap();
        assert_eq!(snapshot.price.value(), "699.99");
        assert_eq!(sessions.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_saved_listing_catalog_reopens_saved_values() {
        let store: Arc<InMemoryListingStore> = Arc::new(InMemoryListingStore::new());
        let sessions = sessions_with(store.clone(), Arc::new(SavedListingCatalog::new(store.clone())));

        sessions.open("abc").await.unwrap();
        sessions.start_edit("abc", ReviewField::Price).await.unwrap();
        sessions
            .update("abc", ReviewField::Price, "42.5".to_string())
            .await
            .unwrap();
        sessions.save("abc").await.unwrap();

        let reopened = sessions.open("abc").await.unwrap();
        assert_eq!(reopened.price.value(), "42.5");
        assert_eq!(reopened.formatted_price.as_deref(), Some("$42.50"));
    }

    #[tokio::test]
    async fn test_save_emits_notification() {
        let (sessions, _) = sessions();
        let mut rx = sessions.event_bus.subscribe();
        sessions.open("abc").await.unwrap();
        sessions.save("abc").await.unwrap();

        assert!(matches!(rx.recv().await.unwrap(), PlaEvent::ListingSaved { .. }));
        match rx.recv().await.unwrap() {
            PlaEvent::Notification { title, .. } => assert_eq!(title, "Product saved"),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_open_beyond_capacity_drops_oldest_review() {
        let store = Arc::new(InMemoryListingStore::new());
        let sessions = ReviewSessions::new(
            Arc::new(SyntheticCatalog::new()),
            store,
            EventBus::new(16),
            2,
        );

        for id in ["first", "second", "third", "fourth"] {
            sessions.open(id).await.unwrap();
        }

        assert_eq!(sessions.session_count().await, 2);
        assert!(matches!(
            sessions.snapshot("first").await,
            Err(ReviewError::NotFound(_))
        ));
        assert!(sessions.snapshot("fourth").await.is_ok());
    }

    #[tokio::test]
    async fn test_sweep_keeps_active_reviews() {
        let (sessions, _) = sessions();
        sessions.open("abc").await.unwrap();

        assert_eq!(sessions.sweep_idle(Duration::from_secs(60)).await, 0);
        assert!(sessions.snapshot("abc").await.is_ok());
    }
}
