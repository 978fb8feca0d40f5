//! Data model for the listing workflows

pub mod enhancement;
pub mod pending_image;
pub mod product;

pub use enhancement::{EnhancedImage, EnhancementRequest, EnhancementSettings, SLIDER_NEUTRAL};
pub use pending_image::{PendingImage, UploadedFile};
pub use product::{ListingExport, ProductAnalysis, ProductListing, SimilarProduct};
