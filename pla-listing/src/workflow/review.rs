//! Results review workflow
//!
//! Three independently toggled field editors (title, description, price)
//! over a loaded [`ProductAnalysis`]. Each editor follows the same protocol:
//!
//! - `start_edit`: enter edit mode; the current value is already the
//!   mutable field, nothing else is captured
//! - `update`: replace the in-progress text (edit mode only)
//! - `confirm`: keep the text, leave edit mode
//! - `cancel`: restore the value from the loaded record, leave edit mode
//!
//! Save and export read the current values, edit mode or not, and reject
//! a price that is not a finite non-negative number.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ReviewError;
use crate::models::{ListingExport, ProductAnalysis, ProductListing};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewField {
    Title,
    Description,
    Price,
}

impl fmt::Display for ReviewField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReviewField::Title => "title",
            ReviewField::Description => "description",
            ReviewField::Price => "price",
        };
        f.write_str(name)
    }
}

/// One editable text field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldEditor {
    value: String,
    #[serde(skip)]
    original: String,
    editing: bool,
}

impl FieldEditor {
    pub fn new(original: impl Into<String>) -> Self {
        let original = original.into();
        Self {
            value: original.clone(),
            original,
            editing: false,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn start_edit(&mut self) {
        self.editing = true;
    }

    /// Replace the in-progress text; false outside edit mode
    pub fn update(&mut self, text: impl Into<String>) -> bool {
        if !self.editing {
            return false;
        }
        self.value = text.into();
        true
    }

    pub fn confirm(&mut self) {
        self.editing = false;
    }

    pub fn cancel(&mut self) {
        self.value = self.original.clone();
        self.editing = false;
    }
}

/// Price text as a finite non-negative number
pub fn parse_price(text: &str) -> Result<f64, ReviewError> {
    match text.trim().parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => Ok(price),
        _ => Err(ReviewError::InvalidPrice(text.to_string())),
    }
}

/// `$` and exactly two decimals; `None` for unparseable text
pub fn format_price(text: &str) -> Option<String> {
    parse_price(text).ok().map(|price| format!("${:.2}", price))
}

/// Serializable view of a review session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSnapshot {
    pub analysis: ProductAnalysis,
    pub title: FieldEditor,
    pub description: FieldEditor,
    pub price: FieldEditor,
    /// `None` when the price text does not parse
    pub formatted_price: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReviewSession {
    record: ProductAnalysis,
    title: FieldEditor,
    description: FieldEditor,
    price: FieldEditor,
}

impl ReviewSession {
    pub fn new(record: ProductAnalysis) -> Self {
        Self {
            title: FieldEditor::new(record.title.clone()),
            description: FieldEditor::new(record.description.clone()),
            price: FieldEditor::new(record.suggested_price.to_string()),
            record,
        }
    }

    pub fn field(&self, field: ReviewField) -> &FieldEditor {
        match field {
            ReviewField::Title => &self.title,
            ReviewField::Description => &self.description,
            ReviewField::Price => &self.price,
        }
    }

    fn field_mut(&mut self, field: ReviewField) -> &mut FieldEditor {
        match field {
            ReviewField::Title => &mut self.title,
            ReviewField::Description => &mut self.description,
            ReviewField::Price => &mut self.price,
        }
    }

    pub fn start_edit(&mut self, field: ReviewField) {
        self.field_mut(field).start_edit();
    }

    pub fn update(&mut self, field: ReviewField, text: impl Into<String>) -> Result<(), ReviewError> {
        if self.field_mut(field).update(text) {
            Ok(())
        } else {
            Err(ReviewError::NotEditing(field))
        }
    }

    pub fn confirm(&mut self, field: ReviewField) {
        self.field_mut(field).confirm();
    }

    pub fn cancel(&mut self, field: ReviewField) {
        self.field_mut(field).cancel();
    }

    pub fn formatted_price(&self) -> Option<String> {
        format_price(self.price.value())
    }

    /// Listing built from the current field values
    pub fn to_listing(&self) -> Result<ProductListing, ReviewError> {
        let price = parse_price(self.price.value())?;
        Ok(ProductListing {
            id: self.record.id.clone(),
            title: self.title.value().to_string(),
            description: self.description.value().to_string(),
            price,
            image_url: self.record.image_url.clone(),
            category: self.record.category.clone(),
        })
    }

    pub fn to_export(&self, generated_at: DateTime<Utc>) -> Result<ListingExport, ReviewError> {
        Ok(ListingExport::from_listing(&self.to_listing()?, generated_at))
    }

    pub fn snapshot(&self) -> ReviewSnapshot {
        ReviewSnapshot {
            analysis: self.record.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            price: self.price.clone(),
            formatted_price: self.formatted_price(),
        }
    }
}
