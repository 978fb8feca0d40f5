//! Image enhancement requests
//!
//! The editor presents brightness/contrast/saturation as sliders in
//! `[0, 200]` with 100 as neutral. The enhancement backend takes signed
//! offsets in `[-100, 100]`.

use serde::{Deserialize, Serialize};

/// Neutral slider position
pub const SLIDER_NEUTRAL: i16 = 100;

/// Largest slider value
pub const SLIDER_MAX: i16 = 200;

/// Largest absolute offset accepted by the backend
pub const OFFSET_LIMIT: i16 = 100;

/// Editor-facing enhancement choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum EnhancementSettings {
    /// One-click enhancement with professional defaults
    Auto,
    /// Slider values, each in `[0, 200]`
    Custom {
        brightness: i16,
        contrast: i16,
        saturation: i16,
    },
}

impl EnhancementSettings {
    /// Build the backend request for `source_image_reference`
    ///
    /// Slider values outside `[0, 200]` are clamped.
    pub fn to_request(&self, source_image_reference: impl Into<String>) -> EnhancementRequest {
        let source_image_reference = source_image_reference.into();
        match *self {
            EnhancementSettings::Auto => EnhancementRequest {
                source_image_reference,
                auto_enhance: true,
                auto_crop: true,
                brightness: 0,
                contrast: 0,
                saturation: 0,
            },
            EnhancementSettings::Custom {
                brightness,
                contrast,
                saturation,
            } => EnhancementRequest {
                source_image_reference,
                auto_enhance: false,
                auto_crop: true,
                brightness: slider_to_offset(brightness),
                contrast: slider_to_offset(contrast),
                saturation: slider_to_offset(saturation),
            },
        }
    }
}

fn slider_to_offset(value: i16) -> i16 {
    value.clamp(0, SLIDER_MAX) - SLIDER_NEUTRAL
}

/// Backend enhancement request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementRequest {
    pub source_image_reference: String,
    pub auto_enhance: bool,
    pub auto_crop: bool,
    pub brightness: i16,
    pub contrast: i16,
    pub saturation: i16,
}

impl EnhancementRequest {
    /// Names and values of offsets outside `[-100, 100]`
    pub fn out_of_range_offsets(&self) -> Vec<(&'static str, i16)> {
        [
            ("brightness", self.brightness),
            ("contrast", self.contrast),
            ("saturation", self.saturation),
        ]
        .into_iter()
        .filter(|(_, v)| v.abs() > OFFSET_LIMIT)
        .collect()
    }
}

/// Enhancement result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedImage {
    pub enhanced_image_url: String,
}
