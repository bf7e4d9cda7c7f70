//! Acquisition-time image metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Descriptive information attached to an image at acquisition time.
///
/// Everything is optional: images loaded from legacy tag maps may carry only
/// a subset of these fields. `scope_data` holds device-property snapshots
/// taken from the hardware layer; `user_data` holds whatever a script or
/// user attached.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Metadata {
    /// Name of the camera that produced the image.
    pub camera: Option<String>,
    /// Significant bits per component (a 12-bit camera yields values in
    /// [0, 4095] even though they occupy two bytes).
    pub bit_depth: Option<u32>,
    /// Exposure time in milliseconds.
    pub exposure_ms: Option<f64>,
    /// Milliseconds since the start of the acquisition.
    pub elapsed_time_ms: Option<f64>,
    /// Wall-clock time the image arrived from the hardware.
    pub received_time: Option<DateTime<Utc>>,
    /// Physical pixel size in micrometers.
    pub pixel_size_um: Option<f64>,
    /// Device-property snapshot from the scope at acquisition time.
    pub scope_data: HashMap<String, serde_json::Value>,
    /// User- or script-supplied properties.
    pub user_data: HashMap<String, serde_json::Value>,
}

impl Metadata {
    /// Start building a new `Metadata` from scratch.
    pub fn builder() -> MetadataBuilder {
        MetadataBuilder::default()
    }

    /// Start a builder seeded with this value's fields.
    pub fn copy(&self) -> MetadataBuilder {
        MetadataBuilder {
            inner: self.clone(),
        }
    }
}

/// A builder for constructing `Metadata` instances.
#[derive(Default)]
pub struct MetadataBuilder {
    inner: Metadata,
}

impl MetadataBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the camera name.
    pub fn camera(mut self, camera: &str) -> Self {
        self.inner.camera = Some(camera.to_string());
        self
    }

    /// Set the significant bits per component.
    pub fn bit_depth(mut self, bits: u32) -> Self {
        self.inner.bit_depth = Some(bits);
        self
    }

    /// Set the exposure time in milliseconds.
    pub fn exposure_ms(mut self, ms: f64) -> Self {
        self.inner.exposure_ms = Some(ms);
        self
    }

    /// Set the elapsed acquisition time in milliseconds.
    pub fn elapsed_time_ms(mut self, ms: f64) -> Self {
        self.inner.elapsed_time_ms = Some(ms);
        self
    }

    /// Set the wall-clock arrival time.
    pub fn received_time(mut self, time: DateTime<Utc>) -> Self {
        self.inner.received_time = Some(time);
        self
    }

    /// Set the physical pixel size in micrometers.
    pub fn pixel_size_um(mut self, um: f64) -> Self {
        self.inner.pixel_size_um = Some(um);
        self
    }

    /// Attach one scope device property.
    pub fn scope_property(mut self, key: &str, value: serde_json::Value) -> Self {
        self.inner.scope_data.insert(key.to_string(), value);
        self
    }

    /// Replace the whole scope-property map.
    pub fn scope_data(mut self, data: HashMap<String, serde_json::Value>) -> Self {
        self.inner.scope_data = data;
        self
    }

    /// Attach one user property.
    pub fn user_property(mut self, key: &str, value: serde_json::Value) -> Self {
        self.inner.user_data.insert(key.to_string(), value);
        self
    }

    /// Replace the whole user-property map.
    pub fn user_data(mut self, data: HashMap<String, serde_json::Value>) -> Self {
        self.inner.user_data = data;
        self
    }

    /// Finish building.
    pub fn build(self) -> Metadata {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_round_trip() {
        let meta = Metadata::builder()
            .camera("Prime95B")
            .bit_depth(12)
            .exposure_ms(33.0)
            .scope_property("Objective-Label", json!("40x"))
            .user_property("note", json!("focus drift suspected"))
            .build();
        assert_eq!(meta.camera.as_deref(), Some("Prime95B"));
        assert_eq!(meta.bit_depth, Some(12));
        assert_eq!(meta.scope_data["Objective-Label"], json!("40x"));
        assert_eq!(meta.user_data["note"], json!("focus drift suspected"));
    }

    #[test]
    fn copy_seeds_a_builder_without_mutating_original() {
        let original = Metadata::builder().camera("CamA").bit_depth(8).build();
        let derived = original.copy().camera("CamB").build();
        assert_eq!(original.camera.as_deref(), Some("CamA"));
        assert_eq!(derived.camera.as_deref(), Some("CamB"));
        assert_eq!(derived.bit_depth, Some(8));
    }

    #[test]
    fn serializes_and_deserializes() {
        let meta = Metadata::builder()
            .camera("MockCamera")
            .received_time(Utc::now())
            .build();
        let json = serde_json::to_string(&meta).unwrap();
        let back: Metadata = serde_json::from_str(&json).unwrap();
        assert_eq!(meta, back);
    }
}
