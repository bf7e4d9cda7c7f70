//! Legacy tagged-image representation.
//!
//! The hardware layer delivers frames as a raw pixel buffer paired with a
//! flat JSON tag map, and older file formats and remote protocols expect the
//! same shape back. This module converts between that representation and
//! [`Image`].
//!
//! Numeric tags are accepted both as JSON numbers and as numeric strings;
//! hardware adapters historically emitted either.

use crate::data::coords::{self, Coords};
use crate::data::image::{Image, PixelType};
use crate::data::metadata::Metadata;
use crate::data::pixels::PixelBuffer;
use crate::error::{AppResult, ScopeError};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Well-known tag keys.
pub mod tags {
    /// Image width in pixels.
    pub const WIDTH: &str = "Width";
    /// Image height in pixels.
    pub const HEIGHT: &str = "Height";
    /// Legacy pixel-type name (`GRAY8` / `GRAY16` / `RGB32`).
    pub const PIXEL_TYPE: &str = "PixelType";
    /// Time-point index.
    pub const FRAME_INDEX: &str = "Frame";
    /// Z-slice index.
    pub const SLICE_INDEX: &str = "Slice";
    /// Channel index.
    pub const CHANNEL_INDEX: &str = "ChannelIndex";
    /// Stage-position index.
    pub const POSITION_INDEX: &str = "PositionIndex";
    /// Camera device name.
    pub const CAMERA: &str = "Camera";
    /// Significant bits per component.
    pub const BIT_DEPTH: &str = "BitDepth";
    /// Exposure time in milliseconds.
    pub const EXPOSURE_MS: &str = "Exposure-ms";
    /// Milliseconds since acquisition start.
    pub const ELAPSED_TIME_MS: &str = "ElapsedTime-ms";
    /// RFC 3339 arrival timestamp.
    pub const RECEIVED_TIME: &str = "ReceivedTime";
    /// Physical pixel size in micrometers.
    pub const PIXEL_SIZE_UM: &str = "PixelSizeUm";
    /// Scope device-property snapshot (JSON object).
    pub const SCOPE_DATA: &str = "ScopeData";
    /// User-supplied properties (JSON object).
    pub const USER_DATA: &str = "UserData";
    /// Redundant full-axis coordinate map. Legacy: written for lossless
    /// round trip of arbitrary axis names; consumed only by
    /// [`coords_from_tags`](super::coords_from_tags).
    pub const COMPLETE_COORDS: &str = "completeCoords";
}

/// A hardware-delivered image record: raw pixels plus a flat tag map.
#[derive(Debug, Clone)]
pub struct TaggedImage {
    /// The raw pixel buffer.
    pub pixels: PixelBuffer,
    /// The flat key/value tag map.
    pub tags: Map<String, Value>,
}

fn tag_u64(tags: &Map<String, Value>, key: &str) -> AppResult<u64> {
    opt_tag_u64(tags, key)?.ok_or_else(|| ScopeError::MissingTag(key.to_string()))
}

fn opt_tag_u64(tags: &Map<String, Value>, key: &str) -> AppResult<Option<u64>> {
    let Some(value) = tags.get(key) else {
        return Ok(None);
    };
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse::<u64>().ok(),
        _ => None,
    };
    parsed.map(Some).ok_or(ScopeError::InvalidTag {
        key: key.to_string(),
        expected: "non-negative integer",
    })
}

fn opt_tag_f64(tags: &Map<String, Value>, key: &str) -> AppResult<Option<f64>> {
    let Some(value) = tags.get(key) else {
        return Ok(None);
    };
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    };
    parsed.map(Some).ok_or(ScopeError::InvalidTag {
        key: key.to_string(),
        expected: "number",
    })
}

fn opt_tag_str<'a>(tags: &'a Map<String, Value>, key: &str) -> AppResult<Option<&'a str>> {
    match tags.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(ScopeError::InvalidTag {
            key: key.to_string(),
            expected: "string",
        }),
    }
}

fn opt_tag_map(tags: &Map<String, Value>, key: &str) -> AppResult<HashMap<String, Value>> {
    match tags.get(key) {
        None => Ok(HashMap::new()),
        Some(Value::Object(map)) => Ok(map.clone().into_iter().collect()),
        Some(_) => Err(ScopeError::InvalidTag {
            key: key.to_string(),
            expected: "object",
        }),
    }
}

/// Decode [`Coords`] from a tag map's redundant `completeCoords` object.
///
/// Returns `Ok(None)` when the tag is absent (tags produced outside
/// [`Image::to_tagged`] generally lack it).
pub fn coords_from_tags(tags: &Map<String, Value>) -> AppResult<Option<Coords>> {
    let Some(value) = tags.get(tags::COMPLETE_COORDS) else {
        return Ok(None);
    };
    let Value::Object(entries) = value else {
        return Err(ScopeError::InvalidTag {
            key: tags::COMPLETE_COORDS.to_string(),
            expected: "object",
        });
    };
    let mut builder = Coords::builder();
    for (axis, index) in entries {
        let parsed = match index {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse::<u64>().ok(),
            _ => None,
        };
        let Some(index) = parsed else {
            return Err(ScopeError::InvalidTag {
                key: format!("{}.{axis}", tags::COMPLETE_COORDS),
                expected: "non-negative integer",
            });
        };
        builder = builder.index(axis, index as usize);
    }
    Ok(Some(builder.build()))
}

impl Image {
    /// Build an image from a hardware-delivered tagged record.
    ///
    /// Geometry comes from the `Width`/`Height`/`PixelType` tags (all
    /// mandatory); each of the four built-in coordinate index tags is
    /// optional, as is every descriptive metadata tag.
    pub fn from_tagged(tagged: &TaggedImage) -> AppResult<Image> {
        let width = tag_u64(&tagged.tags, tags::WIDTH)? as u32;
        let height = tag_u64(&tagged.tags, tags::HEIGHT)? as u32;
        let type_name = opt_tag_str(&tagged.tags, tags::PIXEL_TYPE)?
            .ok_or_else(|| ScopeError::MissingTag(tags::PIXEL_TYPE.to_string()))?;
        let pixel_type = PixelType::from_tag_name(type_name)?;

        let expected_element = if pixel_type == PixelType::Gray16 { 2 } else { 1 };
        if tagged.pixels.bytes_per_element() != expected_element {
            return Err(ScopeError::UnsupportedPixelType(format!(
                "{type_name} data in a buffer with {}-byte elements",
                tagged.pixels.bytes_per_element()
            )));
        }

        let mut builder = Coords::builder();
        for (key, axis) in [
            (tags::FRAME_INDEX, coords::TIME),
            (tags::SLICE_INDEX, coords::Z),
            (tags::CHANNEL_INDEX, coords::CHANNEL),
            (tags::POSITION_INDEX, coords::STAGE_POSITION),
        ] {
            if let Some(index) = opt_tag_u64(&tagged.tags, key)? {
                builder = builder.index(axis, index as usize);
            }
        }

        let mut metadata = Metadata::builder()
            .scope_data(opt_tag_map(&tagged.tags, tags::SCOPE_DATA)?)
            .user_data(opt_tag_map(&tagged.tags, tags::USER_DATA)?);
        if let Some(camera) = opt_tag_str(&tagged.tags, tags::CAMERA)? {
            metadata = metadata.camera(camera);
        }
        if let Some(bits) = opt_tag_u64(&tagged.tags, tags::BIT_DEPTH)? {
            metadata = metadata.bit_depth(bits as u32);
        }
        if let Some(ms) = opt_tag_f64(&tagged.tags, tags::EXPOSURE_MS)? {
            metadata = metadata.exposure_ms(ms);
        }
        if let Some(ms) = opt_tag_f64(&tagged.tags, tags::ELAPSED_TIME_MS)? {
            metadata = metadata.elapsed_time_ms(ms);
        }
        if let Some(um) = opt_tag_f64(&tagged.tags, tags::PIXEL_SIZE_UM)? {
            metadata = metadata.pixel_size_um(um);
        }
        if let Some(stamp) = opt_tag_str(&tagged.tags, tags::RECEIVED_TIME)? {
            let time = DateTime::parse_from_rfc3339(stamp)
                .map_err(|_| ScopeError::InvalidTag {
                    key: tags::RECEIVED_TIME.to_string(),
                    expected: "RFC 3339 timestamp",
                })?
                .with_timezone(&Utc);
            metadata = metadata.received_time(time);
        }

        Image::new(
            tagged.pixels.clone(),
            width,
            height,
            pixel_type.bytes_per_pixel(),
            pixel_type.num_components(),
            builder.build(),
            metadata.build(),
        )
    }

    /// Convert to the legacy tagged representation.
    ///
    /// Writes geometry and metadata tags, the four built-in index tags for
    /// whichever axes are present, and the redundant `completeCoords` object
    /// carrying every axis so that arbitrary axis names survive the round
    /// trip.
    pub fn to_tagged(&self) -> AppResult<TaggedImage> {
        let mut tags_map = Map::new();
        tags_map.insert(tags::WIDTH.into(), self.width().into());
        tags_map.insert(tags::HEIGHT.into(), self.height().into());
        tags_map.insert(
            tags::PIXEL_TYPE.into(),
            self.pixel_type()?.tag_name().into(),
        );

        for (key, axis) in [
            (tags::FRAME_INDEX, coords::TIME),
            (tags::SLICE_INDEX, coords::Z),
            (tags::CHANNEL_INDEX, coords::CHANNEL),
            (tags::POSITION_INDEX, coords::STAGE_POSITION),
        ] {
            if let Some(index) = self.coords().index(axis) {
                tags_map.insert(key.into(), (index as u64).into());
            }
        }

        let mut full_coords = Map::new();
        for (axis, index) in self.coords().axes() {
            full_coords.insert(axis.to_string(), (index as u64).into());
        }
        tags_map.insert(tags::COMPLETE_COORDS.into(), Value::Object(full_coords));

        let metadata = self.metadata();
        if let Some(camera) = &metadata.camera {
            tags_map.insert(tags::CAMERA.into(), camera.as_str().into());
        }
        if let Some(bits) = metadata.bit_depth {
            tags_map.insert(tags::BIT_DEPTH.into(), bits.into());
        }
        if let Some(ms) = metadata.exposure_ms {
            tags_map.insert(tags::EXPOSURE_MS.into(), ms.into());
        }
        if let Some(ms) = metadata.elapsed_time_ms {
            tags_map.insert(tags::ELAPSED_TIME_MS.into(), ms.into());
        }
        if let Some(um) = metadata.pixel_size_um {
            tags_map.insert(tags::PIXEL_SIZE_UM.into(), um.into());
        }
        if let Some(time) = metadata.received_time {
            tags_map.insert(tags::RECEIVED_TIME.into(), time.to_rfc3339().into());
        }
        if !metadata.scope_data.is_empty() {
            tags_map.insert(
                tags::SCOPE_DATA.into(),
                Value::Object(metadata.scope_data.clone().into_iter().collect()),
            );
        }
        if !metadata.user_data.is_empty() {
            tags_map.insert(
                tags::USER_DATA.into(),
                Value::Object(metadata.user_data.clone().into_iter().collect()),
            );
        }

        Ok(TaggedImage {
            pixels: self.raw_pixels().clone(),
            tags: tags_map,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gray8_tags(width: u32, height: u32) -> Map<String, Value> {
        let mut tags_map = Map::new();
        tags_map.insert(tags::WIDTH.into(), width.into());
        tags_map.insert(tags::HEIGHT.into(), height.into());
        tags_map.insert(tags::PIXEL_TYPE.into(), "GRAY8".into());
        tags_map
    }

    #[test]
    fn from_tagged_decodes_geometry_coords_and_metadata() {
        let mut tags_map = gray8_tags(2, 2);
        tags_map.insert(tags::FRAME_INDEX.into(), 3u64.into());
        tags_map.insert(tags::CHANNEL_INDEX.into(), 1u64.into());
        tags_map.insert(tags::CAMERA.into(), "MockCamera".into());
        tags_map.insert(tags::BIT_DEPTH.into(), 8u64.into());
        tags_map.insert(tags::EXPOSURE_MS.into(), json!(12.5));
        tags_map.insert(tags::SCOPE_DATA.into(), json!({"Shutter": "open"}));
        let tagged = TaggedImage {
            pixels: vec![10u8, 20, 30, 40].into(),
            tags: tags_map,
        };

        let image = Image::from_tagged(&tagged).unwrap();
        assert_eq!(image.width(), 2);
        assert_eq!(image.height(), 2);
        assert_eq!(image.num_components(), 1);
        assert_eq!(image.coords().index(coords::TIME), Some(3));
        assert_eq!(image.coords().index(coords::CHANNEL), Some(1));
        assert_eq!(image.coords().index(coords::Z), None);
        assert_eq!(image.metadata().camera.as_deref(), Some("MockCamera"));
        assert_eq!(image.metadata().exposure_ms, Some(12.5));
        assert_eq!(image.metadata().scope_data["Shutter"], json!("open"));
        assert_eq!(image.intensity_at(1, 0).unwrap(), 20);
    }

    #[test]
    fn numeric_string_tags_are_accepted() {
        let mut tags_map = gray8_tags(1, 1);
        tags_map.insert(tags::FRAME_INDEX.into(), "7".into());
        tags_map.insert(tags::EXPOSURE_MS.into(), "33.0".into());
        let tagged = TaggedImage {
            pixels: vec![9u8].into(),
            tags: tags_map,
        };
        let image = Image::from_tagged(&tagged).unwrap();
        assert_eq!(image.coords().index(coords::TIME), Some(7));
        assert_eq!(image.metadata().exposure_ms, Some(33.0));
    }

    #[test]
    fn missing_mandatory_tags_error() {
        let mut tags_map = gray8_tags(1, 1);
        tags_map.remove(tags::WIDTH);
        let tagged = TaggedImage {
            pixels: vec![9u8].into(),
            tags: tags_map,
        };
        assert!(matches!(
            Image::from_tagged(&tagged),
            Err(ScopeError::MissingTag(key)) if key == tags::WIDTH
        ));
    }

    #[test]
    fn unknown_pixel_type_errors() {
        let mut tags_map = gray8_tags(1, 1);
        tags_map.insert(tags::PIXEL_TYPE.into(), "GRAY12".into());
        let tagged = TaggedImage {
            pixels: vec![9u8].into(),
            tags: tags_map,
        };
        assert!(matches!(
            Image::from_tagged(&tagged),
            Err(ScopeError::UnsupportedPixelType(_))
        ));
    }

    #[test]
    fn element_width_must_match_pixel_type() {
        let tagged = TaggedImage {
            pixels: vec![9u16].into(),
            tags: gray8_tags(1, 1),
        };
        assert!(matches!(
            Image::from_tagged(&tagged),
            Err(ScopeError::UnsupportedPixelType(_))
        ));
    }

    #[test]
    fn round_trip_preserves_coords_for_all_axes() {
        let image = Image::new(
            vec![1u16, 2],
            2,
            1,
            2,
            1,
            Coords::builder()
                .time(4)
                .z(1)
                .channel(2)
                .stage_position(0)
                .index("sweepAngle", 9)
                .build(),
            Metadata::default(),
        )
        .unwrap();

        let tagged = image.to_tagged().unwrap();
        let recovered = coords_from_tags(&tagged.tags).unwrap().unwrap();
        assert_eq!(recovered, *image.coords());
        // The non-built-in axis survives only through completeCoords.
        assert_eq!(recovered.index("sweepAngle"), Some(9));
    }

    #[test]
    fn round_trip_reproduces_the_image() {
        let image = Image::new(
            vec![5u8, 6, 7, 8],
            2,
            2,
            1,
            1,
            Coords::builder().time(1).channel(0).build(),
            Metadata::builder()
                .camera("MockCamera")
                .bit_depth(8)
                .exposure_ms(10.0)
                .user_property("note", json!("roi 3"))
                .build(),
        )
        .unwrap();

        let back = Image::from_tagged(&image.to_tagged().unwrap()).unwrap();
        assert_eq!(back, image);
    }

    #[test]
    fn coords_tag_absent_yields_none() {
        assert!(coords_from_tags(&gray8_tags(1, 1)).unwrap().is_none());
    }

    #[test]
    fn malformed_coords_tag_errors() {
        let mut tags_map = gray8_tags(1, 1);
        tags_map.insert(tags::COMPLETE_COORDS.into(), json!({"time": "soon"}));
        assert!(matches!(
            coords_from_tags(&tags_map),
            Err(ScopeError::InvalidTag { .. })
        ));
    }
}
