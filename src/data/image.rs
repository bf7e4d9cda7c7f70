//! The immutable image value type.
//!
//! An [`Image`] bundles a raw pixel buffer with its geometry, its position
//! within the acquisition ([`Coords`]) and its acquisition-time
//! [`Metadata`]. Images are never mutated in place: the `copy_*`
//! transformations produce new values that share the pixel allocation, and
//! [`Image::split_multi_component`] produces new images that own freshly
//! extracted buffers.
//!
//! Pixel layout: the buffer packs `num_components` interleaved component
//! intensities per pixel, row-major. `bytes_per_pixel` covers all
//! components; `bytes_per_component` is fixed by the buffer's element width
//! (one byte for 8-bit data, two for 16-bit data).

use crate::data::coords::Coords;
use crate::data::metadata::Metadata;
use crate::data::pixels::PixelBuffer;
use crate::data::store::ImageStore;
use crate::error::{AppResult, ScopeError};
use std::fmt;
use std::sync::Arc;

/// Legacy pixel-type classification used by the tagged-image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelType {
    /// 8-bit single-component grayscale.
    Gray8,
    /// 16-bit single-component grayscale.
    Gray16,
    /// 8-bit-per-component color packed four bytes per pixel (one ignored).
    Rgb32,
}

impl PixelType {
    /// The tag-map string for this pixel type.
    pub fn tag_name(self) -> &'static str {
        match self {
            PixelType::Gray8 => "GRAY8",
            PixelType::Gray16 => "GRAY16",
            PixelType::Rgb32 => "RGB32",
        }
    }

    /// Parse a tag-map string.
    pub fn from_tag_name(name: &str) -> AppResult<Self> {
        match name {
            "GRAY8" => Ok(PixelType::Gray8),
            "GRAY16" => Ok(PixelType::Gray16),
            "RGB32" => Ok(PixelType::Rgb32),
            other => Err(ScopeError::UnsupportedPixelType(other.to_string())),
        }
    }

    /// Bytes allocated to each pixel, all components included.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelType::Gray8 => 1,
            PixelType::Gray16 => 2,
            PixelType::Rgb32 => 4,
        }
    }

    /// Components packed into each pixel.
    pub fn num_components(self) -> usize {
        match self {
            PixelType::Gray8 | PixelType::Gray16 => 1,
            PixelType::Rgb32 => 3,
        }
    }
}

/// A single image from a single camera.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pixels: PixelBuffer,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
    // Fixed by the buffer's element width at construction, like the pixel
    // data itself: one byte per component for 8-bit data, two for 16-bit.
    bytes_per_component: usize,
    num_components: usize,
    coords: Coords,
    metadata: Metadata,
}

impl Image {
    /// Create an image from a raw buffer and its geometry.
    ///
    /// Fails when the buffer is empty or when its byte size disagrees with
    /// `width * height * bytes_per_pixel`.
    pub fn new(
        pixels: impl Into<PixelBuffer>,
        width: u32,
        height: u32,
        bytes_per_pixel: usize,
        num_components: usize,
        coords: Coords,
        metadata: Metadata,
    ) -> AppResult<Self> {
        let pixels = pixels.into();
        if pixels.is_empty() {
            return Err(ScopeError::EmptyPixelBuffer);
        }
        let expected = width as usize * height as usize * bytes_per_pixel;
        let actual = pixels.len() * pixels.bytes_per_element();
        if expected != actual {
            return Err(ScopeError::BufferSizeMismatch { expected, actual });
        }
        let bytes_per_component = pixels.bytes_per_element();
        // Components must tile the pixel exactly; anything else has no
        // meaningful per-component layout.
        if bytes_per_pixel % bytes_per_component != 0 {
            return Err(ScopeError::UnsupportedPixelType(format!(
                "{bytes_per_pixel} bytes per pixel with {bytes_per_component}-byte components"
            )));
        }
        Ok(Self {
            pixels,
            width,
            height,
            bytes_per_pixel,
            bytes_per_component,
            num_components,
            coords,
            metadata,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes allocated to each pixel, all components included.
    ///
    /// Distinct from the metadata bit depth, which describes the camera's
    /// value range rather than the storage width.
    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }

    /// Bytes allocated to a single component's intensity.
    pub fn bytes_per_component(&self) -> usize {
        self.bytes_per_component
    }

    /// Components packed into each pixel (1 for grayscale, 3 for RGB).
    pub fn num_components(&self) -> usize {
        self.num_components
    }

    /// This image's position within the acquisition.
    pub fn coords(&self) -> &Coords {
        &self.coords
    }

    /// This image's acquisition metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Borrow the raw pixel buffer.
    pub fn raw_pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// Freshly allocated copy of the raw pixel buffer.
    pub fn raw_pixels_copy(&self) -> PixelBuffer {
        self.pixels.deep_copy()
    }

    /// New image at different coords, sharing this buffer.
    pub fn copy_at_coords(&self, coords: Coords) -> Image {
        Image {
            coords,
            ..self.clone()
        }
    }

    /// New image with different metadata, sharing this buffer.
    pub fn copy_with_metadata(&self, metadata: Metadata) -> Image {
        Image {
            metadata,
            ..self.clone()
        }
    }

    /// New image with different coords and metadata, sharing this buffer.
    pub fn copy_with(&self, coords: Coords, metadata: Metadata) -> Image {
        Image {
            coords,
            metadata,
            ..self.clone()
        }
    }

    /// Intensity of the first component at `(x, y)`.
    pub fn intensity_at(&self, x: u32, y: u32) -> AppResult<u64> {
        self.component_intensity_at(x, y, 0)
    }

    /// Intensity of one component at `(x, y)`.
    ///
    /// The value is an unsigned integer in
    /// `[0, 2^(8 * bytes_per_component) - 1]`. Queries outside the image
    /// bounds (or, defensively, outside the buffer) fail with
    /// [`ScopeError::PixelOutOfBounds`].
    pub fn component_intensity_at(&self, x: u32, y: u32, component: usize) -> AppResult<u64> {
        let elements_per_component = self.bytes_per_component / self.pixels.bytes_per_element();
        let index = (y as usize * self.width as usize + x as usize) * self.bytes_per_pixel
            / self.bytes_per_component
            + component;
        let out_of_bounds = ScopeError::PixelOutOfBounds {
            x,
            y,
            component,
            capacity: self.pixels.len(),
            index,
        };
        if x >= self.width || y >= self.height {
            return Err(out_of_bounds);
        }
        self.pixels
            .read_unsigned(index, elements_per_component)
            .ok_or(out_of_bounds)
    }

    /// Human-readable intensity at `(x, y)`: the bare value for
    /// single-component images, `[r/g/b]` for multi-component ones.
    pub fn intensity_string_at(&self, x: u32, y: u32) -> AppResult<String> {
        if self.num_components == 1 {
            return Ok(format!("{}", self.intensity_at(x, y)?));
        }
        let mut parts = Vec::with_capacity(self.num_components);
        for component in 0..self.num_components {
            parts.push(format!("{}", self.component_intensity_at(x, y, component)?));
        }
        Ok(format!("[{}]", parts.join("/")))
    }

    /// De-interleave one component's intensities into a fresh buffer.
    ///
    /// For single-component images this is simply a copy; for
    /// multi-component images the stride is the per-pixel element count.
    pub fn raw_pixels_for_component(&self, component: usize) -> PixelBuffer {
        let stride = if self.num_components == 1 {
            1
        } else {
            self.bytes_per_pixel / self.bytes_per_component
        };
        self.pixels.extract_stride(stride, component)
    }

    /// Split into one single-component image per component.
    ///
    /// A single-component image yields exactly itself. A multi-component
    /// image yields `num_components` new images, each owning a freshly
    /// extracted buffer, positioned at this image's coords with the channel
    /// index incremented by the component number (channel 0 when this image
    /// has no channel axis).
    pub fn split_multi_component(&self) -> AppResult<Vec<Image>> {
        if self.num_components == 1 {
            return Ok(vec![self.clone()]);
        }
        let base_channel = self.coords.channel_or(0);
        let mut result = Vec::with_capacity(self.num_components);
        for component in 0..self.num_components {
            let coords = self
                .coords
                .copy_builder()
                .channel(base_channel + component)
                .build();
            result.push(Image::new(
                self.raw_pixels_for_component(component),
                self.width,
                self.height,
                self.bytes_per_pixel / self.num_components,
                1,
                coords,
                self.metadata.clone(),
            )?);
        }
        Ok(result)
    }

    /// Split into single-component images and insert each into `store`.
    pub fn split_into_store(&self, store: &mut ImageStore) -> AppResult<Vec<Arc<Image>>> {
        let mut stored = Vec::new();
        for image in self.split_multi_component()? {
            stored.push(store.put_image(image)?);
        }
        Ok(stored)
    }

    /// Legacy pixel-type classification of this image's layout.
    pub fn pixel_type(&self) -> AppResult<PixelType> {
        match (self.bytes_per_pixel, self.num_components) {
            (1, 1) => Ok(PixelType::Gray8),
            (2, 1) => Ok(PixelType::Gray16),
            (4, 3) => Ok(PixelType::Rgb32),
            (bpp, components) => Err(ScopeError::UnsupportedPixelType(format!(
                "{bpp} bytes per pixel and {components} components"
            ))),
        }
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}x{}x{} image (byte depth {}) at {}>",
            self.width, self.height, self.num_components, self.bytes_per_pixel, self.coords
        )
    }
}

/// Shorthand for a single-component grayscale image without a channel axis,
/// used pervasively by tests.
#[cfg(test)]
pub(crate) fn gray8(width: u32, height: u32, data: Vec<u8>) -> Image {
    #[allow(clippy::unwrap_used)]
    Image::new(
        data,
        width,
        height,
        1,
        1,
        Coords::default(),
        Metadata::default(),
    )
    .unwrap()
}
