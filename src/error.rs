//! Custom error types for the application.
//!
//! This module defines the primary error type, `ScopeError`, for the entire
//! application. Using the `thiserror` crate, it provides a centralized and
//! consistent way to handle different kinds of errors, from configuration and
//! I/O issues to pixel-buffer and image-store problems.
//!
//! Errors fall into three groups:
//!
//! - **Ambient**: `Config`, `Configuration`, and `Io` wrap the usual
//!   application plumbing (file parsing, semantic validation, I/O).
//! - **Image data**: `EmptyPixelBuffer`, `BufferSizeMismatch`,
//!   `PixelOutOfBounds`, and `UnsupportedPixelType` are raised by `Image`
//!   construction and pixel queries. These indicate caller bugs and carry
//!   enough context to locate the offending query.
//! - **Tagged images and stores**: `MissingTag`/`InvalidTag` cover the legacy
//!   tag-map decoding, while `StoreFrozen`/`DuplicateCoords` enforce the
//!   write-once image-store contract.
//!
//! By using `#[from]`, `ScopeError` can be seamlessly created from underlying
//! error types, simplifying error handling throughout the application with
//! the `?` operator.

use crate::data::Coords;
use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, ScopeError>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum ScopeError {
    /// Configuration file could not be loaded or parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Configuration parsed but failed semantic validation.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An image was constructed from a zero-length pixel buffer.
    #[error("Pixel data has length 0")]
    EmptyPixelBuffer,

    /// Buffer size disagrees with width x height x bytes-per-pixel.
    #[error("Pixel buffer holds {actual} bytes but image geometry requires {expected}")]
    BufferSizeMismatch {
        /// Bytes implied by the image geometry.
        expected: usize,
        /// Bytes actually present in the buffer.
        actual: usize,
    },

    /// A pixel intensity query fell outside the image.
    #[error(
        "Asked for pixel at ({x}, {y}) component {component} outside of pixel \
         array size of {capacity} (calculated index {index})"
    )]
    PixelOutOfBounds {
        /// Queried column.
        x: u32,
        /// Queried row.
        y: u32,
        /// Queried component.
        component: usize,
        /// Buffer capacity in elements.
        capacity: usize,
        /// The computed element index.
        index: usize,
    },

    /// Pixel geometry does not correspond to any known pixel type.
    #[error("Unrecognized pixel type: {0}")]
    UnsupportedPixelType(String),

    /// A mandatory tag was absent from a tagged image.
    #[error("Tagged image is missing required tag '{0}'")]
    MissingTag(String),

    /// A tag was present but held a value of the wrong shape.
    #[error("Tag '{key}' is not a valid {expected}")]
    InvalidTag {
        /// The offending tag key.
        key: String,
        /// Human-readable description of the expected shape.
        expected: &'static str,
    },

    /// The image store has been frozen and no longer accepts images.
    #[error("Image store is frozen")]
    StoreFrozen,

    /// An image already exists at the target coordinates.
    #[error("An image already exists at {0}")]
    DuplicateCoords(Coords),
}
