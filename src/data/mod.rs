//! Image data model: pixel buffers, coordinates, metadata, and the store.
//!
//! Everything in this module is an immutable value type. Images are created
//! once from a hardware buffer (or from another image) and never mutated in
//! place; transformations produce new values that share the underlying pixel
//! allocation where possible.

pub mod coords;
pub mod image;
pub mod metadata;
pub mod pixels;
pub mod store;
pub mod tagged;

pub use coords::{Coords, CoordsBuilder};
pub use image::{Image, PixelType};
pub use metadata::{Metadata, MetadataBuilder};
pub use pixels::PixelBuffer;
pub use store::ImageStore;
pub use tagged::TaggedImage;
