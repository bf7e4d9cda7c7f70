//! Coordinate-keyed image store.
//!
//! The store is the hand-off point between the acquisition side and the
//! display side: the acquisition inserts each arriving image under its
//! [`Coords`], and display components look images up synchronously while
//! handling events. Images are write-once (an acquisition never legally
//! produces two images at the same position) and a store can be frozen to
//! reject all further writes once an acquisition completes.

use crate::data::coords::Coords;
use crate::data::image::Image;
use crate::error::{AppResult, ScopeError};
use std::collections::HashMap;
use std::sync::Arc;

/// An in-memory collection of images keyed by their coords.
#[derive(Debug, Default)]
pub struct ImageStore {
    images: HashMap<Coords, Arc<Image>>,
    frozen: bool,
}

impl ImageStore {
    /// Create an empty, unfrozen store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an image under its coords, returning the stored handle.
    ///
    /// Fails with [`ScopeError::StoreFrozen`] once [`freeze`](Self::freeze)
    /// has been called, and with [`ScopeError::DuplicateCoords`] when an
    /// image already exists at the same position.
    pub fn put_image(&mut self, image: Image) -> AppResult<Arc<Image>> {
        if self.frozen {
            return Err(ScopeError::StoreFrozen);
        }
        let coords = image.coords().clone();
        if self.images.contains_key(&coords) {
            return Err(ScopeError::DuplicateCoords(coords));
        }
        let image = Arc::new(image);
        self.images.insert(coords, Arc::clone(&image));
        Ok(image)
    }

    /// Look up the image at `coords`, if one has arrived.
    pub fn get_image(&self, coords: &Coords) -> Option<Arc<Image>> {
        self.images.get(coords).cloned()
    }

    /// Length of `axis`: the maximum index stored along it plus one, or 0
    /// when no stored image uses the axis.
    pub fn axis_length(&self, axis: &str) -> usize {
        self.images
            .keys()
            .filter_map(|coords| coords.index(axis))
            .max()
            .map_or(0, |max| max + 1)
    }

    /// Reject all further writes.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// True once [`freeze`](Self::freeze) has been called.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Number of stored images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// True when no images have been stored.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Iterate over the coords of every stored image, in no defined order.
    pub fn coords_iter(&self) -> impl Iterator<Item = &Coords> {
        self.images.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::coords;
    use crate::data::image::gray8;

    fn image_at(coords: Coords) -> Image {
        gray8(2, 2, vec![1, 2, 3, 4]).copy_at_coords(coords)
    }

    #[test]
    fn put_then_get_round_trips() {
        let mut store = ImageStore::new();
        let at = Coords::builder().time(0).channel(0).build();
        store.put_image(image_at(at.clone())).unwrap();
        assert!(store.get_image(&at).is_some());
        assert!(store
            .get_image(&Coords::builder().time(1).build())
            .is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn rewriting_coords_is_rejected() {
        let mut store = ImageStore::new();
        let at = Coords::builder().time(0).build();
        store.put_image(image_at(at.clone())).unwrap();
        let err = store.put_image(image_at(at)).unwrap_err();
        assert!(matches!(err, ScopeError::DuplicateCoords(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn frozen_store_rejects_writes() {
        let mut store = ImageStore::new();
        store.freeze();
        assert!(store.is_frozen());
        let err = store
            .put_image(image_at(Coords::default()))
            .unwrap_err();
        assert!(matches!(err, ScopeError::StoreFrozen));
        assert!(store.is_empty());
    }

    #[test]
    fn axis_length_is_max_index_plus_one() {
        let mut store = ImageStore::new();
        for channel in [0usize, 2] {
            let at = Coords::builder().time(0).channel(channel).build();
            store.put_image(image_at(at)).unwrap();
        }
        assert_eq!(store.axis_length(coords::CHANNEL), 3);
        assert_eq!(store.axis_length(coords::TIME), 1);
        assert_eq!(store.axis_length(coords::Z), 0);
    }
}
