//! Raw pixel buffer storage.
//!
//! Cameras deliver frames as flat arrays of 8-bit or 16-bit elements. The
//! element width doubles as the per-component byte count: an 8-bit camera
//! packs one byte per component, a 16-bit camera two. Rather than inspecting
//! a buffer's run-time type at every access, `PixelBuffer` is a tagged
//! variant and every accessor dispatches on it exactly once.
//!
//! Buffers are reference-counted slices. Cloning a `PixelBuffer` shares the
//! allocation, which is what makes the image copy-with-\* transformations
//! cheap; `deep_copy` exists for callers that need ownership.

use std::sync::Arc;

/// A flat, hardware-delivered pixel buffer.
///
/// The variant encodes the element width. All indices used by the accessors
/// are element indices, not byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PixelBuffer {
    /// One byte per element (8-bit cameras, packed RGB32 color data).
    U8(Arc<[u8]>),
    /// Two bytes per element (12/16-bit cameras).
    U16(Arc<[u16]>),
}

impl PixelBuffer {
    /// Bytes occupied by a single buffer element.
    pub fn bytes_per_element(&self) -> usize {
        match self {
            PixelBuffer::U8(_) => 1,
            PixelBuffer::U16(_) => 2,
        }
    }

    /// Number of elements in the buffer.
    pub fn len(&self) -> usize {
        match self {
            PixelBuffer::U8(data) => data.len(),
            PixelBuffer::U16(data) => data.len(),
        }
    }

    /// True when the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unsigned value of the element at `index`, or `None` out of range.
    pub fn element(&self, index: usize) -> Option<u64> {
        match self {
            PixelBuffer::U8(data) => data.get(index).map(|&v| u64::from(v)),
            PixelBuffer::U16(data) => data.get(index).map(|&v| u64::from(v)),
        }
    }

    /// Read a `count`-element unsigned scalar starting at `index`.
    ///
    /// Successive elements are accumulated big-endian-style: each prior
    /// partial result is shifted left by one element width before the next
    /// element is added. Returns `None` if any touched index is out of
    /// range or if the result would not fit in 64 bits.
    pub fn read_unsigned(&self, index: usize, count: usize) -> Option<u64> {
        let shift = 8 * self.bytes_per_element();
        if count == 0 || count * shift > u64::BITS as usize {
            return None;
        }
        let mut result: u64 = 0;
        for i in 0..count {
            result <<= shift;
            result += self.element(index + i)?;
        }
        Some(result)
    }

    /// De-interleave every `stride`-th element starting at `offset` into a
    /// freshly allocated buffer of the same element width.
    pub fn extract_stride(&self, stride: usize, offset: usize) -> PixelBuffer {
        match self {
            PixelBuffer::U8(data) => PixelBuffer::U8(
                data.iter().skip(offset).step_by(stride).copied().collect(),
            ),
            PixelBuffer::U16(data) => PixelBuffer::U16(
                data.iter().skip(offset).step_by(stride).copied().collect(),
            ),
        }
    }

    /// Freshly allocated buffer with the same contents.
    pub fn deep_copy(&self) -> PixelBuffer {
        match self {
            PixelBuffer::U8(data) => PixelBuffer::U8(Arc::from(&data[..])),
            PixelBuffer::U16(data) => PixelBuffer::U16(Arc::from(&data[..])),
        }
    }

    /// True when both values view the same allocation.
    pub fn shares_allocation(&self, other: &PixelBuffer) -> bool {
        match (self, other) {
            (PixelBuffer::U8(a), PixelBuffer::U8(b)) => Arc::ptr_eq(a, b),
            (PixelBuffer::U16(a), PixelBuffer::U16(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Vec<u8>> for PixelBuffer {
    fn from(data: Vec<u8>) -> Self {
        PixelBuffer::U8(data.into())
    }
}

impl From<Vec<u16>> for PixelBuffer {
    fn from(data: Vec<u16>) -> Self {
        PixelBuffer::U16(data.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_width_follows_variant() {
        assert_eq!(PixelBuffer::from(vec![1u8, 2]).bytes_per_element(), 1);
        assert_eq!(PixelBuffer::from(vec![1u16, 2]).bytes_per_element(), 2);
    }

    #[test]
    fn element_reads_are_unsigned() {
        let bytes = PixelBuffer::from(vec![0xFFu8]);
        assert_eq!(bytes.element(0), Some(255));
        let shorts = PixelBuffer::from(vec![0xFFFFu16]);
        assert_eq!(shorts.element(0), Some(65535));
    }

    #[test]
    fn read_unsigned_accumulates_big_endian() {
        let buf = PixelBuffer::from(vec![0x12u8, 0x34, 0x56]);
        assert_eq!(buf.read_unsigned(0, 1), Some(0x12));
        assert_eq!(buf.read_unsigned(0, 2), Some(0x1234));
        assert_eq!(buf.read_unsigned(1, 2), Some(0x3456));
    }

    #[test]
    fn read_unsigned_rejects_out_of_range() {
        let buf = PixelBuffer::from(vec![1u8, 2, 3]);
        assert_eq!(buf.read_unsigned(2, 2), None);
        assert_eq!(buf.read_unsigned(3, 1), None);
        assert_eq!(buf.read_unsigned(0, 0), None);
    }

    #[test]
    fn extract_stride_deinterleaves() {
        // RGB-style interleaving with stride 3.
        let buf = PixelBuffer::from(vec![1u8, 2, 3, 4, 5, 6]);
        assert_eq!(buf.extract_stride(3, 0), PixelBuffer::from(vec![1u8, 4]));
        assert_eq!(buf.extract_stride(3, 1), PixelBuffer::from(vec![2u8, 5]));
        assert_eq!(buf.extract_stride(3, 2), PixelBuffer::from(vec![3u8, 6]));
    }

    #[test]
    fn clones_share_deep_copies_do_not() {
        let buf = PixelBuffer::from(vec![1u16, 2, 3]);
        let shared = buf.clone();
        assert!(buf.shares_allocation(&shared));
        let owned = buf.deep_copy();
        assert!(!buf.shares_allocation(&owned));
        assert_eq!(buf, owned);
    }
}
