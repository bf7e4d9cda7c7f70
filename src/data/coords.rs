//! Image coordinates within a multi-dimensional acquisition.
//!
//! A `Coords` names the position of one image along each axis of an
//! acquisition: time point, z slice, channel, stage position, and any
//! additional axes a device or script cares to define. Axis names are free
//! strings; the four conventional ones have constants below.
//!
//! `Coords` is immutable once built and usable as a map key, which is how
//! the [`ImageStore`](crate::data::store::ImageStore) indexes images.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The time-point (frame) axis.
pub const TIME: &str = "time";
/// The focal (z-slice) axis.
pub const Z: &str = "z";
/// The channel axis.
pub const CHANNEL: &str = "channel";
/// The XY stage-position axis.
pub const STAGE_POSITION: &str = "stagePosition";

/// An axis-name-to-index mapping identifying one image in an acquisition.
///
/// Ordered storage keeps `Display` output and serialized forms deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coords {
    axes: BTreeMap<String, usize>,
}

impl Coords {
    /// Start building a new `Coords` from scratch.
    pub fn builder() -> CoordsBuilder {
        CoordsBuilder::default()
    }

    /// Start a builder seeded with this value's axes.
    pub fn copy_builder(&self) -> CoordsBuilder {
        CoordsBuilder {
            axes: self.axes.clone(),
        }
    }

    /// Index along `axis`, or `None` if this position does not use the axis.
    pub fn index(&self, axis: &str) -> Option<usize> {
        self.axes.get(axis).copied()
    }

    /// Channel index, with `default` when the channel axis is absent.
    pub fn channel_or(&self, default: usize) -> usize {
        self.index(CHANNEL).unwrap_or(default)
    }

    /// True when no axes are defined.
    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// Number of axes defined.
    pub fn num_axes(&self) -> usize {
        self.axes.len()
    }

    /// Iterate over `(axis, index)` pairs in axis-name order.
    pub fn axes(&self) -> impl Iterator<Item = (&str, usize)> {
        self.axes.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<")?;
        for (i, (axis, index)) in self.axes().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{axis}={index}")?;
        }
        write!(f, ">")
    }
}

/// Fluent builder for [`Coords`].
#[derive(Debug, Clone, Default)]
pub struct CoordsBuilder {
    axes: BTreeMap<String, usize>,
}

impl CoordsBuilder {
    /// Set the index along an arbitrary axis.
    pub fn index(mut self, axis: &str, value: usize) -> Self {
        self.axes.insert(axis.to_string(), value);
        self
    }

    /// Shift the index along `axis` by `delta`, treating an absent axis as 0.
    /// Underflow clamps to 0.
    pub fn offset(mut self, axis: &str, delta: isize) -> Self {
        let current = self.axes.get(axis).copied().unwrap_or(0) as isize;
        self.axes
            .insert(axis.to_string(), current.saturating_add(delta).max(0) as usize);
        self
    }

    /// Remove an axis entirely.
    pub fn remove(mut self, axis: &str) -> Self {
        self.axes.remove(axis);
        self
    }

    /// Set the time-point index.
    pub fn time(self, value: usize) -> Self {
        self.index(TIME, value)
    }

    /// Set the z-slice index.
    pub fn z(self, value: usize) -> Self {
        self.index(Z, value)
    }

    /// Set the channel index.
    pub fn channel(self, value: usize) -> Self {
        self.index(CHANNEL, value)
    }

    /// Set the stage-position index.
    pub fn stage_position(self, value: usize) -> Self {
        self.index(STAGE_POSITION, value)
    }

    /// Finish building.
    pub fn build(self) -> Coords {
        Coords { axes: self.axes }
    }
}
