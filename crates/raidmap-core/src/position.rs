//! Position values flowing through the pipeline, and the bounded trail.

use std::collections::VecDeque;

use chrono::NaiveDateTime;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// One raw world-space reading from a detected screenshot.
///
/// `y` is the vertical axis and only feeds floor detection; the planar
/// projection works on `(x, z)`. Screenshot names carry local time with
/// no zone, hence the naive timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Compass heading in degrees, `[0, 360)`, when the source carried one.
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub captured_at: Option<NaiveDateTime>,
}

impl WorldPosition {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            heading: None,
            captured_at: None,
        }
    }

    /// Ground-plane coordinates for the affine projection.
    pub fn planar(&self) -> Point2<f64> {
        Point2::new(self.x, self.z)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// A projected marker position on one map's canonical image.
///
/// Produced once per input and immutable; `world` keeps the originating
/// reading alongside the pixel result for trail and tooltip consumers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenPosition {
    pub map_key: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub heading: Option<f64>,
    /// Active floor layer id, `None` on single-level maps.
    #[serde(default)]
    pub floor: Option<String>,
    pub world: WorldPosition,
}

impl ScreenPosition {
    pub fn pixel(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }
}

/// Bounded FIFO of recent screen positions; oldest evicted first.
#[derive(Clone, Debug)]
pub struct Trail {
    positions: VecDeque<ScreenPosition>,
    capacity: usize,
}

impl Trail {
    /// A zero-capacity trail stays permanently empty.
    pub fn new(capacity: usize) -> Self {
        Self {
            positions: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, position: ScreenPosition) {
        if self.capacity == 0 {
            return;
        }
        if self.positions.len() == self.capacity {
            self.positions.pop_front();
        }
        self.positions.push_back(position);
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &ScreenPosition> {
        self.positions.iter()
    }

    pub fn latest(&self) -> Option<&ScreenPosition> {
        self.positions.back()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }
}
