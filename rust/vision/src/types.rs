// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for floor plan conflict analysis

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Axis along which an element's facing is measured
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Vertical,
    Horizontal,
}

impl Orientation {
    /// Both axes, in the order coerced comparisons run them.
    pub const AXES: [Orientation; 2] = [Orientation::Horizontal, Orientation::Vertical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Vertical => "vertical",
            Orientation::Horizontal => "horizontal",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vertical" => Ok(Orientation::Vertical),
            "horizontal" => Ok(Orientation::Horizontal),
            other => Err(Error::InvalidOrientation(format!(
                "unknown orientation label '{}'",
                other
            ))),
        }
    }
}

/// A 1-D closed interval `[min, max]`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn length(&self) -> f64 {
        self.max - self.min
    }

    pub fn center(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn contains(&self, other: &Interval) -> bool {
        self.min <= other.min && other.max <= self.max
    }
}

/// One detected floor plan element: bounding box, label and orientation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpatialItem {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub name: String,
    /// `None` until the classifier (or a coercion) assigns an axis
    pub orientation: Option<Orientation>,
}

impl SpatialItem {
    /// Create an item, normalizing swapped corners so `x1 <= x2` and `y1 <= y2`.
    pub fn new(
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        name: impl Into<String>,
        orientation: Option<Orientation>,
    ) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
            name: name.into(),
            orientation,
        }
    }

    pub fn from_bbox(bbox: [f64; 4], name: impl Into<String>, orientation: Option<Orientation>) -> Self {
        Self::new(bbox[0], bbox[1], bbox[2], bbox[3], name, orientation)
    }

    /// Copy of this item with a different orientation; `self` is left untouched.
    pub fn with_orientation(&self, orientation: Orientation) -> Self {
        Self {
            orientation: Some(orientation),
            ..self.clone()
        }
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Center truncated to whole pixels
    pub fn pixel_center(&self) -> (i64, i64) {
        let (cx, cy) = self.center();
        (cx as i64, cy as i64)
    }

    pub fn require_orientation(&self) -> Result<Orientation> {
        self.orientation.ok_or_else(|| {
            Error::InvalidOrientation(format!(
                "item '{}' at ({}, {}, {}, {}) has no orientation",
                self.name, self.x1, self.y1, self.x2, self.y2
            ))
        })
    }

    /// Span along the orientation axis: `[x1, x2]` for vertical, `[y1, y2]` for horizontal
    pub fn projection(&self) -> Result<Interval> {
        Ok(match self.require_orientation()? {
            Orientation::Vertical => Interval::new(self.x1, self.x2),
            Orientation::Horizontal => Interval::new(self.y1, self.y2),
        })
    }

    pub fn projection_center(&self) -> Result<f64> {
        Ok(self.projection()?.center())
    }

    pub fn length(&self) -> Result<f64> {
        Ok(self.projection()?.length())
    }
}

/// Raw detector output for one instance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Detection {
    /// `[x1, y1, x2, y2]` in pixels
    pub bbox: [f64; 4],
    pub class_name: String,
}

impl Detection {
    pub fn new(bbox: [f64; 4], class_name: impl Into<String>) -> Self {
        Self {
            bbox,
            class_name: class_name.into(),
        }
    }
}

/// Ordered pair of items plus the axis they are compared on
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConflictCandidate {
    pub first: SpatialItem,
    pub second: SpatialItem,
    pub orientation: Orientation,
}

impl ConflictCandidate {
    pub fn new(first: SpatialItem, second: SpatialItem, orientation: Orientation) -> Self {
        Self {
            first,
            second,
            orientation,
        }
    }
}

/// Projection overlap between the two items of a candidate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverlapResult {
    pub candidate: ConflictCandidate,
    /// Intersection over union of the projection intervals (0.0 - 1.0)
    pub rate: f64,
    /// One interval fully contains the other
    pub full_coverage: bool,
}

/// Line-of-sight obstruction between two item centers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObstructionResult {
    pub first: SpatialItem,
    pub second: SpatialItem,
    /// Rasterized path between the two centers
    pub scan_points: Vec<(i64, i64)>,
    /// Worst cross-section wall fraction (0.0 - 1.0)
    pub rate: f64,
}

/// A pair that faces its partner with a clear line of sight
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConflictReport {
    pub overlap: OverlapResult,
    pub obstruction: ObstructionResult,
}

impl ConflictReport {
    pub fn first(&self) -> &SpatialItem {
        &self.overlap.candidate.first
    }

    pub fn second(&self) -> &SpatialItem {
        &self.overlap.candidate.second
    }

    pub fn overlap_rate(&self) -> f64 {
        self.overlap.rate
    }

    pub fn full_coverage(&self) -> bool {
        self.overlap.full_coverage
    }

    pub fn obstruction_rate(&self) -> f64 {
        self.obstruction.rate
    }

    pub fn scan_points(&self) -> &[(i64, i64)] {
        &self.obstruction.scan_points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_follows_orientation() {
        let item = SpatialItem::new(10.0, 20.0, 30.0, 60.0, "door", Some(Orientation::Vertical));
        assert_eq!(item.projection().unwrap(), Interval::new(10.0, 30.0));
        assert_eq!(item.length().unwrap(), 20.0);

        let item = item.with_orientation(Orientation::Horizontal);
        assert_eq!(item.projection().unwrap(), Interval::new(20.0, 60.0));
        assert_eq!(item.length().unwrap(), 40.0);
        assert_eq!(item.projection_center().unwrap(), 40.0);
    }

    #[test]
    fn test_unset_orientation_fails() {
        let item = SpatialItem::new(0.0, 0.0, 5.0, 5.0, "kitchen", None);
        assert!(matches!(item.projection(), Err(Error::InvalidOrientation(_))));
        assert!(matches!(item.length(), Err(Error::InvalidOrientation(_))));
    }

    #[test]
    fn test_with_orientation_copies() {
        let original = SpatialItem::new(0.0, 0.0, 5.0, 5.0, "door", Some(Orientation::Vertical));
        let coerced = original.with_orientation(Orientation::Horizontal);
        assert_eq!(original.orientation, Some(Orientation::Vertical));
        assert_eq!(coerced.orientation, Some(Orientation::Horizontal));
    }

    #[test]
    fn test_swapped_corners_normalized() {
        let item = SpatialItem::new(50.0, 80.0, 10.0, 20.0, "window", None);
        assert_eq!((item.x1, item.y1, item.x2, item.y2), (10.0, 20.0, 50.0, 80.0));
        assert_eq!(item.pixel_center(), (30, 50));
    }

    #[test]
    fn test_orientation_labels() {
        assert_eq!("Vertical".parse::<Orientation>().unwrap(), Orientation::Vertical);
        assert_eq!(" horizontal ".parse::<Orientation>().unwrap(), Orientation::Horizontal);
        assert!("diagonal".parse::<Orientation>().is_err());
    }
}
