// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interfaces to the external detector and orientation classifier

use crate::error::{Error, Result};
use crate::types::{Detection, Orientation, SpatialItem};
use image::DynamicImage;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Finds floor plan elements in an image
pub trait Detector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>>;
}

/// Labels the facing axis of cropped element instances.
///
/// Returns one label per crop, in crop order. `None` means the classifier
/// could not decide.
pub trait OrientationClassifier {
    fn classify_orientation(
        &self,
        class_name: &str,
        crops: &[DynamicImage],
    ) -> Result<Vec<Option<Orientation>>>;
}

/// Bounding boxes of every detection of `name`, in detection order
pub fn boxes_of(detections: &[Detection], name: &str) -> Vec<[f64; 4]> {
    detections
        .iter()
        .filter(|d| d.class_name == name)
        .map(|d| d.bbox)
        .collect()
}

/// Pair each box of one class with its orientation label
pub fn align_items(
    name: &str,
    boxes: &[[f64; 4]],
    labels: &[Option<Orientation>],
) -> Result<Vec<SpatialItem>> {
    if boxes.len() != labels.len() {
        return Err(Error::LengthMismatch {
            name: name.to_string(),
            boxes: boxes.len(),
            labels: labels.len(),
        });
    }

    Ok(boxes
        .iter()
        .zip(labels)
        .map(|(bbox, label)| SpatialItem::from_bbox(*bbox, name, *label))
        .collect())
}

/// Crop a detection's box out of the image, clamped to its bounds
pub fn crop_detection(image: &DynamicImage, bbox: [f64; 4]) -> DynamicImage {
    let max_x = image.width().saturating_sub(1) as f64;
    let max_y = image.height().saturating_sub(1) as f64;
    let x1 = bbox[0].min(bbox[2]).clamp(0.0, max_x) as u32;
    let y1 = bbox[1].min(bbox[3]).clamp(0.0, max_y) as u32;
    let x2 = (bbox[0].max(bbox[2]).clamp(0.0, image.width() as f64)) as u32;
    let y2 = (bbox[1].max(bbox[3]).clamp(0.0, image.height() as f64)) as u32;
    image.crop_imm(x1, y1, x2.saturating_sub(x1).max(1), y2.saturating_sub(y1).max(1))
}

/// Classify the detections of one class from their crops
fn classify_class(
    classifier: &dyn OrientationClassifier,
    image: &DynamicImage,
    boxes: &[[f64; 4]],
    name: &str,
) -> Result<Vec<Option<Orientation>>> {
    let crops: Vec<DynamicImage> = boxes
        .iter()
        .map(|bbox| crop_detection(image, *bbox))
        .collect();
    classifier.classify_orientation(name, &crops)
}

/// Detector and classifier output for one image
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageDetections {
    pub detections: Vec<Detection>,
    /// Orientation labels per class, aligned with that class's detections
    #[serde(default)]
    pub orientations: FxHashMap<String, Vec<Option<Orientation>>>,
}

impl ImageDetections {
    /// Detect once, then classify every requested class that was found
    pub fn from_collaborators(
        detector: &dyn Detector,
        classifier: &dyn OrientationClassifier,
        image: &DynamicImage,
        names: &[&str],
    ) -> Result<Self> {
        let detections = detector.detect(image)?;
        let mut orientations = FxHashMap::default();

        for &name in names {
            if orientations.contains_key(name) {
                continue;
            }
            let boxes = boxes_of(&detections, name);
            if boxes.is_empty() {
                continue;
            }
            let labels = classify_class(classifier, image, &boxes, name)?;
            orientations.insert(name.to_string(), labels);
        }

        Ok(Self {
            detections,
            orientations,
        })
    }

    /// Items of class `name`.
    ///
    /// A class whose orientation is not checked may come without labels; its
    /// items are then left unset for the matcher to coerce.
    pub fn items(&self, name: &str, check_orientation: bool) -> Result<Vec<SpatialItem>> {
        let boxes = boxes_of(&self.detections, name);
        match self.orientations.get(name) {
            Some(labels) => align_items(name, &boxes, labels),
            None if !check_orientation || boxes.is_empty() => {
                align_items(name, &boxes, &vec![None; boxes.len()])
            }
            None => align_items(name, &boxes, &[]),
        }
    }
}
