// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for conflict analysis.

use thiserror::Error;

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during conflict analysis
#[derive(Error, Debug)]
pub enum Error {
    /// An orientation-dependent query ran on an item without an orientation,
    /// or a scan ran on two items whose orientations differ.
    #[error("Invalid orientation: {0}")]
    InvalidOrientation(String),

    /// Detector and classifier disagree on how many instances of a class exist.
    #[error("Detections and orientation labels differ in length for '{name}': {boxes} boxes, {labels} labels")]
    LengthMismatch {
        name: String,
        boxes: usize,
        labels: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Failure reported by an external detector or classifier.
    #[error("Collaborator error: {0}")]
    Collaborator(String),
}
