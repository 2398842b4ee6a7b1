// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Facing and line-of-sight conflicts between floor plan elements
//!
//! Given detected elements (doors, windows, entrances, kitchens, ...) with
//! their facing orientation, this crate finds pairs that:
//! 1. Face each other (projection overlap along their orientation axis)
//! 2. Can see each other (no wall cutting the path between their centers)
//!
//! Walls come from a binarized copy of the plan image. Detection and
//! orientation classification are external; see [`detection`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use planlint_vision::{AnalysisConfig, ConflictPipeline, FloorPlanRaster, ImageDetections};
//!
//! let config = AnalysisConfig::default();
//! let raster = FloorPlanRaster::open("plan.png", &config.binarize)?;
//! let detections: ImageDetections = serde_json::from_str(&detections_json)?;
//!
//! let analysis = ConflictPipeline::new(config).analyze_raster("plan.png", &raster, &detections)?;
//! for selection in &analysis.selections {
//!     for conflict in &selection.conflicts {
//!         println!("{} <-> {}", conflict.first().name, conflict.second().name);
//!     }
//! }
//! ```

pub mod config;
pub mod detection;
pub mod error;
pub mod image_ops;
pub mod line_ops;
pub mod matcher;
pub mod obstruction;
pub mod overlap;
pub mod pipeline;
pub mod raster;
pub mod types;

// Re-export commonly used types and functions
pub use config::{AnalysisConfig, BinarizeConfig, Selection};
pub use detection::{align_items, Detector, ImageDetections, OrientationClassifier};
pub use error::{Error, Result};
pub use line_ops::bresenham_line;
pub use matcher::{single_type_pairs, two_type_pairs};
pub use obstruction::{masked_obstruction, scan_obstruction};
pub use overlap::{overlap_candidate, projection_overlap};
pub use pipeline::{
    BatchSummary, ConflictPipeline, ImageAnalysis, ImageInput, ImageOutcome, Manifest,
    SelectionReport,
};
pub use raster::FloorPlanRaster;
pub use types::{
    ConflictCandidate, ConflictReport, Detection, Interval, ObstructionResult, Orientation,
    OverlapResult, SpatialItem,
};

use image::DynamicImage;

/// Detect, classify and analyze one in-memory floor plan image
///
/// This runs the full pipeline:
/// 1. Detection and orientation classification of every selected class
/// 2. Binarization of the plan
/// 3. Conflict analysis of every configured selection
pub fn analyze_floor_plan(
    image: &DynamicImage,
    detector: &dyn Detector,
    classifier: &dyn OrientationClassifier,
    config: &AnalysisConfig,
) -> Result<ImageAnalysis> {
    let mut names: Vec<&str> = config
        .selections
        .iter()
        .flat_map(|selection| selection.names())
        .collect();
    names.sort_unstable();
    names.dedup();

    let detections = ImageDetections::from_collaborators(detector, classifier, image, &names)?;
    let raster = FloorPlanRaster::from_image(image, &config.binarize);

    ConflictPipeline::new(config.clone()).analyze_raster("memory", &raster, &detections)
}
