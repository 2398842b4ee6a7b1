// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conflict pipeline
//!
//! For every element selection of an image:
//! 1. Candidate pairs (matcher)
//! 2. Projection overlap of every pair
//! 3. Keep pairs with `rate >= overlap_threshold` or full coverage
//! 4. Mask both footprints on a private copy of the raster and scan the path
//! 5. Keep pairs with `rate <= obstruction_threshold`
//!
//! Pairs rejected at step 3 are never scanned.

use crate::config::{AnalysisConfig, Selection};
use crate::detection::ImageDetections;
use crate::error::{Error, Result};
use crate::matcher::{single_type_pairs, two_type_pairs};
use crate::obstruction::masked_obstruction;
use crate::overlap::overlap_candidate;
use crate::raster::FloorPlanRaster;
use crate::types::{ConflictCandidate, ConflictReport, OverlapResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Outcome of one selection on one image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionReport {
    pub selection: Selection,
    /// Number of candidate pairs generated
    pub candidates: usize,
    /// Number of pairs that passed the overlap filter and were scanned
    pub facing: usize,
    pub conflicts: Vec<ConflictReport>,
    /// Why the selection produced no result, when its input was unusable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

impl SelectionReport {
    fn skipped(selection: &Selection, reason: String) -> Self {
        Self {
            selection: selection.clone(),
            candidates: 0,
            facing: 0,
            conflicts: Vec::new(),
            skipped: Some(reason),
        }
    }
}

/// All selections evaluated on one image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAnalysis {
    pub image: String,
    pub width: u32,
    pub height: u32,
    pub selections: Vec<SelectionReport>,
}

impl ImageAnalysis {
    pub fn conflict_count(&self) -> usize {
        self.selections.iter().map(|s| s.conflicts.len()).sum()
    }
}

/// One image of a batch: where to load it and what was detected on it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageInput {
    pub path: PathBuf,
    #[serde(flatten)]
    pub detections: ImageDetections,
}

/// Batch input: every image to analyze with its detections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub images: Vec<ImageInput>,
}

impl Manifest {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a manifest; relative image paths resolve against its directory
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut manifest = Self::from_json_str(&std::fs::read_to_string(path)?)?;
        if let Some(dir) = path.parent() {
            for input in &mut manifest.images {
                if input.path.is_relative() {
                    input.path = dir.join(&input.path);
                }
            }
        }
        Ok(manifest)
    }
}

/// Per-image outcome of a batch; one failing image does not stop the rest
#[derive(Debug)]
pub struct ImageOutcome {
    pub image: String,
    pub result: Result<ImageAnalysis>,
}

/// Conflict totals over a batch
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BatchSummary {
    pub images: usize,
    pub failed: usize,
    /// Conflict count per selection label
    pub conflicts: BTreeMap<String, usize>,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[ImageOutcome]) -> Self {
        let mut summary = BatchSummary {
            images: outcomes.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            match &outcome.result {
                Ok(analysis) => {
                    for report in &analysis.selections {
                        *summary
                            .conflicts
                            .entry(report.selection.label())
                            .or_default() += report.conflicts.len();
                    }
                }
                Err(_) => summary.failed += 1,
            }
        }
        summary
    }
}

/// Runs conflict analysis with one fixed configuration
#[derive(Debug, Clone, Default)]
pub struct ConflictPipeline {
    config: AnalysisConfig,
}

impl ConflictPipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Candidate pairs for one selection.
    ///
    /// A pair naming the same class twice is matched like a single class, so
    /// no item is ever paired with itself.
    pub fn candidates(
        &self,
        selection: &Selection,
        detections: &ImageDetections,
    ) -> Result<Vec<ConflictCandidate>> {
        match selection {
            Selection::Single(name) => self.single_candidates(name, detections),
            Selection::Pair(first, second) if first == second => {
                self.single_candidates(first, detections)
            }
            Selection::Pair(first, second) => {
                let first_checks = self.config.checks_orientation(first);
                let second_checks = self.config.checks_orientation(second);
                two_type_pairs(
                    &detections.items(first, first_checks)?,
                    first_checks,
                    &detections.items(second, second_checks)?,
                    second_checks,
                )
            }
        }
    }

    fn single_candidates(
        &self,
        name: &str,
        detections: &ImageDetections,
    ) -> Result<Vec<ConflictCandidate>> {
        let checks = self.config.checks_orientation(name);
        single_type_pairs(&detections.items(name, checks)?, checks)
    }

    /// Whether a pair faces its partner closely enough to be scanned.
    ///
    /// Pairs on different axes never pass, whatever the threshold.
    pub fn passes_overlap(&self, overlap: &OverlapResult) -> bool {
        let candidate = &overlap.candidate;
        candidate.first.orientation == candidate.second.orientation
            && (overlap.full_coverage || overlap.rate >= self.config.overlap_threshold)
    }

    /// Overlap, filter, scan and filter a set of candidates against one raster
    pub fn evaluate(
        &self,
        raster: &FloorPlanRaster,
        candidates: Vec<ConflictCandidate>,
    ) -> Result<(usize, Vec<ConflictReport>)> {
        let mut facing = Vec::new();
        for candidate in candidates {
            let overlap = overlap_candidate(candidate)?;
            if self.passes_overlap(&overlap) {
                facing.push(overlap);
            }
        }
        let facing_count = facing.len();

        let margin = self.config.mask_margin;
        let scanned: Vec<ConflictReport> = facing
            .into_par_iter()
            .map(|overlap| {
                let obstruction = masked_obstruction(
                    raster,
                    &overlap.candidate.first,
                    &overlap.candidate.second,
                    margin,
                )?;
                Ok(ConflictReport {
                    overlap,
                    obstruction,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let conflicts = scanned
            .into_iter()
            .filter(|report| report.obstruction.rate <= self.config.obstruction_threshold)
            .collect();

        Ok((facing_count, conflicts))
    }

    /// Run one selection. Misaligned detector/classifier output for a class
    /// yields an empty, skipped report instead of an error.
    pub fn analyze_selection(
        &self,
        raster: &FloorPlanRaster,
        selection: &Selection,
        detections: &ImageDetections,
    ) -> Result<SelectionReport> {
        let candidates = match self.candidates(selection, detections) {
            Ok(candidates) => candidates,
            Err(err @ Error::LengthMismatch { .. }) => {
                tracing::warn!(selection = %selection.label(), error = %err, "Skipping selection");
                return Ok(SelectionReport::skipped(selection, err.to_string()));
            }
            Err(err) => return Err(err),
        };

        let candidate_count = candidates.len();
        let (facing, conflicts) = self.evaluate(raster, candidates)?;

        tracing::debug!(
            selection = %selection.label(),
            candidates = candidate_count,
            facing,
            conflicts = conflicts.len(),
            "Selection analyzed"
        );

        Ok(SelectionReport {
            selection: selection.clone(),
            candidates: candidate_count,
            facing,
            conflicts,
            skipped: None,
        })
    }

    /// Run every configured selection against an already binarized image
    pub fn analyze_raster(
        &self,
        image: impl Into<String>,
        raster: &FloorPlanRaster,
        detections: &ImageDetections,
    ) -> Result<ImageAnalysis> {
        let selections = self
            .config
            .selections
            .iter()
            .map(|selection| self.analyze_selection(raster, selection, detections))
            .collect::<Result<Vec<_>>>()?;

        Ok(ImageAnalysis {
            image: image.into(),
            width: raster.width(),
            height: raster.height(),
            selections,
        })
    }

    /// Load, binarize once and analyze one image
    pub fn analyze_image(&self, input: &ImageInput) -> Result<ImageAnalysis> {
        let start = Instant::now();
        let raster = FloorPlanRaster::open(&input.path, &self.config.binarize)?;
        let analysis = self.analyze_raster(input.path.display().to_string(), &raster, &input.detections)?;

        tracing::debug!(
            image = %analysis.image,
            conflicts = analysis.conflict_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Image analyzed"
        );
        Ok(analysis)
    }

    /// Analyze many images in parallel, in input order
    pub fn analyze_batch(&self, inputs: &[ImageInput]) -> Vec<ImageOutcome> {
        let outcomes: Vec<ImageOutcome> = inputs
            .par_iter()
            .map(|input| {
                let result = self.analyze_image(input);
                if let Err(err) = &result {
                    tracing::warn!(image = %input.path.display(), error = %err, "Image failed");
                }
                ImageOutcome {
                    image: input.path.display().to_string(),
                    result,
                }
            })
            .collect();

        let summary = BatchSummary::from_outcomes(&outcomes);
        tracing::info!(
            images = summary.images,
            failed = summary.failed,
            conflicts = ?summary.conflicts,
            "Batch complete"
        );
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{FREE, WALL};
    use crate::types::{Detection, Orientation};
    use image::{GrayImage, Luma};
    use rustc_hash::FxHashMap;

    fn open_raster() -> FloorPlanRaster {
        FloorPlanRaster::from_binary(GrayImage::from_pixel(300, 300, Luma([FREE])))
    }

    fn doors(boxes: &[[f64; 4]], labels: &[Orientation]) -> ImageDetections {
        let mut orientations = FxHashMap::default();
        orientations.insert(
            "door".to_string(),
            labels.iter().map(|o| Some(*o)).collect(),
        );
        ImageDetections {
            detections: boxes.iter().map(|b| Detection::new(*b, "door")).collect(),
            orientations,
        }
    }

    fn door_pipeline() -> ConflictPipeline {
        ConflictPipeline::new(AnalysisConfig {
            selections: vec![Selection::single("door")],
            ..Default::default()
        })
    }

    #[test]
    fn test_facing_doors_conflict() {
        let detections = doors(
            &[[100.0, 10.0, 140.0, 30.0], [105.0, 250.0, 145.0, 270.0]],
            &[Orientation::Vertical, Orientation::Vertical],
        );

        let analysis = door_pipeline()
            .analyze_raster("plan", &open_raster(), &detections)
            .unwrap();

        assert_eq!(analysis.selections.len(), 1);
        let report = &analysis.selections[0];
        assert_eq!(report.candidates, 1);
        assert_eq!(report.facing, 1);
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].obstruction_rate(), 0.0);
    }

    #[test]
    fn test_wall_between_doors_clears_conflict() {
        let mut img = GrayImage::from_pixel(300, 300, Luma([FREE]));
        for y in 140..150 {
            for x in 0..300 {
                img.put_pixel(x, y, Luma([WALL]));
            }
        }
        let raster = FloorPlanRaster::from_binary(img);
        let detections = doors(
            &[[100.0, 10.0, 140.0, 30.0], [105.0, 250.0, 145.0, 270.0]],
            &[Orientation::Vertical, Orientation::Vertical],
        );

        let analysis = door_pipeline().analyze_raster("plan", &raster, &detections).unwrap();
        let report = &analysis.selections[0];
        assert_eq!(report.facing, 1);
        assert!(report.conflicts.is_empty());
    }

    #[test]
    fn test_low_overlap_is_not_scanned() {
        let detections = doors(
            &[[0.0, 10.0, 40.0, 30.0], [30.0, 250.0, 70.0, 270.0]],
            &[Orientation::Vertical, Orientation::Vertical],
        );

        let analysis = door_pipeline()
            .analyze_raster("plan", &open_raster(), &detections)
            .unwrap();
        let report = &analysis.selections[0];
        assert_eq!(report.candidates, 1);
        assert_eq!(report.facing, 0);
        assert!(report.conflicts.is_empty());
    }

    #[test]
    fn test_mismatched_native_orientation_never_scanned() {
        let pipeline = ConflictPipeline::new(AnalysisConfig {
            overlap_threshold: 0.0,
            selections: vec![Selection::pair("door", "window")],
            ..Default::default()
        });
        let mut detections = doors(&[[0.0, 0.0, 40.0, 20.0]], &[Orientation::Vertical]);
        detections
            .detections
            .push(Detection::new([0.0, 100.0, 40.0, 120.0], "window"));
        detections
            .orientations
            .insert("window".into(), vec![Some(Orientation::Horizontal)]);

        let analysis = pipeline.analyze_raster("plan", &open_raster(), &detections).unwrap();
        let report = &analysis.selections[0];
        assert_eq!(report.candidates, 1);
        assert_eq!(report.facing, 0);
    }

    #[test]
    fn test_zero_width_doors_do_not_conflict() {
        let detections = doors(
            &[[50.0, 10.0, 50.0, 30.0], [50.0, 200.0, 50.0, 220.0]],
            &[Orientation::Vertical, Orientation::Vertical],
        );

        let analysis = door_pipeline()
            .analyze_raster("plan", &open_raster(), &detections)
            .unwrap();
        let report = &analysis.selections[0];
        assert_eq!(report.candidates, 1);
        assert_eq!(report.facing, 0);
        assert!(report.conflicts.is_empty());
    }

    #[test]
    fn test_same_class_pair_never_pairs_item_with_itself() {
        let pipeline = ConflictPipeline::new(AnalysisConfig {
            selections: vec![Selection::pair("door", "door")],
            ..Default::default()
        });

        let one = doors(&[[100.0, 10.0, 140.0, 30.0]], &[Orientation::Vertical]);
        let analysis = pipeline.analyze_raster("plan", &open_raster(), &one).unwrap();
        assert_eq!(analysis.selections[0].candidates, 0);
        assert!(analysis.selections[0].conflicts.is_empty());

        let two = doors(
            &[[100.0, 10.0, 140.0, 30.0], [105.0, 250.0, 145.0, 270.0]],
            &[Orientation::Vertical, Orientation::Vertical],
        );
        let analysis = pipeline.analyze_raster("plan", &open_raster(), &two).unwrap();
        let report = &analysis.selections[0];
        assert_eq!(report.candidates, 1);
        assert_eq!(report.conflicts.len(), 1);
        assert_ne!(report.conflicts[0].first(), report.conflicts[0].second());
    }

    #[test]
    fn test_length_mismatch_skips_selection() {
        let detections = doors(
            &[[100.0, 10.0, 140.0, 30.0], [105.0, 250.0, 145.0, 270.0]],
            &[Orientation::Vertical],
        );

        let analysis = door_pipeline()
            .analyze_raster("plan", &open_raster(), &detections)
            .unwrap();
        let report = &analysis.selections[0];
        assert!(report.skipped.is_some());
        assert!(report.conflicts.is_empty());
    }

    #[test]
    fn test_no_detections_is_empty() {
        let analysis = ConflictPipeline::default()
            .analyze_raster("plan", &open_raster(), &ImageDetections::default())
            .unwrap();
        assert_eq!(analysis.selections.len(), 2);
        assert_eq!(analysis.conflict_count(), 0);
        assert!(analysis.selections.iter().all(|s| s.skipped.is_none()));
    }

    #[test]
    fn test_unset_checked_orientation_fails() {
        let mut detections = doors(&[[0.0, 0.0, 10.0, 10.0]], &[Orientation::Vertical]);
        detections.orientations.insert("door".into(), vec![None]);

        let result = door_pipeline().analyze_raster("plan", &open_raster(), &detections);
        assert!(matches!(result, Err(Error::InvalidOrientation(_))));
    }

    #[test]
    fn test_manifest_parses() {
        let manifest = Manifest::from_json_str(
            r#"{ "images": [ {
                "path": "plans/a.png",
                "detections": [ { "bbox": [0, 0, 10, 20], "class_name": "door" } ],
                "orientations": { "door": ["vertical"] }
            }, {
                "path": "plans/b.png",
                "detections": []
            } ] }"#,
        )
        .unwrap();

        assert_eq!(manifest.images.len(), 2);
        let first = &manifest.images[0].detections;
        assert_eq!(first.items("door", true).unwrap()[0].orientation, Some(Orientation::Vertical));
        assert!(manifest.images[1].detections.orientations.is_empty());
    }

    #[test]
    fn test_summary_counts() {
        let analysis = door_pipeline()
            .analyze_raster(
                "plan",
                &open_raster(),
                &doors(
                    &[[100.0, 10.0, 140.0, 30.0], [105.0, 250.0, 145.0, 270.0]],
                    &[Orientation::Vertical, Orientation::Vertical],
                ),
            )
            .unwrap();
        let outcomes = vec![
            ImageOutcome {
                image: "a".into(),
                result: Ok(analysis),
            },
            ImageOutcome {
                image: "b".into(),
                result: Err(Error::Collaborator("detector offline".into())),
            },
        ];

        let summary = BatchSummary::from_outcomes(&outcomes);
        assert_eq!(summary.images, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.conflicts.get("door"), Some(&1));
    }
}
