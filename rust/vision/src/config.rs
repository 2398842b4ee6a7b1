// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Analysis configuration: thresholds, binarization and orientation policy

use crate::error::Result;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters for turning a floor plan image into a wall/free raster
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BinarizeConfig {
    /// Bilateral filter window width in pixels
    pub bilateral_diameter: u32,
    /// Bilateral filter range sigma (intensity units)
    pub sigma_color: f32,
    /// Bilateral filter spatial sigma (pixels)
    pub sigma_space: f32,
    /// Erosion/dilation radius; 1 is a 3x3 kernel
    pub morph_radius: u8,
    /// Pixels darker than this become wall
    pub wall_threshold: u8,
}

impl Default for BinarizeConfig {
    fn default() -> Self {
        Self {
            bilateral_diameter: 10,
            sigma_color: 100.0,
            sigma_space: 1000.0,
            morph_radius: 1,
            wall_threshold: 50,
        }
    }
}

/// Which element names are compared against each other
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// Every instance of one element against every other (e.g. door to door)
    Single(String),
    /// Every instance of one element against every instance of another
    Pair(String, String),
}

impl Selection {
    pub fn single(name: impl Into<String>) -> Self {
        Selection::Single(name.into())
    }

    pub fn pair(first: impl Into<String>, second: impl Into<String>) -> Self {
        Selection::Pair(first.into(), second.into())
    }

    /// Element names this selection needs items for
    pub fn names(&self) -> Vec<&str> {
        match self {
            Selection::Single(name) => vec![name.as_str()],
            Selection::Pair(a, b) => vec![a.as_str(), b.as_str()],
        }
    }

    /// Display label, e.g. `door` or `entrance-kitchen`
    pub fn label(&self) -> String {
        match self {
            Selection::Single(name) => name.clone(),
            Selection::Pair(a, b) => format!("{}-{}", a, b),
        }
    }
}

/// Configuration for the conflict pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum projection overlap rate for a pair to count as facing
    pub overlap_threshold: f64,
    /// Maximum obstruction rate for a line of sight to count as clear
    pub obstruction_threshold: f64,
    /// Fraction of an item's width/height added around it before masking
    pub mask_margin: f64,
    pub binarize: BinarizeConfig,
    /// Whether an element's detected orientation constrains matching.
    /// Names missing from the map are checked.
    pub orientation_policy: FxHashMap<String, bool>,
    /// Element selections analyzed for every image
    pub selections: Vec<Selection>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let mut orientation_policy = FxHashMap::default();
        orientation_policy.insert("door".to_string(), true);
        orientation_policy.insert("window".to_string(), true);
        orientation_policy.insert("entrance".to_string(), false);
        orientation_policy.insert("kitchen".to_string(), false);

        Self {
            overlap_threshold: 0.5,
            obstruction_threshold: 0.5,
            mask_margin: 0.02,
            binarize: BinarizeConfig::default(),
            orientation_policy,
            selections: vec![
                Selection::single("door"),
                Selection::pair("entrance", "kitchen"),
            ],
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Whether items named `name` are matched on their detected orientation
    pub fn checks_orientation(&self, name: &str) -> bool {
        self.orientation_policy.get(name).copied().unwrap_or(true)
    }

    pub fn with_thresholds(mut self, overlap: f64, obstruction: f64) -> Self {
        self.overlap_threshold = overlap;
        self.obstruction_threshold = obstruction;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.overlap_threshold, 0.5);
        assert_eq!(config.obstruction_threshold, 0.5);
        assert_eq!(config.binarize.wall_threshold, 50);
        assert!(config.checks_orientation("door"));
        assert!(!config.checks_orientation("kitchen"));
        assert!(config.checks_orientation("bathroom"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{
            "overlap_threshold": 0.7,
            "orientation_policy": { "door": false },
            "selections": [ { "single": "window" }, { "pair": ["door", "bed"] } ]
        }"#;
        let config = AnalysisConfig::from_json_str(json).unwrap();

        assert_eq!(config.overlap_threshold, 0.7);
        assert_eq!(config.obstruction_threshold, 0.5);
        assert_eq!(config.mask_margin, 0.02);
        assert!(!config.checks_orientation("door"));
        assert_eq!(
            config.selections,
            vec![Selection::single("window"), Selection::pair("door", "bed")]
        );
    }

    #[test]
    fn test_selection_label() {
        assert_eq!(Selection::single("door").label(), "door");
        assert_eq!(Selection::pair("entrance", "kitchen").label(), "entrance-kitchen");
        assert_eq!(Selection::pair("entrance", "kitchen").names(), vec!["entrance", "kitchen"]);
    }
}
