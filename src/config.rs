//! Tunable parameters for the measurement pipeline.
//!
//! Everything here has a default matching the cassava field protocol
//! (blue 10 cm² reference card, leaves photographed on a dark background).
//! A config can also be loaded from JSON:
//!
//! ```no_run
//! use phenosnap::PipelineConfig;
//! use std::path::Path;
//!
//! let config = PipelineConfig::from_json_file(Path::new("phenosnap.json"))?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::MeasureError;

/// Inclusive band in the 8-bit hue/saturation/value space
/// (hue 0..180, saturation and value 0..=255).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvBand {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvBand {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| hsv[c] >= self.lower[c] && hsv[c] <= self.upper[c])
    }
}

/// How nearby hulls are combined before picking the dominant one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// One greedy scan per seed hull; reproduces historical output
    Greedy,
    /// Every hull within reach of another, transitively, ends up in one cluster
    Transitive,
}

/// What to report when a calibration input is zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroPolicy {
    /// Report 0.0 cm², matching historical spreadsheets
    Compatible,
    /// Leave the area empty so it can't be confused with a measured zero
    Undetermined,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Gaussian sigma applied before color conversion, 0 disables blurring
    pub blur_sigma: f32,
    /// Side of the square structuring element used for opening
    pub opening_size: u32,
    pub green: HsvBand,
    pub blue: HsvBand,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineConfig {
    pub color: [u8; 3],
    pub width: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub segmentation: SegmentationConfig,

    /// Connected regions smaller than this (in pixels) are dropped from the green mask
    pub min_component_size: u32,

    /// Hulls whose nearest vertices are closer than this (in pixels) are merged
    pub max_merge_distance: f64,

    pub merge_strategy: MergeStrategy,

    /// Physical area of the blue calibration card
    pub reference_area_cm2: f64,

    pub outline: OutlineConfig,

    pub zero_policy: ZeroPolicy,

    /// Batches are refused when system memory use is above this percentage
    pub memory_ceiling_percent: f64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            // Sigma OpenCV derives for a 5x5 kernel with automatic sigma
            blur_sigma: 1.1,
            opening_size: 9,
            green: HsvBand::new([34, 25, 25], [86, 255, 255]),
            blue: HsvBand::new([100, 40, 40], [150, 255, 255]),
        }
    }
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            color: [0, 255, 0],
            width: 5,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            segmentation: SegmentationConfig::default(),
            min_component_size: 20_000,
            max_merge_distance: 500.0,
            merge_strategy: MergeStrategy::Transitive,
            reference_area_cm2: 10.0,
            outline: OutlineConfig::default(),
            zero_policy: ZeroPolicy::Compatible,
            memory_ceiling_percent: 85.0,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: PipelineConfig = serde_json::from_str(&data)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MeasureError> {
        let seg = &self.segmentation;
        if !(seg.blur_sigma >= 0.0) {
            return Err(MeasureError::invalid_config("blur_sigma", seg.blur_sigma));
        }
        if seg.opening_size == 0 || seg.opening_size % 2 == 0 {
            return Err(MeasureError::invalid_config(
                "opening_size",
                seg.opening_size,
            ));
        }
        for (name, band) in [("green", &seg.green), ("blue", &seg.blue)] {
            if (0..3).any(|c| band.lower[c] > band.upper[c]) {
                return Err(MeasureError::invalid_config(
                    format!("{name} band"),
                    format!("{:?}..{:?}", band.lower, band.upper),
                ));
            }
        }
        if !(self.reference_area_cm2 > 0.0) {
            return Err(MeasureError::invalid_config(
                "reference_area_cm2",
                self.reference_area_cm2,
            ));
        }
        if !(self.max_merge_distance >= 0.0) {
            return Err(MeasureError::invalid_config(
                "max_merge_distance",
                self.max_merge_distance,
            ));
        }
        if self.outline.width == 0 {
            return Err(MeasureError::invalid_config("outline.width", 0));
        }
        if !(self.memory_ceiling_percent > 0.0 && self.memory_ceiling_percent <= 100.0) {
            return Err(MeasureError::invalid_config(
                "memory_ceiling_percent",
                self.memory_ceiling_percent,
            ));
        }
        Ok(())
    }
}
