pub mod calibration;
pub mod components;
pub mod compositor;
pub mod hulls;
pub mod masks;
pub mod preprocessing;
pub mod segmentation;

use image::{DynamicImage, ImageReader, RgbImage};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::{PipelineConfig, ZeroPolicy};
use crate::error::MeasureError;
use crate::models::{AnnotatedRaster, Hull, MeasurementRecord};
use calibration::CalibrationModel;
use segmentation::Segmentation;

/// Result of a full, successful measurement
#[derive(Debug, Clone)]
pub struct Measurement {
    pub record: MeasurementRecord,
    pub raster: AnnotatedRaster,
    pub dominant_hull: Hull,
}

/// What happened to one image
#[derive(Debug, Clone)]
pub enum ImageOutcome {
    Success {
        record: MeasurementRecord,
        raster: AnnotatedRaster,
    },
    /// Measurement failed after preprocessing; the raster is the blurred
    /// source without overlay and the record is zeroed
    Degraded {
        record: MeasurementRecord,
        raster: AnnotatedRaster,
        reason: String,
    },
    /// Nothing usable could be produced, e.g. the file did not decode
    Failed { reason: String },
}

impl ImageOutcome {
    pub fn record(&self) -> Option<&MeasurementRecord> {
        match self {
            ImageOutcome::Success { record, .. } | ImageOutcome::Degraded { record, .. } => {
                Some(record)
            }
            ImageOutcome::Failed { .. } => None,
        }
    }

    pub fn raster(&self) -> Option<&AnnotatedRaster> {
        match self {
            ImageOutcome::Success { raster, .. } | ImageOutcome::Degraded { raster, .. } => {
                Some(raster)
            }
            ImageOutcome::Failed { .. } => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            ImageOutcome::Success { .. } => None,
            ImageOutcome::Degraded { reason, .. } | ImageOutcome::Failed { reason } => {
                Some(reason.as_str())
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ImageOutcome::Success { .. })
    }
}

/// Outcome tagged with the image it belongs to
#[derive(Debug, Clone)]
pub struct ImageResult {
    pub identity: PathBuf,
    pub outcome: ImageOutcome,
}

/// Where intermediate rasters go when debugging a run
#[derive(Debug, Clone)]
pub struct DebugConfig {
    pub output_dir: PathBuf,
}

/// Per-image leaf measurement pipeline.
///
/// Pure with respect to its inputs: the same image and config always yield
/// the same outcome, so one instance can be shared across worker threads.
#[derive(Debug, Clone)]
pub struct LeafPipeline {
    config: PipelineConfig,
    calibration: CalibrationModel,
    debug: Option<DebugConfig>,
}

impl LeafPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, MeasureError> {
        config.validate()?;
        let calibration = CalibrationModel::new(config.reference_area_cm2);
        Ok(Self {
            config,
            calibration,
            debug: None,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Enable debug dumps of every stage.
    /// The directory must be empty or non-existent.
    pub fn with_debug(mut self, output_dir: PathBuf) -> anyhow::Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }
        self.debug = Some(DebugConfig { output_dir });
        Ok(self)
    }

    /// Segment, filter, merge and calibrate one image.
    pub fn measure(&self, img: &RgbImage) -> Result<Measurement, MeasureError> {
        let seg = segmentation::segment(img, &self.config.segmentation);
        self.measure_segmented(&seg, None)
    }

    fn measure_segmented(
        &self,
        seg: &Segmentation,
        stem: Option<&str>,
    ) -> Result<Measurement, MeasureError> {
        let (width, height) = seg.blurred.dimensions();

        let filtered = components::filter_components(&seg.green, self.config.min_component_size);
        self.dump(stem, 4, "filtered_mask", || DynamicImage::ImageLuma8(filtered.clone()));

        let hulls = hulls::extract_hulls(&filtered);
        debug!("Found {} green hulls", hulls.len());

        let merged = hulls::merge_hulls(
            hulls,
            self.config.max_merge_distance,
            self.config.merge_strategy,
        );
        debug!("{} hulls after merging", merged.len());

        let dominant = hulls::dominant_hull(merged)?;
        let hull_mask = hulls::fill_hull(&dominant, width, height);
        self.dump(stem, 5, "hull_mask", || DynamicImage::ImageLuma8(hull_mask.clone()));

        let green = masks::intersect(&filtered, &hull_mask)?;
        let combined = masks::union(&green, &seg.blue)?;

        let green_pixels = masks::count_foreground(&green);
        let blue_pixels = masks::count_foreground(&seg.blue);
        let hull_pixels = masks::count_foreground(&hull_mask);
        debug!(
            green_pixels,
            blue_pixels, hull_pixels, "Counted leaf, reference and hull pixels"
        );

        let policy = self.config.zero_policy;
        let record = MeasurementRecord {
            leaf_area_cm2: self.calibration.area_cm2(green_pixels, blue_pixels, policy),
            green_pixel_count: green_pixels,
            blue_pixel_count: blue_pixels,
            convex_hull_cm2: self.calibration.area_cm2(hull_pixels, blue_pixels, policy),
            convex_hull_pixel_count: hull_pixels,
        };

        let raster = compositor::compose(&seg.blurred, &combined, &dominant, &self.config.outline)?;
        self.dump(stem, 7, "composite", || DynamicImage::ImageRgb8(raster.clone()));

        Ok(Measurement {
            record,
            raster,
            dominant_hull: dominant,
        })
    }

    fn degraded_record(&self) -> MeasurementRecord {
        match self.config.zero_policy {
            ZeroPolicy::Compatible => MeasurementRecord::zeroed(),
            ZeroPolicy::Undetermined => MeasurementRecord::default(),
        }
    }

    /// Run the pipeline on an already decoded image, never failing outright
    pub fn process(&self, identity: &Path, img: &RgbImage) -> ImageOutcome {
        let stem = identity
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        let seg = segmentation::segment(img, &self.config.segmentation);
        self.dump(Some(stem.as_str()), 1, "blurred", || DynamicImage::ImageRgb8(seg.blurred.clone()));
        self.dump(Some(stem.as_str()), 2, "hsv_opened", || DynamicImage::ImageRgb8(seg.opened.clone()));
        self.dump(Some(stem.as_str()), 3, "green_mask", || DynamicImage::ImageLuma8(seg.green.clone()));
        self.dump(Some(stem.as_str()), 6, "blue_mask", || DynamicImage::ImageLuma8(seg.blue.clone()));

        match self.measure_segmented(&seg, Some(stem.as_str())) {
            Ok(measurement) => ImageOutcome::Success {
                record: measurement.record,
                raster: measurement.raster,
            },
            Err(e) if e.is_recoverable() => {
                warn!(image = %identity.display(), "Measurement failed: {}", e);
                ImageOutcome::Degraded {
                    record: self.degraded_record(),
                    raster: seg.blurred,
                    reason: e.to_string(),
                }
            }
            Err(e) => {
                warn!(image = %identity.display(), "Cannot measure image: {}", e);
                ImageOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Decode `path` and run the pipeline on it
    pub fn process_file(&self, path: &Path) -> ImageResult {
        let outcome = match decode(path) {
            Ok(img) => self.process(path, &img),
            Err(e) => {
                warn!(image = %path.display(), "Could not load image: {}", e);
                ImageOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };
        ImageResult {
            identity: path.to_path_buf(),
            outcome,
        }
    }

    /// Save an intermediate raster in debug mode. Failures are logged, not returned.
    fn dump(&self, stem: Option<&str>, index: usize, stage: &str, image: impl FnOnce() -> DynamicImage) {
        let (Some(debug_config), Some(stem)) = (&self.debug, stem) else {
            return;
        };
        let step_dir = debug_config.output_dir.join(format!("{:02}_{}", index, stage));
        let output_path = step_dir.join(format!("{}.png", stem));
        let saved = std::fs::create_dir_all(&step_dir)
            .map_err(anyhow::Error::from)
            .and_then(|_| image().save(&output_path).map_err(anyhow::Error::from));
        match saved {
            Ok(()) => debug!("Debug: saved {}", output_path.display()),
            Err(e) => warn!("Failed to save debug image {}: {}", output_path.display(), e),
        }
    }
}

/// Read and decode an image file into 8-bit RGB
pub fn decode(path: &Path) -> Result<RgbImage, MeasureError> {
    let img = ImageReader::open(path)
        .map_err(|e| MeasureError::Decode {
            path: path.to_path_buf(),
            source: image::ImageError::IoError(e),
        })?
        .with_guessed_format()
        .map_err(|e| MeasureError::Decode {
            path: path.to_path_buf(),
            source: image::ImageError::IoError(e),
        })?
        .decode()
        .map_err(|e| MeasureError::Decode {
            path: path.to_path_buf(),
            source: e,
        })?;
    Ok(img.to_rgb8())
}
