pub mod config;
pub mod detection;
pub mod error;
pub mod export;
pub mod logger;
pub mod models;
pub mod natural_sort;
pub mod pipeline;

pub use config::{HsvBand, MergeStrategy, PipelineConfig, ZeroPolicy};
pub use detection::{ImageOutcome, ImageResult, LeafPipeline, Measurement};
pub use error::{BatchError, ExportError, MeasureError};
pub use models::{AnnotatedRaster, Calibrated, Hull, Mask, MeasurementRecord, Point2D};
pub use pipeline::{BatchEvent, BatchProcessor, BatchSession, MemoryProbe};
