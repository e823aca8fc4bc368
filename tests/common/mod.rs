mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from phenosnap for tests
pub use phenosnap::{
    Hull, ImageOutcome, LeafPipeline, MeasurementRecord, MergeStrategy, PipelineConfig, Point2D,
    ZeroPolicy,
};
