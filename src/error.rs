//! Error types for leaf measurement and batch processing

use std::path::PathBuf;
use thiserror::Error;

/// Failure while measuring a single image.
///
/// These never abort a batch; the driver turns them into a degraded outcome
/// for the affected image and moves on.
#[derive(Error, Debug)]
pub enum MeasureError {
    /// No green contour survived filtering, so there is no hull to measure
    #[error("no leaf contours found after filtering")]
    EmptyHullSet,

    /// A mask did not match the dimensions of the image it was derived from
    #[error("mask dimensions {actual:?} do not match image dimensions {expected:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Invalid pipeline parameter
    #[error("invalid parameter: {parameter} = {value}")]
    InvalidConfig { parameter: String, value: String },

    /// Source file could not be read or decoded
    #[error("failed to decode {}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl MeasureError {
    pub fn invalid_config(parameter: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidConfig {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    /// Whether the image can still produce a fallback raster.
    ///
    /// Decode failures have nothing to fall back to; everything downstream of
    /// preprocessing does.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            MeasureError::Decode { .. } | MeasureError::InvalidConfig { .. }
        )
    }
}

/// Conditions that stop a batch before any image is processed
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("folder is empty: {}", .path.display())]
    EmptyFolder { path: PathBuf },

    #[error("not a directory: {}", .path.display())]
    NotADirectory { path: PathBuf },

    #[error("memory usage {used_percent:.1}% exceeds ceiling {ceiling_percent:.1}%")]
    MemoryCeilingExceeded {
        used_percent: f64,
        ceiling_percent: f64,
    },

    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while writing rasters or the results table
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to save image {}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write results table")]
    Csv(#[from] csv::Error),

    #[error("i/o error on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
