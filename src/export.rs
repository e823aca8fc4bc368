//! Saving annotated rasters and the results table

use image::ImageFormat;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::ExportError;
use crate::models::{AnnotatedRaster, MeasurementRecord};

pub const CSV_HEADER: [&str; 6] = [
    "Image Filename",
    "Leaf Area cm2",
    "Number of Green Pixels",
    "Number of Blue Pixels",
    "Convex Hull Area (cm2)",
    "Convex Hull Pixels",
];

/// First path of the form `dir/base.ext`, `dir/base(1).ext`, `dir/base(2).ext`, ...
/// that does not exist yet
pub fn unique_path(dir: &Path, base: &str, extension: &str) -> PathBuf {
    let mut candidate = dir.join(format!("{}.{}", base, extension));
    let mut counter = 1;
    while candidate.exists() {
        candidate = dir.join(format!("{}({}).{}", base, counter, extension));
        counter += 1;
    }
    candidate
}

fn base_name(source: &Path) -> String {
    source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}

/// Save one raster as JPEG next to any earlier saves, never overwriting
pub fn save_raster(
    raster: &AnnotatedRaster,
    source: &Path,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    let path = unique_path(dir, &base_name(source), "jpg");
    raster
        .save_with_format(&path, ImageFormat::Jpeg)
        .map_err(|source| ExportError::Image {
            path: path.clone(),
            source,
        })?;
    info!("Saved {}", path.display());
    Ok(path)
}

/// Save every raster in order, returning the paths written
pub fn save_rasters<'a>(
    items: impl IntoIterator<Item = (&'a Path, &'a AnnotatedRaster)>,
    dir: &Path,
) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    items
        .into_iter()
        .map(|(source, raster)| save_raster(raster, source, dir))
        .collect()
}

fn format_area(area: Option<f64>) -> String {
    area.map(|a| a.to_string()).unwrap_or_default()
}

/// Write the header and one row per record
pub fn write_csv<'a, W: Write>(
    writer: W,
    records: impl IntoIterator<Item = (&'a Path, &'a MeasurementRecord)>,
) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)?;
    for (source, record) in records {
        let filename = source
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        csv.write_record([
            filename,
            format_area(record.leaf_area_cm2),
            record.green_pixel_count.to_string(),
            record.blue_pixel_count.to_string(),
            format_area(record.convex_hull_cm2),
            record.convex_hull_pixel_count.to_string(),
        ])?;
    }
    csv.flush().map_err(|e| ExportError::Csv(e.into()))?;
    Ok(())
}

pub fn save_csv<'a>(
    path: &Path,
    records: impl IntoIterator<Item = (&'a Path, &'a MeasurementRecord)>,
) -> Result<(), ExportError> {
    let file = std::fs::File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_csv(file, records)?;
    info!("CSV file saved to {}", path.display());
    Ok(())
}
