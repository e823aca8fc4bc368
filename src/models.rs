use image::{GrayImage, RgbImage};
use imageproc::point::Point;

/// Integer pixel coordinate
pub type Point2D = Point<i32>;

/// Binary raster where every pixel is either 0 or 255
pub type Mask = GrayImage;

/// Annotated composite produced for each image
pub type AnnotatedRaster = RgbImage;

pub const FOREGROUND: u8 = 255;

/// Convex polygon in pixel coordinates, vertices in hull order
#[derive(Debug, Clone, PartialEq)]
pub struct Hull {
    pub points: Vec<Point2D>,
}

impl Hull {
    pub fn new(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Polygon area by the shoelace formula
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut twice_area: i64 = 0;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            twice_area += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
        }
        twice_area.abs() as f64 / 2.0
    }

    /// Smallest vertex-to-vertex distance between two hulls
    pub fn min_vertex_distance(&self, other: &Hull) -> f64 {
        let mut best = i64::MAX;
        for a in &self.points {
            for b in &other.points {
                let dx = (a.x - b.x) as i64;
                let dy = (a.y - b.y) as i64;
                best = best.min(dx * dx + dy * dy);
            }
        }
        if best == i64::MAX {
            f64::INFINITY
        } else {
            (best as f64).sqrt()
        }
    }
}

/// Calibrated physical area, or a marker that one of the inputs was zero
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Calibrated {
    Area(f64),
    Undetermined,
}

impl Calibrated {
    pub fn or_zero(self) -> f64 {
        match self {
            Calibrated::Area(value) => value,
            Calibrated::Undetermined => 0.0,
        }
    }
}

/// Per-image phenotype measurements.
///
/// Areas are `None` only when the pipeline runs with
/// [`ZeroPolicy::Undetermined`](crate::config::ZeroPolicy) and a count was zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementRecord {
    pub leaf_area_cm2: Option<f64>,
    pub green_pixel_count: u64,
    pub blue_pixel_count: u64,
    pub convex_hull_cm2: Option<f64>,
    pub convex_hull_pixel_count: u64,
}

impl MeasurementRecord {
    /// Record used when an image could not be measured
    pub fn zeroed() -> Self {
        Self {
            leaf_area_cm2: Some(0.0),
            convex_hull_cm2: Some(0.0),
            ..Self::default()
        }
    }

    pub fn leaf_area_or_zero(&self) -> f64 {
        self.leaf_area_cm2.unwrap_or(0.0)
    }

    pub fn convex_hull_or_zero(&self) -> f64 {
        self.convex_hull_cm2.unwrap_or(0.0)
    }
}
