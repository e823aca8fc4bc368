use image::Luma;
use imageproc::map::map_colors2;

use crate::error::MeasureError;
use crate::models::{FOREGROUND, Mask};

/// Number of foreground pixels in a mask
pub fn count_foreground(mask: &Mask) -> u64 {
    mask.pixels().filter(|p| p[0] > 0).count() as u64
}

/// Pixel-wise AND of two masks of the same size
pub fn intersect(a: &Mask, b: &Mask) -> Result<Mask, MeasureError> {
    if a.dimensions() != b.dimensions() {
        return Err(MeasureError::DimensionMismatch {
            expected: a.dimensions(),
            actual: b.dimensions(),
        });
    }
    Ok(map_colors2(a, b, |p: Luma<u8>, q: Luma<u8>| {
        Luma([if p[0] > 0 && q[0] > 0 { FOREGROUND } else { 0 }])
    }))
}

/// Pixel-wise OR of two masks of the same size
pub fn union(a: &Mask, b: &Mask) -> Result<Mask, MeasureError> {
    if a.dimensions() != b.dimensions() {
        return Err(MeasureError::DimensionMismatch {
            expected: a.dimensions(),
            actual: b.dimensions(),
        });
    }
    Ok(map_colors2(a, b, |p: Luma<u8>, q: Luma<u8>| {
        Luma([if p[0] > 0 || q[0] > 0 { FOREGROUND } else { 0 }])
    }))
}
