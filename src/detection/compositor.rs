use image::{Rgb, RgbImage};
use imageproc::drawing::{BresenhamLineIter, draw_filled_circle_mut};

use crate::config::OutlineConfig;
use crate::error::MeasureError;
use crate::models::{AnnotatedRaster, Hull, Mask};

/// Copy of `source` with every pixel outside `mask` set to black
pub fn apply_mask(source: &RgbImage, mask: &Mask) -> Result<RgbImage, MeasureError> {
    if source.dimensions() != mask.dimensions() {
        return Err(MeasureError::DimensionMismatch {
            expected: source.dimensions(),
            actual: mask.dimensions(),
        });
    }
    Ok(RgbImage::from_fn(source.width(), source.height(), |x, y| {
        if mask.get_pixel(x, y)[0] > 0 {
            *source.get_pixel(x, y)
        } else {
            Rgb([0, 0, 0])
        }
    }))
}

/// Stroke the closed hull outline onto `canvas`
pub fn draw_hull_outline(canvas: &mut RgbImage, hull: &Hull, outline: &OutlineConfig) {
    let color = Rgb(outline.color);
    let radius = (outline.width / 2) as i32;
    let n = hull.points.len();
    if n == 0 {
        return;
    }

    for i in 0..n {
        let start = hull.points[i];
        let end = hull.points[(i + 1) % n];
        let line = BresenhamLineIter::new(
            (start.x as f32, start.y as f32),
            (end.x as f32, end.y as f32),
        );
        for (x, y) in line {
            if radius == 0 {
                if x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
                    canvas.put_pixel(x as u32, y as u32, color);
                }
            } else {
                draw_filled_circle_mut(canvas, (x, y), radius, color);
            }
        }
    }
}

/// Segmented composite with the dominant hull outlined
pub fn compose(
    blurred: &RgbImage,
    combined: &Mask,
    hull: &Hull,
    outline: &OutlineConfig,
) -> Result<AnnotatedRaster, MeasureError> {
    let mut composite = apply_mask(blurred, combined)?;
    draw_hull_outline(&mut composite, hull, outline);
    Ok(composite)
}
