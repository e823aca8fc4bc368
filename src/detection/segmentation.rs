use image::{GrayImage, Luma, RgbImage};

use crate::config::{HsvBand, SegmentationConfig};
use crate::detection::preprocessing;
use crate::models::{FOREGROUND, Mask};

/// Intermediate rasters produced while segmenting one image
pub struct Segmentation {
    /// Blurred source, in RGB order
    pub blurred: RgbImage,
    /// Blurred source in HSV, before opening
    pub hsv: RgbImage,
    /// HSV after morphological opening
    pub opened: RgbImage,
    pub green: Mask,
    pub blue: Mask,
}

/// Pixels of `hsv` that fall inside `band` become 255, everything else 0
pub fn threshold(hsv: &RgbImage, band: &HsvBand) -> Mask {
    let mut mask = GrayImage::new(hsv.width(), hsv.height());
    for (x, y, pixel) in hsv.enumerate_pixels() {
        if band.contains(pixel.0) {
            mask.put_pixel(x, y, Luma([FOREGROUND]));
        }
    }
    mask
}

/// Splits an image into leaf-green and reference-blue masks.
///
/// The green band is thresholded on the opened HSV image so isolated noise and
/// thin bridges between leaves disappear first; the reference card is large
/// and flat, so the blue band is thresholded on the unopened HSV image.
pub fn segment(img: &RgbImage, config: &SegmentationConfig) -> Segmentation {
    let blurred = preprocessing::apply_blur(img, config.blur_sigma);
    let hsv = preprocessing::to_hsv(&blurred);
    let opened = preprocessing::open_channels(&hsv, config.opening_size);

    let green = threshold(&opened, &config.green);
    let blue = threshold(&hsv, &config.blue);

    Segmentation {
        blurred,
        hsv,
        opened,
        green,
        blue,
    }
}
