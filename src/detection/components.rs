use image::{GrayImage, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};
use std::collections::HashMap;

use crate::models::{FOREGROUND, Mask};

/// Pixel area of every 8-connected foreground region, keyed by label
pub fn component_areas(labels: &image::ImageBuffer<Luma<u32>, Vec<u32>>) -> HashMap<u32, u32> {
    let mut areas: HashMap<u32, u32> = HashMap::new();
    for label in labels.pixels() {
        let label_val = label[0];
        if label_val == 0 {
            continue; // Skip background
        }
        *areas.entry(label_val).or_insert(0) += 1;
    }
    areas
}

/// Keep only the 8-connected regions of `mask` whose area is at least `min_size` pixels
pub fn filter_components(mask: &Mask, min_size: u32) -> Mask {
    let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));
    let areas = component_areas(&labels);

    let mut filtered = GrayImage::new(mask.width(), mask.height());
    for (x, y, label) in labels.enumerate_pixels() {
        let label_val = label[0];
        if label_val == 0 {
            continue;
        }
        if areas.get(&label_val).is_some_and(|&area| area >= min_size) {
            filtered.put_pixel(x, y, Luma([FOREGROUND]));
        }
    }
    filtered
}
