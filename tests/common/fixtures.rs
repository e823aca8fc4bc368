#![allow(dead_code)]

use image::{GrayImage, Luma, Rgb, RgbImage};
use phenosnap::{Hull, LeafPipeline, PipelineConfig, Point2D};
use std::path::{Path, PathBuf};

pub const LEAF_GREEN: Rgb<u8> = Rgb([0, 200, 0]);
pub const CARD_BLUE: Rgb<u8> = Rgb([0, 0, 200]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Axis-aligned rectangle: top-left corner plus size
#[derive(Debug, Clone, Copy)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// 150x150 leaf, 22500 pixels
pub const LEAF: Rect = Rect::new(20, 20, 150, 150);
/// 100x100 reference card, 10000 pixels
pub const CARD: Rect = Rect::new(250, 50, 100, 100);

pub fn fill_rect(img: &mut RgbImage, rect: Rect, color: Rgb<u8>) {
    for y in rect.y..rect.y + rect.height {
        for x in rect.x..rect.x + rect.width {
            img.put_pixel(x, y, color);
        }
    }
}

/// Black 400x300 image with a green leaf and a blue reference card
pub fn leaf_image(leaf: Rect, card: Rect) -> RgbImage {
    let mut img = RgbImage::from_pixel(400, 300, BLACK);
    fill_rect(&mut img, leaf, LEAF_GREEN);
    fill_rect(&mut img, card, CARD_BLUE);
    img
}

pub fn standard_leaf_image() -> RgbImage {
    leaf_image(LEAF, CARD)
}

/// Default parameters with blurring off, so synthetic shapes keep exact pixel counts
pub fn sharp_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.segmentation.blur_sigma = 0.0;
    config
}

pub fn sharp_pipeline() -> LeafPipeline {
    LeafPipeline::new(sharp_config()).expect("default config is valid")
}

pub fn mask_with_rects(width: u32, height: u32, rects: &[Rect]) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    for rect in rects {
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }
    mask
}

/// Square hull with corners at (x, y) and (x + side, y + side)
pub fn square_hull(x: i32, y: i32, side: i32) -> Hull {
    Hull::new(vec![
        Point2D::new(x, y),
        Point2D::new(x + side, y),
        Point2D::new(x + side, y + side),
        Point2D::new(x, y + side),
    ])
}

/// Save `img` as PNG under `dir` and return its path
pub fn write_png(dir: &Path, name: &str, img: &RgbImage) -> PathBuf {
    let path = dir.join(name);
    img.save_with_format(&path, image::ImageFormat::Png)
        .expect("Failed to save test image");
    path
}
