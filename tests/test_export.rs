mod common;

use common::*;
use phenosnap::export::{CSV_HEADER, save_raster, save_rasters, unique_path, write_csv};
use phenosnap::natural_sort::{natural_cmp, sort_natural};
use std::cmp::Ordering;
use std::path::Path;

#[test]
fn test_natural_sort() {
    let mut names = vec![
        "img2.png".to_string(),
        "img10.png".to_string(),
        "img1.png".to_string(),
    ];
    sort_natural(&mut names);
    assert_eq!(names, vec!["img1.png", "img2.png", "img10.png"]);
}

#[test]
fn test_natural_sort_ignores_case_in_text() {
    assert_eq!(natural_cmp("Leaf3.png", "leaf20.png"), Ordering::Less);
    assert_eq!(natural_cmp("b1.png", "A2.png"), Ordering::Greater);
    assert_eq!(natural_cmp("x99999999999999999999", "x100000000000000000000"), Ordering::Less);
}

#[test]
fn test_save_never_overwrites() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let source = Path::new("/photos/leaf.png");
    let first = standard_leaf_image();
    let second = image::RgbImage::new(40, 30);

    let a = save_raster(&first, source, dir.path())?;
    let b = save_raster(&second, source, dir.path())?;

    assert_eq!(a, dir.path().join("leaf.jpg"));
    assert_eq!(b, dir.path().join("leaf(1).jpg"));
    assert_eq!(image::open(&a)?.width(), 400);
    assert_eq!(image::open(&b)?.width(), 40);
    assert_eq!(unique_path(dir.path(), "leaf", "jpg"), dir.path().join("leaf(2).jpg"));
    Ok(())
}

#[test]
fn test_save_rasters_creates_directory() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let out = dir.path().join("results");
    let raster = standard_leaf_image();
    let a = Path::new("one/leaf.bmp");
    let b = Path::new("two/leaf.png");

    let saved = save_rasters([(a, &raster), (b, &raster)], &out)?;
    assert_eq!(saved, vec![out.join("leaf.jpg"), out.join("leaf(1).jpg")]);
    Ok(())
}

#[test]
fn test_csv_layout() -> anyhow::Result<()> {
    let measured = MeasurementRecord {
        leaf_area_cm2: Some(22.5),
        green_pixel_count: 22500,
        blue_pixel_count: 10000,
        convex_hull_cm2: Some(23.0),
        convex_hull_pixel_count: 23000,
    };
    let undetermined = MeasurementRecord::default();
    let a = Path::new("/data/img1.png");
    let b = Path::new("/data/img2.png");

    let mut buffer = Vec::new();
    write_csv(&mut buffer, [(a, &measured), (b, &undetermined)])?;
    let text = String::from_utf8(buffer)?;
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], CSV_HEADER.join(","));
    assert_eq!(
        lines[0],
        "Image Filename,Leaf Area cm2,Number of Green Pixels,Number of Blue Pixels,Convex Hull Area (cm2),Convex Hull Pixels"
    );
    assert_eq!(lines[1], "img1.png,22.5,22500,10000,23,23000");
    assert_eq!(lines[2], "img2.png,,0,0,,0");
    assert_eq!(lines.len(), 3);
    Ok(())
}
