mod common;

use common::*;
use phenosnap::pipeline::{BatchEvent, BatchProcessor, FixedMemory, list_images, summarize};
use phenosnap::{BatchError, BatchSession};
use std::path::PathBuf;
use std::sync::mpsc;

fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_empty_folder_is_batch_fatal() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let mut processor = BatchProcessor::with_probe(sharp_pipeline(), Box::new(FixedMemory(10.0)));

    let err = processor.open_folder(dir.path(), None).err();
    assert!(matches!(err, Some(BatchError::EmptyFolder { .. })));
    assert!(processor.session().is_none());
    Ok(())
}

#[test]
fn test_folder_without_images_is_empty() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    std::fs::write(dir.path().join("notes.txt"), "leaf batch 3")?;

    assert!(matches!(
        list_images(dir.path()),
        Err(BatchError::EmptyFolder { .. })
    ));
    Ok(())
}

#[test]
fn test_images_are_listed_in_natural_order() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let img = standard_leaf_image();
    for name in ["img10.png", "img2.PNG", "img1.jpg", "readme.md"] {
        if name.ends_with(".md") {
            std::fs::write(dir.path().join(name), "")?;
        } else {
            img.save(dir.path().join(name))?;
        }
    }

    let images = list_images(dir.path())?;
    assert_eq!(file_names(&images), vec!["img1.jpg", "img2.PNG", "img10.png"]);
    Ok(())
}

#[test]
fn test_memory_ceiling_aborts_before_processing() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    write_png(dir.path(), "leaf1.png", &standard_leaf_image());
    let (sender, receiver) = mpsc::channel();

    let mut processor = BatchProcessor::with_probe(sharp_pipeline(), Box::new(FixedMemory(95.0)));
    let err = processor.open_folder(dir.path(), Some(&sender)).err();

    match err {
        Some(BatchError::MemoryCeilingExceeded {
            used_percent,
            ceiling_percent,
        }) => {
            assert_eq!(used_percent, 95.0);
            assert_eq!(ceiling_percent, 85.0);
        }
        other => panic!("expected memory ceiling error, got {:?}", other),
    }
    assert!(processor.session().is_none());
    drop(sender);
    assert_eq!(receiver.iter().count(), 0);
    Ok(())
}

#[test]
fn test_batch_results_follow_natural_order() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    write_png(dir.path(), "leaf10.png", &standard_leaf_image());
    write_png(dir.path(), "leaf2.png", &leaf_image(LEAF, Rect::new(250, 50, 50, 100)));
    write_png(dir.path(), "leaf1.png", &standard_leaf_image());
    std::fs::write(dir.path().join("leaf3.bmp"), b"garbage")?;

    let (sender, receiver) = mpsc::channel();
    let session = BatchSession::open(
        dir.path(),
        &sharp_pipeline(),
        &FixedMemory(10.0),
        Some(&sender),
    )?;
    drop(sender);

    let order: Vec<String> = session
        .results()
        .map(|r| r.identity.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(order, vec!["leaf1.png", "leaf2.png", "leaf3.bmp", "leaf10.png"]);

    let (ok, degraded, failed) = summarize(session.results());
    assert_eq!((ok, degraded, failed), (3, 0, 1));

    // Half-sized card doubles the calibrated area
    let leaf2 = session
        .get(&dir.path().join("leaf2.png"))
        .and_then(|r| r.outcome.record())
        .expect("leaf2 measured");
    assert_eq!(leaf2.leaf_area_cm2, Some(45.0));

    // The unreadable file has no record, so three rows are exported
    assert_eq!(session.records().count(), 3);

    let events: Vec<BatchEvent> = receiver.iter().collect();
    assert_eq!(events.first(), Some(&BatchEvent::Started { total: 4 }));
    assert_eq!(events.last(), Some(&BatchEvent::Finished));
    let done = events
        .iter()
        .filter(|e| matches!(e, BatchEvent::ImageDone { .. }))
        .count();
    assert_eq!(done, 4);
    Ok(())
}

#[test]
fn test_navigation_wraps_around() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    write_png(dir.path(), "a1.png", &standard_leaf_image());
    write_png(dir.path(), "a2.png", &image::RgbImage::new(400, 300));

    let mut session = BatchSession::open(dir.path(), &sharp_pipeline(), &FixedMemory(0.0), None)?;
    assert_eq!(session.len(), 2);
    assert_eq!(session.current_index(), 0);
    assert_eq!(session.leaf_area_label(), "Projected Leaf Area: 22.50 cm²");

    session.next_image();
    assert_eq!(session.current_index(), 1);
    // Degraded image reports its zeroed area
    assert_eq!(session.leaf_area_label(), "Projected Leaf Area: 0.00 cm²");

    session.next_image();
    assert_eq!(session.current_index(), 0);
    session.prev_image();
    assert_eq!(session.current_index(), 1);
    assert!(session.select(5).is_none());
    assert_eq!(session.current_index(), 1);
    Ok(())
}

#[test]
fn test_opening_new_folder_replaces_cache() -> anyhow::Result<()> {
    let first = tempfile::TempDir::new()?;
    let second = tempfile::TempDir::new()?;
    write_png(first.path(), "leaf1.png", &standard_leaf_image());
    write_png(second.path(), "other.png", &standard_leaf_image());

    let mut processor = BatchProcessor::with_probe(sharp_pipeline(), Box::new(FixedMemory(0.0)));
    processor.open_folder(first.path(), None)?;
    let first_leaf = first.path().join("leaf1.png");
    assert!(processor.session().and_then(|s| s.get(&first_leaf)).is_some());

    processor.open_folder(second.path(), None)?;
    let session = processor.session().expect("second folder opened");
    assert!(session.get(&first_leaf).is_none());
    assert_eq!(session.len(), 1);

    // A failed open leaves no session behind
    let empty = tempfile::TempDir::new()?;
    assert!(processor.open_folder(empty.path(), None).is_err());
    assert!(processor.session().is_none());
    Ok(())
}

#[test]
fn test_get_or_process_memoizes() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = write_png(dir.path(), "leaf1.png", &standard_leaf_image());
    let pipeline = sharp_pipeline();

    let mut session = BatchSession::open(dir.path(), &pipeline, &FixedMemory(0.0), None)?;
    std::fs::remove_file(&path)?;
    // Still served from the cache even though the file is gone
    let result = session.get_or_process(&path, &pipeline);
    assert!(result.outcome.is_success());
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_non_utf8_filenames_are_processed() -> anyhow::Result<()> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempfile::TempDir::new()?;
    let odd = dir.path().join(OsStr::from_bytes(b"leaf\xff1.png"));
    standard_leaf_image().save(&odd)?;
    write_png(dir.path(), "leaf2.png", &standard_leaf_image());

    let images = list_images(dir.path())?;
    assert_eq!(images.len(), 2);
    assert!(images.contains(&odd));
    assert!(images.iter().all(|p| p.exists()));

    let result = sharp_pipeline().process_file(&odd);
    assert!(result.outcome.is_success(), "{:?}", result.outcome.failure_reason());
    assert_eq!(result.identity, odd);
    Ok(())
}
