use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use sysinfo::System;
use tracing::{debug, info, warn};

use crate::detection::{ImageOutcome, ImageResult, LeafPipeline};
use crate::error::BatchError;
use crate::models::MeasurementRecord;
use crate::natural_sort::natural_cmp;

/// File extensions picked up when scanning a folder
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

/// Progress notifications for whoever drives a progress bar
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Started { total: usize },
    ImageDone {
        completed: usize,
        total: usize,
        identity: PathBuf,
    },
    Finished,
}

/// Source of the current system memory utilisation
pub trait MemoryProbe: Send + Sync {
    /// Used memory as a percentage of total, 0..=100
    fn used_percent(&self) -> f64;
}

/// Reads memory usage from the operating system
#[derive(Debug, Default)]
pub struct SystemMemory;

impl MemoryProbe for SystemMemory {
    fn used_percent(&self) -> f64 {
        let mut sys = System::new();
        sys.refresh_memory();
        let total = sys.total_memory();
        if total == 0 {
            return 0.0;
        }
        sys.used_memory() as f64 / total as f64 * 100.0
    }
}

/// Fixed reading, for tests and for callers that do their own accounting
#[derive(Debug, Clone, Copy)]
pub struct FixedMemory(pub f64);

impl MemoryProbe for FixedMemory {
    fn used_percent(&self) -> f64 {
        self.0
    }
}

pub fn check_memory(probe: &dyn MemoryProbe, ceiling_percent: f64) -> Result<(), BatchError> {
    let used_percent = probe.used_percent();
    if used_percent > ceiling_percent {
        return Err(BatchError::MemoryCeilingExceeded {
            used_percent,
            ceiling_percent,
        });
    }
    Ok(())
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Image files directly inside `folder`, in natural filename order
pub fn list_images(folder: &Path) -> Result<Vec<PathBuf>, BatchError> {
    if !folder.is_dir() {
        return Err(BatchError::NotADirectory {
            path: folder.to_path_buf(),
        });
    }
    let io_err = |source| BatchError::Io {
        path: folder.to_path_buf(),
        source,
    };

    let mut images = Vec::new();
    let mut entry_count = 0usize;
    for entry in std::fs::read_dir(folder).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        entry_count += 1;
        let path = entry.path();
        if path.is_file() && has_image_extension(&path) {
            images.push(path);
        }
    }

    if images.is_empty() {
        debug!("{} entries in folder, none of them images", entry_count);
        return Err(BatchError::EmptyFolder {
            path: folder.to_path_buf(),
        });
    }

    // Names that are not valid UTF-8 sort by their lossy form; the paths stay untouched
    images.sort_by(|a, b| natural_cmp(&display_name(a), &display_name(b)));
    Ok(images)
}

/// Processed results for one opened folder.
///
/// Results are cached by image path for the lifetime of the session; opening
/// another folder means building a new session.
pub struct BatchSession {
    folder: PathBuf,
    order: Vec<PathBuf>,
    results: HashMap<PathBuf, ImageResult>,
    current: usize,
}

impl BatchSession {
    /// List, check and process every image in `folder` on the rayon pool
    pub fn open(
        folder: &Path,
        pipeline: &LeafPipeline,
        probe: &dyn MemoryProbe,
        progress: Option<&Sender<BatchEvent>>,
    ) -> Result<Self, BatchError> {
        let order = list_images(folder)?;
        check_memory(probe, pipeline.config().memory_ceiling_percent)?;

        let total = order.len();
        info!("Processing {} images from {}", total, folder.display());
        notify(progress, BatchEvent::Started { total });

        let completed = AtomicUsize::new(0);
        let results: HashMap<PathBuf, ImageResult> = order
            .par_iter()
            .map(|path| {
                let result = pipeline.process_file(path);
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                notify(
                    progress,
                    BatchEvent::ImageDone {
                        completed: done,
                        total,
                        identity: path.clone(),
                    },
                );
                (path.clone(), result)
            })
            .collect();

        let degraded = results.values().filter(|r| !r.outcome.is_success()).count();
        if degraded > 0 {
            warn!("{} of {} images could not be fully measured", degraded, total);
        }
        info!("Finished processing {}", folder.display());
        notify(progress, BatchEvent::Finished);

        Ok(Self {
            folder: folder.to_path_buf(),
            order,
            results,
            current: 0,
        })
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Image paths in natural order
    pub fn images(&self) -> &[PathBuf] {
        &self.order
    }

    pub fn get(&self, identity: &Path) -> Option<&ImageResult> {
        self.results.get(identity)
    }

    /// Cached result for `identity`, processing it first if it isn't cached yet
    pub fn get_or_process(&mut self, identity: &Path, pipeline: &LeafPipeline) -> &ImageResult {
        self.results
            .entry(identity.to_path_buf())
            .or_insert_with(|| pipeline.process_file(identity))
    }

    /// Results in natural filename order, independent of completion order
    pub fn results(&self) -> impl Iterator<Item = &ImageResult> {
        self.order.iter().filter_map(|p| self.results.get(p))
    }

    /// `(path, record)` for every image that produced a record, in natural order
    pub fn records(&self) -> impl Iterator<Item = (&Path, &MeasurementRecord)> {
        self.results()
            .filter_map(|r| r.outcome.record().map(|rec| (r.identity.as_path(), rec)))
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&ImageResult> {
        self.order.get(self.current).and_then(|p| self.results.get(p))
    }

    pub fn select(&mut self, index: usize) -> Option<&ImageResult> {
        if index >= self.order.len() {
            return None;
        }
        self.current = index;
        self.current()
    }

    /// Move to the next image, wrapping around at the end
    pub fn next_image(&mut self) -> Option<&ImageResult> {
        if self.order.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.order.len();
        self.current()
    }

    /// Move to the previous image, wrapping around at the start
    pub fn prev_image(&mut self) -> Option<&ImageResult> {
        if self.order.is_empty() {
            return None;
        }
        self.current = (self.current + self.order.len() - 1) % self.order.len();
        self.current()
    }

    /// Text for the leaf area label of the current image
    pub fn leaf_area_label(&self) -> String {
        let area = self
            .current()
            .and_then(|r| r.outcome.record())
            .and_then(|rec| rec.leaf_area_cm2);
        match area {
            Some(value) => format!("Projected Leaf Area: {:.2} cm²", value),
            None => "Projected Leaf Area: Unknown".to_string(),
        }
    }
}

fn notify(progress: Option<&Sender<BatchEvent>>, event: BatchEvent) {
    if let Some(sender) = progress {
        // A dropped receiver only means nobody is watching
        let _ = sender.send(event);
    }
}

/// Owns the pipeline and the session for the folder currently open
pub struct BatchProcessor {
    pipeline: LeafPipeline,
    probe: Box<dyn MemoryProbe>,
    session: Option<BatchSession>,
}

impl BatchProcessor {
    pub fn new(pipeline: LeafPipeline) -> Self {
        Self::with_probe(pipeline, Box::new(SystemMemory))
    }

    pub fn with_probe(pipeline: LeafPipeline, probe: Box<dyn MemoryProbe>) -> Self {
        Self {
            pipeline,
            probe,
            session: None,
        }
    }

    pub fn pipeline(&self) -> &LeafPipeline {
        &self.pipeline
    }

    /// Drop every cached result and process `folder`.
    /// On a batch-level error no session is left behind.
    pub fn open_folder(
        &mut self,
        folder: &Path,
        progress: Option<&Sender<BatchEvent>>,
    ) -> Result<&mut BatchSession, BatchError> {
        self.session = None;
        let session = BatchSession::open(folder, &self.pipeline, self.probe.as_ref(), progress)?;
        Ok(self.session.insert(session))
    }

    pub fn session(&self) -> Option<&BatchSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut BatchSession> {
        self.session.as_mut()
    }
}

/// Count of outcomes by kind: (success, degraded, failed)
pub fn summarize<'a>(results: impl Iterator<Item = &'a ImageResult>) -> (usize, usize, usize) {
    results.fold((0, 0, 0), |(s, d, f), r| match r.outcome {
        ImageOutcome::Success { .. } => (s + 1, d, f),
        ImageOutcome::Degraded { .. } => (s, d + 1, f),
        ImageOutcome::Failed { .. } => (s, d, f + 1),
    })
}
