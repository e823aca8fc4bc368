use clap::Parser;
use std::path::PathBuf;
use std::sync::mpsc;
use tracing::{error, info};

use phenosnap::detection::ImageOutcome;
use phenosnap::pipeline::{BatchEvent, BatchProcessor, summarize};
use phenosnap::{LeafPipeline, PipelineConfig, export, logger};

#[derive(Parser)]
#[command(name = "phenosnap")]
#[command(about = "Measure leaf area against a blue calibration card")]
struct Cli {
    /// Folder containing the leaf photographs
    #[arg(value_name = "FOLDER")]
    folder: PathBuf,

    /// JSON file with pipeline parameters
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Save annotated images to this directory
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Write measurements to this CSV file
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,

    /// Save intermediate stages to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    logger::init(args.verbose);

    let config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };

    let mut pipeline = LeafPipeline::new(config)?;
    if let Some(debug_dir) = args.debug_out {
        pipeline = pipeline.with_debug(debug_dir)?;
    }

    let (sender, receiver) = mpsc::channel();
    let progress = std::thread::spawn(move || {
        for event in receiver {
            if let BatchEvent::ImageDone {
                completed, total, ..
            } = event
            {
                info!("Processed {}/{}", completed, total);
            }
        }
    });

    let mut processor = BatchProcessor::new(pipeline);
    let opened = processor.open_folder(&args.folder, Some(&sender));
    drop(sender);
    let _ = progress.join();

    let session = opened.inspect_err(|e| error!("Batch aborted: {}", e))?;

    for result in session.results() {
        let name = result
            .identity
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        match &result.outcome {
            ImageOutcome::Success { record, .. } => println!(
                "{}: leaf {:.2} cm², hull {:.2} cm² ({} green / {} blue px)",
                name,
                record.leaf_area_or_zero(),
                record.convex_hull_or_zero(),
                record.green_pixel_count,
                record.blue_pixel_count
            ),
            ImageOutcome::Degraded { reason, .. } => println!("{}: not measured ({})", name, reason),
            ImageOutcome::Failed { reason } => println!("{}: failed ({})", name, reason),
        }
    }

    let (ok, degraded, failed) = summarize(session.results());
    println!("\n{} measured, {} degraded, {} failed", ok, degraded, failed);

    if let Some(dir) = &args.output_dir {
        let rasters = session
            .results()
            .filter_map(|r| r.outcome.raster().map(|raster| (r.identity.as_path(), raster)));
        let saved = export::save_rasters(rasters, dir)?;
        println!("Saved {} images to {}", saved.len(), dir.display());
    }

    if let Some(csv_path) = &args.csv {
        export::save_csv(csv_path, session.records())?;
        println!("Wrote {}", csv_path.display());
    }

    Ok(())
}
