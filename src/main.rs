//! Image Tiler - split images into grid tiles.
//!
//! This binary parses the command line, sets up logging and runs one of the
//! `split`, `batch` or `plan` commands.

use clap::Parser;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use image_tiler::{
    batch::{BatchDriver, BatchJob},
    config::{BatchConfig, Cli, Command, PlanConfig, SplitConfig},
    output::{format_file_size, write_tiles, TileManifest},
    source::{FsImageSource, ImageSource},
    tile::{plan, probe_dimensions, Tile},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Split(config) => run_split(config, shutdown_token()).await,
        Command::Batch(config) => run_batch(config, shutdown_token()).await,
        Command::Plan(config) => run_plan(config).await,
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "image_tiler=debug"
    } else {
        "image_tiler=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// A token that fires on Ctrl-C.
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping");
            trigger.cancel();
        }
    });

    token
}

// =============================================================================
// Split Command
// =============================================================================

async fn run_split(config: SplitConfig, cancel: CancellationToken) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let spec = config.spec();
    let engine = config.grid.engine();
    let image_id = config.image.display().to_string();

    info!(
        "Splitting {} into a {}x{} grid ({} overlap, {})",
        image_id, spec.rows, spec.cols, spec.overlap_px, spec.format
    );

    let data = match FsImageSource::new().load(&image_id).await {
        Ok(data) => data,
        Err(e) => {
            error!("Failed to read image: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let tiles = match engine
        .partition_bytes(&image_id, data, &spec, &cancel)
        .await
    {
        Ok(tiles) => tiles,
        Err(e) => {
            error!("Failed to split {}: {}", image_id, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = write_tiles(&config.output, &tiles).await {
        error!("Failed to write tiles: {}", e);
        return ExitCode::FAILURE;
    }

    if config.manifest {
        match TileManifest::new(&spec, &tiles).write_to(&config.output).await {
            Ok(path) => info!("  Manifest: {}", path.display()),
            Err(e) => {
                error!("Failed to write manifest: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    log_tiles(&tiles);
    info!(
        "Wrote {} tile(s), {} total, to {}",
        tiles.len(),
        format_file_size(total_bytes(&tiles)),
        config.output.display()
    );

    ExitCode::SUCCESS
}

// =============================================================================
// Batch Command
// =============================================================================

async fn run_batch(config: BatchConfig, cancel: CancellationToken) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let spec = config.spec();
    let job = BatchJob::new(config.image_ids(), spec.clone());
    let driver = BatchDriver::with_engine(FsImageSource::new(), config.grid.engine());

    let report = match driver
        .run_with_progress(&job, &cancel, |progress| {
            let status = if progress.succeeded { "ok" } else { "skipped" };
            info!(
                "[{}/{}] {:>3.0}% {} ({})",
                progress.completed,
                progress.total,
                progress.percent(),
                progress.current,
                status
            );
        })
        .await
    {
        Ok(report) => report,
        Err(e) => {
            error!("Batch aborted: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = write_tiles(&config.output, &report.tiles).await {
        error!("Failed to write tiles: {}", e);
        return ExitCode::FAILURE;
    }

    if config.manifest {
        let manifest = TileManifest::new(&spec, &report.tiles).with_failures(&report.failures);
        match manifest.write_to(&config.output).await {
            Ok(path) => info!("  Manifest: {}", path.display()),
            Err(e) => {
                error!("Failed to write manifest: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    for failure in &report.failures {
        warn!("  Skipped {}: {}", failure.image_id, failure.error);
    }

    info!(
        "Processed {}/{} image(s): {} tile(s), {} total, to {}",
        report.images_succeeded,
        job.len(),
        report.tiles.len(),
        format_file_size(report.total_bytes() as u64),
        config.output.display()
    );

    if report.cancelled {
        warn!("Batch cancelled before all images were processed");
        return ExitCode::FAILURE;
    }

    if report.images_succeeded == 0 {
        error!("No image could be split");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

// =============================================================================
// Plan Command
// =============================================================================

async fn run_plan(config: PlanConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let (width, height) = match (&config.image, config.width, config.height) {
        (Some(path), _, _) => {
            let image_id = path.display().to_string();
            let data = match FsImageSource::new().load(&image_id).await {
                Ok(data) => data,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            match probe_dimensions(&image_id, &data) {
                Ok(dims) => dims,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
        (None, Some(width), Some(height)) => (width, height),
        _ => {
            eprintln!("Error: image size is required");
            return ExitCode::FAILURE;
        }
    };

    let spec = config.spec();
    let rects = match plan(width, height, &spec) {
        Ok(rects) => rects,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let entries: Vec<serde_json::Value> = rects
        .iter()
        .map(|rect| {
            serde_json::json!({
                "name": spec.tile_name(rect.row, rect.col),
                "row": rect.row,
                "col": rect.col,
                "x": rect.x,
                "y": rect.y,
                "width": rect.width,
                "height": rect.height,
            })
        })
        .collect();

    let json = serde_json::json!({
        "width": width,
        "height": height,
        "spec": spec,
        "tiles": entries,
    });

    match serde_json::to_string_pretty(&json) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn log_tiles(tiles: &[Tile]) {
    for tile in tiles {
        info!(
            "  {} {}x{} at ({}, {}) {}",
            tile.name,
            tile.width,
            tile.height,
            tile.x,
            tile.y,
            format_file_size(tile.byte_size() as u64)
        );
    }
}

fn total_bytes(tiles: &[Tile]) -> u64 {
    tiles.iter().map(|tile| tile.byte_size() as u64).sum()
}
