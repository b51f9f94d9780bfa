//! Batch driver integration tests.
//!
//! Tests verify:
//! - Images are processed in queue order with distinct tile prefixes
//! - Missing and corrupt images are skipped and reported
//! - Progress is reported once per image
//! - Invalid grids abort the batch before any image is loaded

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use image_tiler::batch::{BatchDriver, BatchJob, BatchProgress};
use image_tiler::error::{IoError, TileError};
use image_tiler::output::write_tiles;
use image_tiler::source::FsImageSource;
use image_tiler::tile::{GridSpec, OutputFormat, TileEngine};

use super::test_utils::{create_test_jpeg, create_test_png, MockImageSource};

fn job(images: &[&str], spec: GridSpec) -> BatchJob {
    BatchJob::new(images.iter().map(|s| s.to_string()).collect(), spec)
}

// =============================================================================
// Successful Batches
// =============================================================================

#[tokio::test]
async fn test_batch_tiles_every_image_in_order() {
    let source = MockImageSource::new()
        .with_image("shots/beach.png", create_test_png(40, 40))
        .with_image("shots/forest.jpg", create_test_jpeg(60, 30));
    let driver = BatchDriver::with_engine(source, TileEngine::with_concurrency(2));

    let report = driver
        .run(
            &job(&["shots/beach.png", "shots/forest.jpg"], GridSpec::new(1, 2)),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(report.is_complete_success());
    assert_eq!(report.images_processed, 2);
    assert_eq!(report.images_succeeded, 2);

    let names: Vec<&str> = report.tiles.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["beach_1_1.png", "beach_1_2.png", "forest_1_1.png", "forest_1_2.png"]
    );
    assert_eq!((report.tiles[2].width, report.tiles[2].height), (30, 30));
}

#[tokio::test]
async fn test_batch_repeated_stems_get_unique_prefixes() {
    let png = create_test_png(20, 20);
    let source = MockImageSource::new()
        .with_image("a/scan.png", png.clone())
        .with_image("b/scan.png", png.clone())
        .with_image("c/scan.v2.png", png);
    let driver = BatchDriver::new(source);

    let report = driver
        .run(
            &job(
                &["a/scan.png", "b/scan.png", "c/scan.v2.png"],
                GridSpec::new(1, 1).with_format(OutputFormat::Jpeg),
            ),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let names: Vec<&str> = report.tiles.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["scan_1_1.jpeg", "scan-2_1_1.jpeg", "scan-3_1_1.jpeg"]
    );
}

#[tokio::test]
async fn test_batch_generated_prefix_never_reused() {
    let png = create_test_png(12, 12);
    let source = MockImageSource::new()
        .with_image("a.png", png.clone())
        .with_image("a.jpg", png.clone())
        .with_image("a-2.png", png);
    let driver = BatchDriver::new(source);

    let report = driver
        .run(
            &job(&["a.png", "a.jpg", "a-2.png"], GridSpec::new(1, 1)),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let names: Vec<&str> = report.tiles.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["a_1_1.png", "a-2_1_1.png", "a-2-2_1_1.png"]);

    let dir = tempfile::tempdir().unwrap();
    let paths = write_tiles(dir.path(), &report.tiles).await.unwrap();
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), paths.len());
}

// =============================================================================
// Per-Image Failures
// =============================================================================

#[tokio::test]
async fn test_batch_skips_missing_and_corrupt_images() {
    let source = MockImageSource::new()
        .with_image("good.png", create_test_png(30, 30))
        .with_image("corrupt.png", b"definitely not a png".to_vec())
        .with_image("last.png", create_test_png(30, 30));
    let driver = BatchDriver::new(source);

    let report = driver
        .run(
            &job(
                &["good.png", "missing.png", "corrupt.png", "last.png"],
                GridSpec::default(),
            ),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(!report.is_complete_success());
    assert!(!report.cancelled);
    assert_eq!(report.images_processed, 4);
    assert_eq!(report.images_succeeded, 2);
    assert_eq!(report.tiles.len(), 8);

    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures[0].image_id, "missing.png");
    assert!(matches!(
        report.failures[0].error,
        TileError::Io(IoError::NotFound(_))
    ));
    assert_eq!(report.failures[1].image_id, "corrupt.png");
    assert!(matches!(
        report.failures[1].error,
        TileError::ImageDecodeFailure { .. }
    ));
}

#[tokio::test]
async fn test_batch_skips_image_that_fails_to_encode() {
    // Wider than the JPEG encoder's 65535px limit
    let source = MockImageSource::new()
        .with_image("before.png", create_test_png(16, 16))
        .with_image("panorama.png", create_test_png(70_000, 2))
        .with_image("after.png", create_test_png(16, 16));
    let driver = BatchDriver::new(source);

    let mut updates: Vec<BatchProgress> = Vec::new();
    let report = driver
        .run_with_progress(
            &job(
                &["before.png", "panorama.png", "after.png"],
                GridSpec::new(1, 1).with_format(OutputFormat::Jpeg),
            ),
            &CancellationToken::new(),
            |progress| updates.push(progress.clone()),
        )
        .await
        .unwrap();

    let names: Vec<&str> = report.tiles.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["before_1_1.jpeg", "after_1_1.jpeg"]);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].image_id, "panorama.png");
    assert!(matches!(
        report.failures[0].error,
        TileError::EncodeFailure {
            row: 0,
            col: 0,
            format: OutputFormat::Jpeg,
            ..
        }
    ));

    assert_eq!(
        updates.iter().map(|p| p.succeeded).collect::<Vec<_>>(),
        vec![true, false, true]
    );
}

#[tokio::test]
async fn test_batch_image_smaller_than_grid_is_skipped() {
    let source = MockImageSource::new()
        .with_image("tiny.png", create_test_png(2, 2))
        .with_image("big.png", create_test_png(30, 30));
    let driver = BatchDriver::new(source);

    let report = driver
        .run(
            &job(&["tiny.png", "big.png"], GridSpec::new(3, 3)),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.images_succeeded, 1);
    assert_eq!(report.tiles.len(), 9);
    assert!(matches!(
        report.failures[0].error,
        TileError::InvalidSpec { .. }
    ));
}

// =============================================================================
// Progress and Cancellation
// =============================================================================

#[tokio::test]
async fn test_batch_reports_progress_per_image() {
    let source = MockImageSource::new()
        .with_image("one.png", create_test_png(10, 10))
        .with_image("three.png", create_test_png(10, 10));
    let driver = BatchDriver::new(source);

    let mut updates: Vec<BatchProgress> = Vec::new();
    driver
        .run_with_progress(
            &job(&["one.png", "two.png", "three.png"], GridSpec::default()),
            &CancellationToken::new(),
            |progress| updates.push(progress.clone()),
        )
        .await
        .unwrap();

    assert_eq!(updates.len(), 3);
    assert_eq!(
        updates.iter().map(|p| p.completed).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(
        updates.iter().map(|p| p.succeeded).collect::<Vec<_>>(),
        vec![true, false, true]
    );
    assert_eq!(updates[1].current, "two.png");
    assert!((updates[2].fraction() - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_batch_invalid_spec_aborts_before_loading() {
    let source = Arc::new(MockImageSource::new().with_image("a.png", create_test_png(10, 10)));
    let driver = BatchDriver::with_shared_source(Arc::clone(&source), TileEngine::new());

    let result = driver
        .run(&job(&["a.png"], GridSpec::new(2, 0)), &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(TileError::InvalidSpec { .. })));
    assert!(source.loads().await.is_empty());
}

#[tokio::test]
async fn test_batch_cancelled_before_start() {
    let source = Arc::new(MockImageSource::new().with_image("a.png", create_test_png(10, 10)));
    let driver = BatchDriver::with_shared_source(Arc::clone(&source), TileEngine::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = driver
        .run(&job(&["a.png", "a.png"], GridSpec::default()), &cancel)
        .await
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.images_processed, 0);
    assert!(report.tiles.is_empty());
    assert!(source.loads().await.is_empty());
}

// =============================================================================
// Filesystem Source
// =============================================================================

#[tokio::test]
async fn test_batch_from_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("left.png"), create_test_png(24, 12)).unwrap();
    std::fs::write(dir.path().join("right.jpg"), create_test_jpeg(24, 12)).unwrap();

    let driver = BatchDriver::new(FsImageSource::with_root(dir.path()));
    let report = driver
        .run(
            &job(&["left.png", "right.jpg", "absent.png"], GridSpec::new(1, 2)),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.images_succeeded, 2);
    assert_eq!(report.tiles.len(), 4);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].image_id, "absent.png");
}
