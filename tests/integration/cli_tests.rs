//! Command-line integration tests.
//!
//! Tests verify that parsed options produce the grid the engine runs with.

use clap::Parser;

use image_tiler::config::{Cli, Command};
use image_tiler::tile::{plan, OutputFormat};

#[test]
fn test_plan_command_geometry() {
    let cli = Cli::try_parse_from([
        "image-tiler",
        "plan",
        "--width",
        "100",
        "--height",
        "100",
        "--grid",
        "3x3",
        "--overlap",
        "5",
    ])
    .unwrap();

    let Command::Plan(config) = cli.command else {
        panic!("Expected plan command");
    };
    assert!(config.validate().is_ok());

    let rects = plan(100, 100, &config.spec()).unwrap();
    assert_eq!(rects.len(), 9);
    assert_eq!((rects[0].x, rects[0].width), (0, 43));
    assert_eq!((rects[4].x, rects[4].width), (28, 43));
    assert_eq!((rects[8].x, rects[8].width), (61, 39));
}

#[test]
fn test_split_command_spec() {
    let cli = Cli::try_parse_from([
        "image-tiler",
        "split",
        "in.png",
        "--rows",
        "4",
        "--cols",
        "2",
        "--format",
        "jpeg",
        "--max-concurrent-encodes",
        "2",
    ])
    .unwrap();

    let Command::Split(config) = cli.command else {
        panic!("Expected split command");
    };
    let spec = config.spec();
    assert_eq!((spec.rows, spec.cols), (4, 2));
    assert_eq!(spec.format, OutputFormat::Jpeg);
    assert_eq!(spec.tile_name(3, 1), "tile_4_2.jpeg");
    assert_eq!(config.grid.engine().max_concurrent_encodes(), 2);
}

#[test]
fn test_plan_image_conflicts_with_size() {
    let result = Cli::try_parse_from([
        "image-tiler",
        "plan",
        "--image",
        "a.png",
        "--width",
        "10",
        "--height",
        "10",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_unknown_format_rejected() {
    let result = Cli::try_parse_from(["image-tiler", "split", "a.png", "--format", "gif"]);
    assert!(result.is_err());
}

#[test]
fn test_grid_rejected_with_default_valued_rows_cols() {
    let result = Cli::try_parse_from([
        "image-tiler",
        "batch",
        "a.png",
        "--rows",
        "2",
        "--cols",
        "2",
        "--grid",
        "3x3",
    ]);
    assert!(result.is_err());
}
