//! Output integration tests.
//!
//! Tests verify:
//! - Tiles written to disk decode to the expected sizes
//! - The manifest matches the written files byte for byte

use bytes::Bytes;
use image::GenericImageView;
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

use image_tiler::batch::{BatchDriver, BatchJob};
use image_tiler::output::{write_tiles, TileManifest, MANIFEST_FILE_NAME};
use image_tiler::tile::{GridSpec, OutputFormat, TileEngine};

use super::test_utils::{create_test_png, decode, MockImageSource};

#[tokio::test]
async fn test_written_tiles_decode() {
    let dir = tempfile::tempdir().unwrap();
    let spec = GridSpec::new(2, 3).with_format(OutputFormat::WebP).with_prefix("map");

    let tiles = TileEngine::new()
        .partition_bytes(
            "map.png",
            Bytes::from(create_test_png(90, 40)),
            &spec,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let paths = write_tiles(dir.path(), &tiles).await.unwrap();
    assert_eq!(paths.len(), 6);

    for (path, tile) in paths.iter().zip(&tiles) {
        assert_eq!(path.file_name().unwrap().to_str().unwrap(), tile.name);
        let on_disk = std::fs::read(path).unwrap();
        assert_eq!(decode(&on_disk).dimensions(), (30, 20));
    }
}

#[tokio::test]
async fn test_manifest_matches_files() {
    let dir = tempfile::tempdir().unwrap();
    let spec = GridSpec::new(2, 2);

    let tiles = TileEngine::new()
        .partition_bytes(
            "m.png",
            Bytes::from(create_test_png(20, 20)),
            &spec,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    write_tiles(dir.path(), &tiles).await.unwrap();
    let manifest_path = TileManifest::new(&spec, &tiles)
        .write_to(dir.path())
        .await
        .unwrap();
    assert_eq!(manifest_path, dir.path().join(MANIFEST_FILE_NAME));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(manifest_path).unwrap()).unwrap();
    assert_eq!(json["tile_count"], 4);

    for entry in json["tiles"].as_array().unwrap() {
        let name = entry["name"].as_str().unwrap();
        let on_disk = std::fs::read(dir.path().join(name)).unwrap();
        assert_eq!(entry["byte_size"], on_disk.len());
        assert_eq!(entry["sha256"], hex::encode(Sha256::digest(&on_disk)));
    }
}

#[tokio::test]
async fn test_batch_manifest_lists_failures() {
    let dir = tempfile::tempdir().unwrap();
    let source = MockImageSource::new().with_image("ok.png", create_test_png(16, 16));
    let driver = BatchDriver::new(source);
    let job = BatchJob::new(
        vec!["ok.png".to_string(), "gone.png".to_string()],
        GridSpec::default(),
    );

    let report = driver.run(&job, &CancellationToken::new()).await.unwrap();
    let manifest = TileManifest::new(&job.spec, &report.tiles).with_failures(&report.failures);
    manifest.write_to(dir.path()).await.unwrap();

    let json: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join(MANIFEST_FILE_NAME)).unwrap(),
    )
    .unwrap();
    assert_eq!(json["tile_count"], 4);
    assert_eq!(json["failures"][0]["image_id"], "gone.png");
}
