//! Pyramid generator integration tests.
//!
//! Tests verify:
//! - Directory layout and tile counts per zoom level
//! - Edge tile dimensions (clipped, never padded)
//! - Regeneration and worker-pool equivalence
//! - Failure outcomes

use std::fs;

use cosmic_atlas::tile::{
    create_image_tiles, GeneratorOptions, PyramidGenerator, RasterMode, TilingOutcome,
    MAX_ZOOM_LIMIT, TILE_SIZE,
};
use cosmic_atlas::TilingError;

use super::test_utils::{
    expected_grid, is_valid_jpeg, list_tiles, tile_dimensions, write_jpeg, write_png,
    write_rgba_png,
};

// =============================================================================
// Layout
// =============================================================================

#[tokio::test]
async fn test_small_image_single_tile() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png(dir.path(), "small.png", 200, 256);
    let output = dir.path().join("tiles");

    let outcome = create_image_tiles(&source, &output, 0).await;
    assert!(outcome.success, "error: {:?}", outcome.error);

    let tiles = list_tiles(&output);
    assert_eq!(tiles.len(), 1);
    assert_eq!(
        tiles[&0].iter().cloned().collect::<Vec<_>>(),
        vec!["0_0.jpg".to_string()]
    );
    assert_eq!(tile_dimensions(&output.join("0").join("0_0.jpg")), (200, 256));

    let summary = outcome.tiles.unwrap();
    assert_eq!(summary.max_zoom, 0);
    assert_eq!((summary.tiles_x, summary.tiles_y), (1, 1));
    assert_eq!(summary.tiles_written, 1);
}

#[tokio::test]
async fn test_600x400_two_levels() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png(dir.path(), "wide.png", 600, 400);
    let output = dir.path().join("tiles");

    let summary = PyramidGenerator::new(GeneratorOptions::default().with_max_zoom(1))
        .generate(&source, &output)
        .await
        .unwrap();

    assert_eq!(summary.levels.len(), 2);
    assert_eq!((summary.levels[0].tiles_x, summary.levels[0].tiles_y), (3, 2));
    assert_eq!((summary.levels[1].tiles_x, summary.levels[1].tiles_y), (2, 1));

    // Compatibility fields describe the last level only
    assert_eq!((summary.tiles_x, summary.tiles_y), (2, 1));
    assert_eq!(summary.tiles_written, 8);

    let tiles = list_tiles(&output);
    assert_eq!(tiles[&0].len(), 6);
    assert_eq!(tiles[&1].len(), 2);
    for name in ["0_0.jpg", "0_1.jpg", "1_0.jpg", "1_1.jpg", "2_0.jpg", "2_1.jpg"] {
        assert!(tiles[&0].contains(name), "missing 0/{}", name);
    }
    assert!(tiles[&1].contains("0_0.jpg"));
    assert!(tiles[&1].contains("1_0.jpg"));
}

#[tokio::test]
async fn test_tile_counts_match_grid_formula() {
    let dir = tempfile::tempdir().unwrap();
    let (width, height) = (700, 300);
    let source = write_jpeg(dir.path(), "src.jpg", width, height);
    let output = dir.path().join("tiles");

    let summary = PyramidGenerator::new(
        GeneratorOptions::default()
            .with_max_zoom(4)
            .with_raster_mode(RasterMode::PerLevel),
    )
    .generate(&source, &output)
    .await
    .unwrap();

    let tiles = list_tiles(&output);
    assert_eq!(tiles.len(), 5);

    let mut total = 0u64;
    for zoom in 0..=4 {
        let (tx, ty) = expected_grid(width, height, zoom);
        assert_eq!(
            tiles[&zoom].len() as u32,
            tx * ty,
            "unexpected tile count at zoom {}",
            zoom
        );
        total += (tx * ty) as u64;
    }
    assert_eq!(summary.tiles_written, total);
}

#[tokio::test]
async fn test_edge_tiles_are_clipped() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png(dir.path(), "edge.png", 600, 400);
    let output = dir.path().join("tiles");

    let summary = PyramidGenerator::new(GeneratorOptions::default().with_max_zoom(1))
        .generate(&source, &output)
        .await
        .unwrap();

    for grid in &summary.levels {
        for coord in grid.coords() {
            let path = coord.path_in(&output);
            let expected = (
                TILE_SIZE.min(grid.scaled_width - coord.x * TILE_SIZE),
                TILE_SIZE.min(grid.scaled_height - coord.y * TILE_SIZE),
            );
            assert_eq!(
                tile_dimensions(&path),
                expected,
                "wrong size for {}",
                path.display()
            );
        }
    }

    // Spot-check the corners explicitly
    assert_eq!(tile_dimensions(&output.join("0").join("2_1.jpg")), (88, 144));
    assert_eq!(tile_dimensions(&output.join("1").join("1_0.jpg")), (44, 200));
}

#[tokio::test]
async fn test_tiles_are_jpeg() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_rgba_png(dir.path(), "alpha.png", 300, 100);
    let output = dir.path().join("tiles");

    let outcome = create_image_tiles(&source, &output, 2).await;
    assert!(outcome.success, "error: {:?}", outcome.error);

    let data = fs::read(output.join("0").join("1_0.jpg")).unwrap();
    assert!(is_valid_jpeg(&data));
}

#[tokio::test]
async fn test_output_directory_created_recursively() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png(dir.path(), "src.png", 64, 64);
    let output = dir.path().join("public").join("tiles").join("moon").join("lroc");

    let outcome = create_image_tiles(&source, &output, 1).await;
    assert!(outcome.success);
    assert!(output.join("1").join("0_0.jpg").is_file());
}

// =============================================================================
// Regeneration and Concurrency
// =============================================================================

#[tokio::test]
async fn test_regeneration_produces_same_file_set() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png(dir.path(), "src.png", 520, 300);
    let first = dir.path().join("first");
    let second = dir.path().join("second");

    assert!(create_image_tiles(&source, &first, 2).await.success);
    assert!(create_image_tiles(&source, &second, 2).await.success);

    let first_tiles = list_tiles(&first);
    assert_eq!(first_tiles, list_tiles(&second));

    for (zoom, names) in &first_tiles {
        for name in names {
            let a = first.join(zoom.to_string()).join(name);
            let b = second.join(zoom.to_string()).join(name);
            assert_eq!(tile_dimensions(&a), tile_dimensions(&b));
        }
    }
}

#[tokio::test]
async fn test_regeneration_overwrites_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png(dir.path(), "src.png", 300, 300);
    let output = dir.path().join("tiles");

    fs::create_dir_all(output.join("0")).unwrap();
    fs::write(output.join("0").join("0_0.jpg"), b"stale").unwrap();

    assert!(create_image_tiles(&source, &output, 0).await.success);

    let data = fs::read(output.join("0").join("0_0.jpg")).unwrap();
    assert!(is_valid_jpeg(&data));
}

#[tokio::test]
async fn test_worker_pool_matches_sequential() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png(dir.path(), "src.png", 900, 520);
    let sequential = dir.path().join("sequential");
    let pooled = dir.path().join("pooled");

    let expected = PyramidGenerator::new(GeneratorOptions::default().with_max_zoom(2))
        .generate(&source, &sequential)
        .await
        .unwrap();
    let actual = PyramidGenerator::new(GeneratorOptions::default().with_max_zoom(2).with_workers(4))
        .generate(&source, &pooled)
        .await
        .unwrap();

    assert_eq!(expected, actual);
    assert_eq!(list_tiles(&sequential), list_tiles(&pooled));
}

#[tokio::test]
async fn test_per_level_canvas_matches_per_tile_layout() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png(dir.path(), "src.png", 600, 400);
    let per_tile = dir.path().join("per_tile");
    let per_level = dir.path().join("per_level");

    PyramidGenerator::new(GeneratorOptions::default().with_max_zoom(3))
        .generate(&source, &per_tile)
        .await
        .unwrap();
    PyramidGenerator::new(
        GeneratorOptions::default()
            .with_max_zoom(3)
            .with_raster_mode(RasterMode::PerLevel),
    )
    .generate(&source, &per_level)
    .await
    .unwrap();

    let tiles = list_tiles(&per_tile);
    assert_eq!(tiles, list_tiles(&per_level));
    for (zoom, names) in &tiles {
        for name in names {
            assert_eq!(
                tile_dimensions(&per_tile.join(zoom.to_string()).join(name)),
                tile_dimensions(&per_level.join(zoom.to_string()).join(name))
            );
        }
    }
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_missing_source_reports_failure() {
    let dir = tempfile::tempdir().unwrap();

    let outcome = create_image_tiles(
        &dir.path().join("does-not-exist.jpg"),
        &dir.path().join("tiles"),
        10,
    )
    .await;

    assert!(!outcome.success);
    assert!(outcome.tiles.is_none());
    let message = outcome.error.expect("failure should carry a message");
    assert!(!message.is_empty());
    assert!(message.contains("does-not-exist.jpg"));
}

#[tokio::test]
async fn test_zoom_beyond_pixel_domain_yields_single_pixel_levels() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png(dir.path(), "src.png", 16, 16);
    let output = dir.path().join("tiles");

    let summary = PyramidGenerator::new(GeneratorOptions::default().with_max_zoom(31))
        .generate(&source, &output)
        .await
        .unwrap();

    assert_eq!(summary.levels.len(), 32);
    assert_eq!(summary.tiles_written, 32);
    assert_eq!((summary.tiles_x, summary.tiles_y), (1, 1));
    assert_eq!(tile_dimensions(&output.join("31").join("0_0.jpg")), (1, 1));
    assert_eq!(tile_dimensions(&output.join("4").join("0_0.jpg")), (1, 1));
    assert_eq!(tile_dimensions(&output.join("3").join("0_0.jpg")), (2, 2));
}

#[tokio::test]
async fn test_zoom_out_of_range_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png(dir.path(), "src.png", 16, 16);

    let result = PyramidGenerator::new(
        GeneratorOptions::default().with_max_zoom(MAX_ZOOM_LIMIT + 1),
    )
    .generate(&source, &dir.path().join("tiles"))
    .await;

    assert!(matches!(result, Err(TilingError::ZoomOutOfRange { .. })));
}

#[tokio::test]
async fn test_unwritable_output_reports_failure() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png(dir.path(), "src.png", 16, 16);

    // A regular file where the output directory should be
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"not a directory").unwrap();

    let result = PyramidGenerator::default()
        .generate(&source, &blocker.join("tiles"))
        .await;

    assert!(matches!(result, Err(TilingError::Io { .. })));
}

#[tokio::test]
async fn test_failure_keeps_earlier_tiles() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png(dir.path(), "src.png", 300, 300);
    let output = dir.path().join("tiles");

    // Level 1 directory path is occupied by a file, so level 0 succeeds first
    fs::create_dir_all(&output).unwrap();
    fs::write(output.join("1"), b"in the way").unwrap();

    let outcome = create_image_tiles(&source, &output, 1).await;
    assert!(!outcome.success);
    for name in ["0_0.jpg", "0_1.jpg", "1_0.jpg", "1_1.jpg"] {
        assert!(output.join("0").join(name).is_file(), "missing 0/{}", name);
    }
    assert!(!output.join("1").is_dir());
}

#[tokio::test]
async fn test_failed_tile_stops_before_next_level() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png(dir.path(), "src.png", 300, 300);
    let output = dir.path().join("tiles");

    // The last tile of level 0 cannot be written
    fs::create_dir_all(output.join("0").join("1_1.jpg")).unwrap();

    for raster_mode in [RasterMode::PerTile, RasterMode::PerLevel] {
        let result = PyramidGenerator::new(
            GeneratorOptions::default()
                .with_max_zoom(1)
                .with_raster_mode(raster_mode),
        )
        .generate(&source, &output)
        .await;

        match result {
            Err(TilingError::Io { path, .. }) => {
                assert_eq!(path, output.join("0").join("1_1.jpg"));
            }
            other => panic!("Expected I/O error on 0/1_1.jpg, got {:?}", other),
        }
        assert!(!output.join("1").exists(), "level 1 started in {:?}", raster_mode);
    }
}

#[tokio::test]
async fn test_failed_tile_stops_before_next_level_with_workers() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png(dir.path(), "src.png", 300, 300);
    let output = dir.path().join("tiles");

    fs::create_dir_all(output.join("0").join("0_0.jpg")).unwrap();

    let outcome: TilingOutcome = PyramidGenerator::new(
        GeneratorOptions::default().with_max_zoom(2).with_workers(4),
    )
    .generate(&source, &output)
    .await
    .into();

    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("0_0.jpg"));
    assert!(!output.join("1").exists());
    assert!(!output.join("2").exists());
}
