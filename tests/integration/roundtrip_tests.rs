//! Split then combine round trips.
//!
//! Tests verify:
//! - Combining the tiles of a split reproduces the source bytes exactly,
//!   whatever the block size, overlap and tile orientation
//! - Slices can be recombined as a numbered series without a descriptor
//! - TIFF tiles, rescaling and test mode behave end to end

use std::path::PathBuf;

use voxel_split::{
    combine_files, split_files, CombineOptions, DataType, FileFormat, OutputOptions,
    RescaleOption, SliceMode, SplitOptions,
};

use super::test_utils::{header_value, read_raw, sequential_values, write_metaio};

fn split_then_combine(
    size: &[usize],
    data_type: DataType,
    output: OutputOptions,
) -> (Vec<u8>, Vec<u8>, usize) {
    let dir = tempfile::tempdir().unwrap();
    let values = sequential_values(size, data_type);
    let input = write_metaio(dir.path(), "volume", size, data_type, &values);

    let split = split_files(&SplitOptions {
        input: input.clone(),
        output,
        ..Default::default()
    })
    .unwrap();
    let manifest = split.manifest.clone().unwrap();

    let combined = combine_files(&CombineOptions {
        input: input.clone(),
        descriptor: Some(manifest),
        out: Some(dir.path().join("restored")),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(combined.outputs, vec![dir.path().join("restored.mhd")]);

    (read_raw(&input), read_raw(&combined.outputs[0]), split.outputs.len())
}

// =============================================================================
// Byte-exact round trips
// =============================================================================

#[test]
fn test_round_trip_with_overlap() {
    let output = OutputOptions {
        max_block_size: Some(vec![4, 3, 2]),
        overlap: Some(vec![1, 2, 0]),
        ..Default::default()
    };
    let (source, restored, tiles) = split_then_combine(&[10, 7, 5], DataType::Short, output);
    assert_eq!(tiles, 3 * 3 * 3);
    assert_eq!(source, restored);
}

#[test]
fn test_round_trip_reoriented_tiles() {
    let output = OutputOptions {
        max_block_size: Some(vec![3]),
        overlap: Some(vec![1]),
        axis: Some(vec![-3, 1, -2]),
        ..Default::default()
    };
    let (source, restored, _) = split_then_combine(&[6, 5, 4], DataType::Float, output);
    assert_eq!(source, restored);
}

#[test]
fn test_round_trip_two_dimensional() {
    let output = OutputOptions {
        max_block_size: Some(vec![5, 2]),
        overlap: Some(vec![2, 1]),
        axis: Some(vec![2, -1]),
        ..Default::default()
    };
    let (source, restored, tiles) = split_then_combine(&[11, 6], DataType::UChar, output);
    assert_eq!(tiles, 3 * 3);
    assert_eq!(source, restored);
}

#[test]
fn test_reoriented_tile_contents() {
    let dir = tempfile::tempdir().unwrap();
    // 3 x 2 image:  0 1 2
    //               3 4 5
    let values = sequential_values(&[3, 2], DataType::UChar);
    let input = write_metaio(dir.path(), "plane", &[3, 2], DataType::UChar, &values);

    let report = split_files(&SplitOptions {
        input,
        output: OutputOptions {
            axis: Some(vec![2, -1]),
            ..Default::default()
        },
        ..Default::default()
    })
    .unwrap();
    assert_eq!(report.outputs.len(), 1);
    let tile = &report.outputs[0];
    assert_eq!(header_value(tile, "DimSize").as_deref(), Some("2 3"));
    assert_eq!(header_value(tile, "TransformMatrix").as_deref(), Some("0 -1 1 0"));

    // Local dimension 0 walks global dimension 1, local dimension 1 walks
    // global dimension 0 backwards
    assert_eq!(read_raw(tile), vec![2, 5, 1, 4, 0, 3]);
}

// =============================================================================
// Slices
// =============================================================================

#[test]
fn test_axial_slices_recombined_as_series() {
    let dir = tempfile::tempdir().unwrap();
    let size = [4, 3, 5];
    let values = sequential_values(&size, DataType::UShort);
    let input = write_metaio(dir.path(), "volume", &size, DataType::UShort, &values);

    let report = split_files(&SplitOptions {
        input: input.clone(),
        output: OutputOptions {
            slice: Some(SliceMode::Axial),
            ..Default::default()
        },
        ..Default::default()
    })
    .unwrap();
    assert_eq!(report.outputs.len(), 5);
    assert_eq!(
        header_value(&report.outputs[0], "DimSize").as_deref(),
        Some("4 3 1")
    );

    // Read the slices back as a numbered series, without the descriptor
    let combined = combine_files(&CombineOptions {
        input: dir.path().join("volume_split_.mhd"),
        start_index: Some(0),
        out: Some(dir.path().join("stacked")),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(read_raw(&combined.outputs[0]), read_raw(&input));
    assert_eq!(
        header_value(&combined.outputs[0], "DimSize").as_deref(),
        Some("4 3 5")
    );
}

#[test]
fn test_missing_series() {
    let dir = tempfile::tempdir().unwrap();
    let result = combine_files(&CombineOptions {
        input: dir.path().join("nothing_.mhd"),
        start_index: Some(0),
        ..Default::default()
    });
    assert!(result.is_err());
}

// =============================================================================
// TIFF
// =============================================================================

#[test]
fn test_tiff_slices_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let size = [5, 4, 3];
    let values = sequential_values(&size, DataType::UChar);
    let input = write_metaio(dir.path(), "volume", &size, DataType::UChar, &values);

    let split = split_files(&SplitOptions {
        input: input.clone(),
        output: OutputOptions {
            slice: Some(SliceMode::Axial),
            file_format: Some(FileFormat::Tiff),
            ..Default::default()
        },
        ..Default::default()
    })
    .unwrap();
    assert_eq!(split.outputs.len(), 3);
    assert!(split.outputs.iter().all(|p| p.extension().unwrap() == "tiff"));

    let combined = combine_files(&CombineOptions {
        input: input.clone(),
        descriptor: split.manifest,
        out: Some(dir.path().join("restored")),
        file_format: Some(FileFormat::MetaIo),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(read_raw(&combined.outputs[0]), read_raw(&input));
}

#[test]
fn test_tiff_rejects_compression() {
    let dir = tempfile::tempdir().unwrap();
    let values = sequential_values(&[4, 4], DataType::UChar);
    let input = write_metaio(dir.path(), "plane", &[4, 4], DataType::UChar, &values);

    let result = split_files(&SplitOptions {
        input,
        output: OutputOptions {
            file_format: Some(FileFormat::Tiff),
            compression: Some("default".to_string()),
            ..Default::default()
        },
        ..Default::default()
    });
    assert!(matches!(result, Err(voxel_split::SplitError::Format(_))));
}

// =============================================================================
// Rescaling and test mode
// =============================================================================

#[test]
fn test_rescale_to_volume_limits() {
    let dir = tempfile::tempdir().unwrap();
    let size = [8, 8];
    let values: Vec<f64> = (0..64).map(|v| 1000.0 + 10.0 * v as f64).collect();
    let input = write_metaio(dir.path(), "ct", &size, DataType::Short, &values);

    let report = split_files(&SplitOptions {
        input,
        output: OutputOptions {
            max_block_size: Some(vec![4]),
            overlap: Some(vec![1]),
            data_type: Some(DataType::UChar),
            ..Default::default()
        },
        rescale: Some(RescaleOption::VolumeLimits),
        ..Default::default()
    })
    .unwrap();

    let limits = report.limits.unwrap();
    assert_eq!((limits.min, limits.max), (1000.0, 1630.0));

    let mut seen: Vec<u8> = report.outputs.iter().flat_map(|p| read_raw(p)).collect();
    seen.sort_unstable();
    assert_eq!(seen.first(), Some(&0));
    assert_eq!(seen.last(), Some(&255));
    assert_eq!(
        header_value(&report.outputs[0], "ElementType").as_deref(),
        Some("MET_UCHAR")
    );
}

#[test]
fn test_explicit_rescale_clamps() {
    let dir = tempfile::tempdir().unwrap();
    let values = [-50.0, 0.0, 50.0, 100.0, 150.0, 200.0];
    let input = write_metaio(dir.path(), "line", &[6], DataType::Short, &values);

    let report = combine_files(&CombineOptions {
        input,
        data_type: Some(DataType::UChar),
        rescale: Some(RescaleOption::Explicit(voxel_split::Limits::new(0.0, 100.0))),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(report.outputs, vec![dir.path().join("line_combined.mhd")]);
    assert_eq!(read_raw(&report.outputs[0]), vec![0, 0, 128, 255, 255, 255]);
}

#[test]
fn test_test_mode_leaves_directory_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let values = sequential_values(&[6, 6], DataType::UChar);
    let input = write_metaio(dir.path(), "plane", &[6, 6], DataType::UChar, &values);
    let before: Vec<PathBuf> = list(dir.path());

    let report = split_files(&SplitOptions {
        input,
        output: OutputOptions {
            max_block_size: Some(vec![2]),
            ..Default::default()
        },
        test: true,
        ..Default::default()
    })
    .unwrap();
    assert_eq!(report.outputs.len(), 9);
    assert_eq!(list(dir.path()), before);
}

fn list(dir: &std::path::Path) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    entries.sort();
    entries
}
