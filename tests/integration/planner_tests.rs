//! Partition planning through the public API.
//!
//! Tests verify:
//! - Tile counts and halos for a three dimensional split
//! - Output descriptors name, orient and size each tile

use std::path::PathBuf;

use voxel_split::{
    generate_output_descriptors, image_block_ranges, Axis, DataType, FileFormat,
    GlobalDescriptor, OutputParameters,
};

fn global(size: &[usize]) -> GlobalDescriptor {
    GlobalDescriptor {
        size: size.to_vec(),
        axis: Axis::identity(size.len()),
        data_type: DataType::Short,
        msb: false,
        voxel_size: vec![0.5; size.len()],
        file_format: FileFormat::MetaIo,
    }
}

fn params(max: &[i64], overlap: &[i64], axis: &[i32]) -> OutputParameters {
    OutputParameters {
        filename_base: PathBuf::from("out/volume_split"),
        max_block_size: max.to_vec(),
        overlap: overlap.to_vec(),
        axis: axis.to_vec(),
        data_type: DataType::UShort,
        file_format: FileFormat::MetaIo,
        compression: None,
        always_suffix: true,
    }
}

// =============================================================================
// Block ranges
// =============================================================================

#[test]
fn test_cube_split_into_eight() {
    let tiles = image_block_ranges(&[100, 100, 100], &[60, 60, 60], &[5, 5, 5]).unwrap();
    assert_eq!(tiles.len(), 8);

    // Outer faces carry no halo
    let first = &tiles[0];
    assert!(first.ranges.iter().all(|r| r[0] == 0 && r[2] == 0));
    let last = &tiles[7];
    assert!(last.ranges.iter().all(|r| r[1] == 99 && r[3] == 0));

    // Neighbours along the last dimension share 10 physical voxels
    let low = tiles[0].ranges[2];
    let high = tiles[1].ranges[2];
    assert_eq!(low[1] - high[0] + 1, 10);
}

#[test]
fn test_unsplit_dimensions() {
    let tiles = image_block_ranges(&[30, 20], &[0, 7], &[0, 0]).unwrap();
    assert_eq!(tiles.len(), 3);
    for tile in &tiles {
        assert_eq!(tile.ranges[0], [0, 29, 0, 0]);
    }
}

// =============================================================================
// Output descriptors
// =============================================================================

#[test]
fn test_descriptor_names_follow_index() {
    let descriptors =
        generate_output_descriptors(&params(&[5], &[1], &[1, 2]), &global(&[10, 10]), &serde_json::Value::Null)
            .unwrap();
    assert_eq!(descriptors.len(), 4);

    let names: Vec<PathBuf> = descriptors.iter().map(|d| d.filename.clone()).collect();
    assert_eq!(
        names,
        vec![
            PathBuf::from("out/volume_split_0000.mhd"),
            PathBuf::from("out/volume_split_0001.mhd"),
            PathBuf::from("out/volume_split_0002.mhd"),
            PathBuf::from("out/volume_split_0003.mhd"),
        ]
    );
    for (i, d) in descriptors.iter().enumerate() {
        assert_eq!(d.index, i);
        assert_eq!(d.data_type, DataType::UShort);
        assert_eq!(d.voxel_size, vec![0.5, 0.5]);
    }
}

#[test]
fn test_descriptor_local_geometry() {
    // A [2, -1] tile stores global dimension 2 first and flips global
    // dimension 1
    let descriptors = generate_output_descriptors(
        &params(&[4, -1], &[0, 0], &[2, -1]),
        &global(&[8, 3]),
        &serde_json::Value::Null,
    )
    .unwrap();
    assert_eq!(descriptors.len(), 2);
    let second = &descriptors[1];
    assert_eq!(second.ranges.origin_start(), vec![4, 0]);
    assert_eq!(second.local_size(), vec![3, 4]);
    assert_eq!(second.axis.to_condensed(), vec![2, -1]);
}

#[test]
fn test_parameter_length_checked() {
    let result = generate_output_descriptors(
        &params(&[4, 4], &[0], &[1, 2, 3]),
        &global(&[8, 8, 8]),
        &serde_json::Value::Null,
    );
    assert!(result.is_err());
}
