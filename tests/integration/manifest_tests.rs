//! Descriptor (.gift) file tests.
//!
//! Tests verify:
//! - A split writes a descriptor listing every tile and the source file
//! - Tiles are stored relative to the descriptor and reloaded in index order
//! - Descriptors from other tools, other versions or several sources are
//!   rejected

use serde_json::Value;

use voxel_split::{
    combine_files, load_descriptor, split_files, CombineOptions, DataType, GeometryError,
    OutputOptions, SplitError, SplitOptions,
};

use super::test_utils::{read_raw, sequential_values, write_metaio};

fn split_into_four(dir: &std::path::Path) -> std::path::PathBuf {
    let values = sequential_values(&[6, 4], DataType::Short);
    let input = write_metaio(dir, "plane", &[6, 4], DataType::Short, &values);
    let report = split_files(&SplitOptions {
        input,
        out: Some(dir.join("tiles").join("plane")),
        output: OutputOptions {
            max_block_size: Some(vec![3, 2]),
            overlap: Some(vec![1]),
            ..Default::default()
        },
        ..Default::default()
    })
    .unwrap();
    report.manifest.unwrap()
}

fn rewrite(path: &std::path::Path, edit: impl FnOnce(&mut Value)) {
    let mut json: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    edit(&mut json);
    std::fs::write(path, serde_json::to_string_pretty(&json).unwrap()).unwrap();
}

#[test]
fn test_descriptor_contents() {
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = split_into_four(dir.path());
    assert_eq!(manifest_path, dir.path().join("tiles").join("plane_info.gift"));

    let json: Value =
        serde_json::from_str(&std::fs::read_to_string(&manifest_path).unwrap()).unwrap();
    assert_eq!(json["appname"], "GIFT-Surg split data");
    assert_eq!(json["version"], "1.0");

    let split = json["split_files"].as_array().unwrap();
    assert_eq!(split.len(), 4);
    let first = &split[0];
    assert_eq!(first["index"], 0);
    assert_eq!(first["suffix"], "_0000");
    assert_eq!(first["filename"], "plane_0000.mhd");
    assert_eq!(first["data_type"], "short");
    assert_eq!(first["file_format"], "mhd");
    assert_eq!(first["dim_order"], serde_json::json!([1, 2]));
    assert_eq!(first["ranges"], serde_json::json!([[0, 3, 0, 1], [0, 2, 0, 1]]));

    let source = json["source_files"].as_array().unwrap();
    assert_eq!(source.len(), 1);
    assert_eq!(source[0]["ranges"], serde_json::json!([[0, 5, 0, 0], [0, 3, 0, 0]]));
}

#[test]
fn test_reload_sorted_by_index() {
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = split_into_four(dir.path());
    rewrite(&manifest_path, |json| {
        if let Some(files) = json["split_files"].as_array_mut() {
            files.reverse();
        }
    });

    let manifest = load_descriptor(&manifest_path).unwrap();
    let descriptors = manifest.split_descriptors().unwrap();
    let indices: Vec<usize> = descriptors.iter().map(|d| d.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
    assert_eq!(
        descriptors[3].filename,
        dir.path().join("tiles").join("plane_0003.mhd")
    );
}

#[test]
fn test_combine_from_moved_directory() {
    let dir = tempfile::tempdir().unwrap();
    split_into_four(dir.path());
    let original = read_raw(&dir.path().join("plane.mhd"));

    // Tile names are relative, so the tiles can move with their descriptor
    let moved = dir.path().join("moved");
    std::fs::rename(dir.path().join("tiles"), &moved).unwrap();

    let report = combine_files(&CombineOptions {
        input: moved.join("plane.mhd"),
        descriptor: Some(moved.join("plane_info.gift")),
        out: Some(dir.path().join("restored")),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(read_raw(&report.outputs[0]), original);
}

#[test]
fn test_wrong_appname_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = split_into_four(dir.path());
    rewrite(&manifest_path, |json| json["appname"] = Value::from("something else"));

    let result = combine_files(&CombineOptions {
        input: dir.path().join("plane.mhd"),
        descriptor: Some(manifest_path),
        ..Default::default()
    });
    assert!(matches!(result, Err(SplitError::Format(_))));
}

#[test]
fn test_wrong_version_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = split_into_four(dir.path());
    rewrite(&manifest_path, |json| json["version"] = Value::from("2.0"));
    assert!(matches!(
        load_descriptor(&manifest_path),
        Err(SplitError::Format(_))
    ));
}

#[test]
fn test_several_sources_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = split_into_four(dir.path());
    rewrite(&manifest_path, |json| {
        if let Some(sources) = json["source_files"].as_array_mut() {
            let copy = sources[0].clone();
            sources.push(copy);
        }
    });

    let result = combine_files(&CombineOptions {
        input: dir.path().join("plane.mhd"),
        descriptor: Some(manifest_path),
        ..Default::default()
    });
    assert!(matches!(
        result,
        Err(SplitError::Geometry(GeometryError::SourceCount(2)))
    ));
}

#[test]
fn test_split_from_descriptor_writes_no_new_descriptor() {
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = split_into_four(dir.path());

    // Re-split the tiles into rows, reading them through the descriptor
    let report = split_files(&SplitOptions {
        input: dir.path().join("plane.mhd"),
        out: Some(dir.path().join("rows").join("plane")),
        descriptor: Some(manifest_path),
        output: OutputOptions {
            max_block_size: Some(vec![-1, 1]),
            ..Default::default()
        },
        ..Default::default()
    })
    .unwrap();
    assert_eq!(report.outputs.len(), 4);
    assert!(report.manifest.is_none());

    let original = read_raw(&dir.path().join("plane.mhd"));
    let row_bytes = 6 * 2;
    for (i, row) in report.outputs.iter().enumerate() {
        assert_eq!(read_raw(row), original[i * row_bytes..(i + 1) * row_bytes]);
    }
}
