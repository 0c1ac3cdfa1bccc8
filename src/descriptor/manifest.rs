//! Descriptor files written alongside a split.
//!
//! The manifest records every output tile and the source file it came from,
//! so a later `combine` can rebuild the volume without re-planning:
//!
//! ```json
//! {
//!   "appname": "GIFT-Surg split data",
//!   "version": "1.0",
//!   "split_files": [ { "index": 0, "suffix": "_0000", "ranges": [...], ... } ],
//!   "source_files": [ { "index": 0, "suffix": "", ... } ]
//! }
//! ```
//!
//! Filenames inside the manifest's own directory are stored relative to it
//! and resolved against it on load, so a split can be moved as a whole.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FormatError, GeometryError, IoError, Result};
use crate::format::FileFormat;
use crate::geometry::Axis;
use crate::plan::BlockRange;
use crate::volume::DataType;

use super::{GlobalDescriptor, SubImageDescriptor, SubImageRanges};

pub const MANIFEST_APPNAME: &str = "GIFT-Surg split data";
pub const MANIFEST_VERSION: &str = "1.0";

const MANIFEST_SUFFIX: &str = "_info.gift";

/// Serialized form of one [`SubImageDescriptor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubImageRecord {
    pub index: usize,
    pub suffix: String,
    pub filename: String,
    pub data_type: DataType,
    pub file_format: FileFormat,
    #[serde(default)]
    pub template: Value,
    /// Condensed axis
    pub dim_order: Vec<i32>,
    #[serde(default)]
    pub compression: Option<String>,
    pub msb: bool,
    #[serde(default)]
    pub voxel_size: Vec<f64>,
    pub ranges: Vec<BlockRange>,
}

impl SubImageRecord {
    fn from_descriptor(descriptor: &SubImageDescriptor, base_dir: &Path) -> Self {
        Self {
            index: descriptor.index,
            suffix: descriptor.suffix.clone(),
            filename: relative_name(&descriptor.filename, base_dir),
            data_type: descriptor.data_type,
            file_format: descriptor.file_format,
            template: descriptor.template.clone(),
            dim_order: descriptor.axis.to_condensed(),
            compression: descriptor.compression.clone(),
            msb: descriptor.msb,
            voxel_size: descriptor.voxel_size.clone(),
            ranges: descriptor.ranges.ranges().to_vec(),
        }
    }

    fn to_descriptor(&self, base_dir: &Path) -> Result<SubImageDescriptor> {
        let ranges = SubImageRanges::new(self.ranges.clone())?;
        let axis = Axis::from_condensed(&self.dim_order)?;
        if axis.num_dims() != ranges.num_dims() {
            return Err(GeometryError::DimensionMismatch {
                expected: ranges.num_dims(),
                actual: axis.num_dims(),
            }
            .into());
        }
        Ok(SubImageDescriptor {
            filename: base_dir.join(&self.filename),
            file_format: self.file_format,
            data_type: self.data_type,
            template: self.template.clone(),
            ranges,
            axis,
            suffix: self.suffix.clone(),
            index: self.index,
            msb: self.msb,
            compression: self.compression.clone(),
            voxel_size: self.voxel_size.clone(),
        })
    }
}

/// Contents of a `_info.gift` descriptor file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub appname: String,
    pub version: String,
    pub split_files: Vec<SubImageRecord>,
    pub source_files: Vec<SubImageRecord>,

    /// Directory the manifest was loaded from
    #[serde(skip)]
    base_dir: PathBuf,
}

impl Manifest {
    /// Build a manifest for `outputs` split from `inputs`, to be stored in
    /// `base_dir`.
    pub fn new(
        inputs: &[SubImageDescriptor],
        outputs: &[SubImageDescriptor],
        base_dir: &Path,
    ) -> Self {
        Self {
            appname: MANIFEST_APPNAME.to_string(),
            version: MANIFEST_VERSION.to_string(),
            split_files: outputs
                .iter()
                .map(|d| SubImageRecord::from_descriptor(d, base_dir))
                .collect(),
            source_files: inputs
                .iter()
                .map(|d| SubImageRecord::from_descriptor(d, base_dir))
                .collect(),
            base_dir: base_dir.to_path_buf(),
        }
    }

    /// Parse and validate a manifest.
    pub fn from_json(json: &str, base_dir: &Path) -> Result<Self> {
        let mut manifest: Manifest = serde_json::from_str(json).map_err(FormatError::from)?;
        if manifest.appname != MANIFEST_APPNAME {
            return Err(FormatError::InvalidManifest(format!(
                "not a {MANIFEST_APPNAME} file (appname {:?})",
                manifest.appname
            ))
            .into());
        }
        if manifest.version != MANIFEST_VERSION {
            return Err(FormatError::InvalidManifest(format!(
                "cannot read version {:?}",
                manifest.version
            ))
            .into());
        }
        manifest.base_dir = base_dir.to_path_buf();
        Ok(manifest)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self).map_err(FormatError::from)?)
    }

    /// Tile descriptors of the split files, ordered by index.
    pub fn split_descriptors(&self) -> Result<Vec<SubImageDescriptor>> {
        let mut records: Vec<&SubImageRecord> = self.split_files.iter().collect();
        records.sort_by_key(|r| r.index);
        records
            .into_iter()
            .map(|r| r.to_descriptor(&self.base_dir))
            .collect()
    }

    /// The volume the split was made from, and its header template.
    ///
    /// Only manifests with exactly one source file are supported.
    pub fn global_descriptor(&self) -> Result<(GlobalDescriptor, Value)> {
        let [source] = self.source_files.as_slice() else {
            return Err(GeometryError::SourceCount(self.source_files.len()).into());
        };
        let descriptor = source.to_descriptor(&self.base_dir)?;
        let size = descriptor
            .ranges
            .image_size()
            .iter()
            .map(|&s| s as usize)
            .collect();
        let global = GlobalDescriptor {
            size,
            axis: descriptor.axis,
            data_type: descriptor.data_type,
            msb: descriptor.msb,
            voxel_size: descriptor.voxel_size,
            file_format: descriptor.file_format,
        };
        Ok((global, descriptor.template))
    }
}

/// Path of the manifest for an output base name.
pub fn manifest_filename(filename_base: &Path) -> PathBuf {
    let mut name = filename_base.as_os_str().to_os_string();
    name.push(MANIFEST_SUFFIX);
    PathBuf::from(name)
}

/// Write the manifest for a split next to its output files.
pub fn write_descriptor_file(
    inputs: &[SubImageDescriptor],
    outputs: &[SubImageDescriptor],
    filename_base: &Path,
) -> Result<PathBuf> {
    let path = manifest_filename(filename_base);
    let base_dir = path.parent().unwrap_or(Path::new("")).to_path_buf();
    let json = Manifest::new(inputs, outputs, &base_dir).to_json()?;
    if !base_dir.as_os_str().is_empty() {
        std::fs::create_dir_all(&base_dir).map_err(|e| IoError::file(&base_dir, e))?;
    }
    std::fs::write(&path, json).map_err(|e| IoError::file(&path, e))?;
    Ok(path)
}

/// Read and validate a manifest from disk.
pub fn load_descriptor(path: &Path) -> Result<Manifest> {
    let json = std::fs::read_to_string(path).map_err(|e| IoError::file(path, e))?;
    let base_dir = path.parent().unwrap_or(Path::new(""));
    Manifest::from_json(&json, base_dir)
}

/// Name of `path` relative to `base_dir` when it lies inside it.
fn relative_name(path: &Path, base_dir: &Path) -> String {
    let relative = if base_dir.as_os_str().is_empty() {
        Some(path)
    } else {
        path.strip_prefix(base_dir).ok()
    };
    match relative {
        Some(relative) => relative.to_string_lossy().into_owned(),
        None => std::path::absolute(path)
            .unwrap_or_else(|_| path.to_path_buf())
            .to_string_lossy()
            .into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(filename: &str, index: usize, ranges: Vec<BlockRange>) -> SubImageDescriptor {
        SubImageDescriptor {
            filename: PathBuf::from(filename),
            file_format: FileFormat::MetaIo,
            data_type: DataType::UShort,
            template: serde_json::json!({"Comment": "scan"}),
            ranges: SubImageRanges::new(ranges).unwrap(),
            axis: Axis::from_condensed(&[1, -2]).unwrap(),
            suffix: crate::plan::tile_suffix(index),
            index,
            msb: false,
            compression: None,
            voxel_size: vec![0.5, 2.0],
        }
    }

    #[test]
    fn test_round_trip_sorted_by_index() {
        let source = descriptor("data/input.mhd", 0, vec![[0, 9, 0, 0], [0, 5, 0, 0]]);
        let tiles = vec![
            descriptor("data/out_0001.mhd", 1, vec![[4, 9, 1, 0], [0, 5, 0, 0]]),
            descriptor("data/out_0000.mhd", 0, vec![[0, 5, 0, 1], [0, 5, 0, 0]]),
        ];
        let manifest = Manifest::new(&[source], &tiles, Path::new("data"));
        assert_eq!(manifest.split_files[0].filename, "out_0001.mhd");
        assert_eq!(manifest.split_files[0].dim_order, vec![1, -2]);

        let json = manifest.to_json().unwrap();
        let loaded = Manifest::from_json(&json, Path::new("data")).unwrap();
        let split = loaded.split_descriptors().unwrap();
        assert_eq!(split[0].index, 0);
        assert_eq!(split[0].filename, PathBuf::from("data/out_0000.mhd"));
        assert_eq!(split[1], tiles[0]);

        let (global, template) = loaded.global_descriptor().unwrap();
        assert_eq!(global.size, vec![10, 6]);
        assert_eq!(global.axis.to_condensed(), vec![1, -2]);
        assert_eq!(global.voxel_size, vec![0.5, 2.0]);
        assert_eq!(template["Comment"], "scan");
    }

    #[test]
    fn test_wrong_appname_rejected() {
        let json = r#"{"appname": "other", "version": "1.0", "split_files": [], "source_files": []}"#;
        assert!(matches!(
            Manifest::from_json(json, Path::new("")),
            Err(crate::error::SplitError::Format(FormatError::InvalidManifest(_)))
        ));
    }

    #[test]
    fn test_wrong_version_rejected() {
        let json = r#"{"appname": "GIFT-Surg split data", "version": "2.0",
                       "split_files": [], "source_files": []}"#;
        assert!(Manifest::from_json(json, Path::new("")).is_err());
    }

    #[test]
    fn test_source_count_checked() {
        let json = r#"{"appname": "GIFT-Surg split data", "version": "1.0",
                       "split_files": [], "source_files": []}"#;
        let manifest = Manifest::from_json(json, Path::new("")).unwrap();
        assert!(matches!(
            manifest.global_descriptor(),
            Err(crate::error::SplitError::Geometry(GeometryError::SourceCount(0)))
        ));
    }

    #[test]
    fn test_optional_fields_default() {
        let json = r#"{"appname": "GIFT-Surg split data", "version": "1.0",
            "split_files": [{"index": 0, "suffix": "_0000", "filename": "a.mhd",
                "data_type": "short", "file_format": "mhd", "dim_order": [1, 2, 3],
                "msb": false, "ranges": [[0, 9, 0, 0], [0, 9, 0, 0], [0, 4, 0, 0]]}],
            "source_files": []}"#;
        let manifest = Manifest::from_json(json, Path::new("tiles")).unwrap();
        let split = manifest.split_descriptors().unwrap();
        assert_eq!(split[0].compression, None);
        assert!(split[0].voxel_size.is_empty());
        assert_eq!(split[0].local_voxel_size(), vec![1.0, 1.0, 1.0]);
        assert_eq!(split[0].filename, PathBuf::from("tiles/a.mhd"));
    }

    #[test]
    fn test_manifest_filename() {
        assert_eq!(
            manifest_filename(Path::new("out/brain_split")),
            PathBuf::from("out/brain_split_info.gift")
        );
    }
}
