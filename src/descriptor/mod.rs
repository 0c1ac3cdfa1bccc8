//! Descriptors of tiles, whole volumes and individual files.
//!
//! A [`SubImageDescriptor`] says where one tile's file lives and which part
//! of the global volume it covers. Descriptors come from the partition
//! planner when splitting, from a manifest when combining a previous split,
//! or from file headers when the input is a plain file or numbered series.

mod discovery;
mod manifest;

use std::path::PathBuf;

use serde_json::Value;

use crate::error::{GeometryError, Result};
use crate::format::FileFormat;
use crate::geometry::{Axis, Region};
use crate::plan::{self, BlockRange};
use crate::volume::{ByteOrder, DataType};

pub use discovery::{find_series_width, generate_input_descriptors, InputSet};
pub use manifest::{
    load_descriptor, manifest_filename, write_descriptor_file, Manifest, SubImageRecord,
    MANIFEST_APPNAME, MANIFEST_VERSION,
};

// =============================================================================
// SubImageRanges
// =============================================================================

/// Derived view of a tile's `[min, max, start_halo, end_halo]` ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubImageRanges {
    ranges: Vec<BlockRange>,
}

impl SubImageRanges {
    /// Validate `min <= min + start_halo <= max - end_halo <= max` and
    /// non-negative halos in every dimension.
    pub fn new(ranges: Vec<BlockRange>) -> Result<Self, GeometryError> {
        for (dimension, r) in ranges.iter().enumerate() {
            let [min, max, start_halo, end_halo] = *r;
            let valid = start_halo >= 0
                && end_halo >= 0
                && min <= min + start_halo
                && min + start_halo <= max - end_halo
                && max - end_halo <= max;
            if !valid {
                return Err(GeometryError::InvalidRange {
                    dimension,
                    range: *r,
                });
            }
        }
        Ok(Self { ranges })
    }

    /// Ranges covering a whole image with no halo.
    pub fn full(size: &[usize]) -> Self {
        Self {
            ranges: size.iter().map(|&s| [0, s as i64 - 1, 0, 0]).collect(),
        }
    }

    pub fn ranges(&self) -> &[BlockRange] {
        &self.ranges
    }

    pub fn num_dims(&self) -> usize {
        self.ranges.len()
    }

    /// Global coordinate of the physical minimum corner.
    pub fn origin_start(&self) -> Vec<i64> {
        self.ranges.iter().map(|r| r[0]).collect()
    }

    /// Physical extent including halo.
    pub fn image_size(&self) -> Vec<i64> {
        self.ranges.iter().map(|r| r[1] - r[0] + 1).collect()
    }

    pub fn roi_start(&self) -> Vec<i64> {
        self.ranges.iter().map(|r| r[0] + r[2]).collect()
    }

    pub fn roi_size(&self) -> Vec<i64> {
        self.ranges
            .iter()
            .map(|r| (r[1] - r[3]) - (r[0] + r[2]) + 1)
            .collect()
    }

    /// The authoritative region of this tile.
    pub fn roi(&self) -> Region {
        Region::new(self.roi_start(), self.roi_size())
    }

    /// The physical region of this tile, halo included.
    pub fn extent(&self) -> Region {
        Region::new(self.origin_start(), self.image_size())
    }
}

// =============================================================================
// SubImageDescriptor
// =============================================================================

/// One physical file forming part of a larger volume.
#[derive(Debug, Clone, PartialEq)]
pub struct SubImageDescriptor {
    pub filename: PathBuf,
    pub file_format: FileFormat,
    pub data_type: DataType,

    /// Header of the source image, carried through unchanged
    pub template: Value,

    pub ranges: SubImageRanges,

    /// Orientation of the file's dimensions relative to the global volume
    pub axis: Axis,

    pub suffix: String,

    /// Position in the canonical ordering of tiles
    pub index: usize,

    pub msb: bool,
    pub compression: Option<String>,

    /// Voxel spacing in global order
    pub voxel_size: Vec<f64>,
}

impl SubImageDescriptor {
    pub fn num_dims(&self) -> usize {
        self.ranges.num_dims()
    }

    pub fn byte_order(&self) -> ByteOrder {
        ByteOrder::from_msb(self.msb)
    }

    /// File extent in local order.
    pub fn local_size(&self) -> Vec<usize> {
        let size: Vec<usize> = self
            .ranges
            .image_size()
            .iter()
            .map(|&s| s.max(0) as usize)
            .collect();
        self.axis.to_local_order(&size)
    }

    /// Global origin of the file in local order.
    pub fn local_origin(&self) -> Vec<i64> {
        self.axis.to_local_order(&self.ranges.origin_start())
    }

    /// Voxel spacing in local order. Missing spacing defaults to 1.
    pub fn local_voxel_size(&self) -> Vec<f64> {
        if self.voxel_size.len() == self.num_dims() {
            self.axis.to_local_order(&self.voxel_size)
        } else {
            vec![1.0; self.num_dims()]
        }
    }
}

// =============================================================================
// GlobalDescriptor
// =============================================================================

/// The whole logical volume.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalDescriptor {
    /// Size in global order, every entry positive
    pub size: Vec<usize>,

    /// Orientation of the source files
    pub axis: Axis,

    pub data_type: DataType,
    pub msb: bool,

    /// Voxel spacing in global order
    pub voxel_size: Vec<f64>,

    pub file_format: FileFormat,
}

impl GlobalDescriptor {
    pub fn num_dims(&self) -> usize {
        self.size.len()
    }
}

// =============================================================================
// FileDescriptor
// =============================================================================

/// What the core needs to know about one file, as reported by its header.
#[derive(Debug, Clone, PartialEq)]
pub struct FileDescriptor {
    pub file_format: FileFormat,
    pub axis: Axis,
    pub data_type: DataType,

    /// Size in the file's own dimension order
    pub image_size: Vec<usize>,

    pub msb: bool,
    pub compression: Option<String>,

    /// Voxel spacing in the file's own dimension order
    pub voxel_size: Vec<f64>,
}

impl FileDescriptor {
    /// Size in global order.
    pub fn global_size(&self) -> Vec<usize> {
        self.axis.to_global_order(&self.image_size)
    }

    /// Voxel spacing in global order.
    pub fn global_voxel_size(&self) -> Vec<f64> {
        if self.voxel_size.len() == self.axis.num_dims() {
            self.axis.to_global_order(&self.voxel_size)
        } else {
            vec![1.0; self.axis.num_dims()]
        }
    }
}

// =============================================================================
// Output descriptors
// =============================================================================

/// Parameters of the files to write.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputParameters {
    /// Output path without suffix or extension
    pub filename_base: PathBuf,

    /// Maximum block size per dimension, or one value for all
    pub max_block_size: Vec<i64>,

    /// Overlap per dimension, or one value for all
    pub overlap: Vec<i64>,

    /// Condensed axis of the output files
    pub axis: Vec<i32>,

    pub data_type: DataType,
    pub file_format: FileFormat,
    pub compression: Option<String>,

    /// Keep the index suffix even when the plan has a single tile
    pub always_suffix: bool,
}

/// Plan the output tiles for `global` and describe each file.
pub fn generate_output_descriptors(
    params: &OutputParameters,
    global: &GlobalDescriptor,
    template: &Value,
) -> Result<Vec<SubImageDescriptor>> {
    let num_dims = global.num_dims();
    let max_block_size = plan::convert_to_array(&params.max_block_size, "block size", num_dims)?;
    let overlap = plan::convert_to_array(&params.overlap, "overlap", num_dims)?;
    let axis = Axis::from_condensed(&params.axis)?;
    if axis.num_dims() != num_dims {
        return Err(GeometryError::DimensionMismatch {
            expected: num_dims,
            actual: axis.num_dims(),
        }
        .into());
    }

    let image_size: Vec<i64> = global.size.iter().map(|&s| s as i64).collect();
    let tiles = plan::image_block_ranges(&image_size, &max_block_size, &overlap)?;
    let extension = params.file_format.extension()?;
    let unsuffixed = tiles.len() == 1 && !params.always_suffix;

    tiles
        .into_iter()
        .map(|tile| {
            let suffix = if unsuffixed { String::new() } else { tile.suffix };
            let mut filename = params.filename_base.clone().into_os_string();
            filename.push(&suffix);
            filename.push(extension);
            Ok(SubImageDescriptor {
                filename: PathBuf::from(filename),
                file_format: params.file_format,
                data_type: params.data_type,
                template: template.clone(),
                ranges: SubImageRanges::new(tile.ranges)?,
                axis: axis.clone(),
                suffix,
                index: tile.index,
                msb: global.msb,
                compression: params.compression.clone(),
                voxel_size: global.voxel_size.clone(),
            })
        })
        .collect()
}
