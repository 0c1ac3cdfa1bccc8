//! Partition planning.
//!
//! Splits a global image size into overlapping blocks. Each dimension is
//! handled independently and the tiles are the Cartesian product of the
//! per-dimension blocks.
//!
//! ```text
//!   image_size = 10, max_block_size = 4, overlap = 1
//!
//!   blocks     = ceil(10 / 4) = 3
//!   block_size = ceil(10 / 3) = 4
//!
//!   voxel:  0 1 2 3 4 5 6 7 8 9
//!   tile 0: R R R R h                [0, 4, 0, 1]
//!   tile 1:       h R R R R h        [3, 8, 1, 1]
//!   tile 2:               h R R      [7, 9, 1, 0]
//!
//!   R = region of interest, h = halo
//! ```
//!
//! Each range is `[min, max, start_halo, end_halo]` with inclusive `min` and
//! `max`. The ROIs of all tiles partition the image exactly.

use std::str::FromStr;

use crate::error::{ConfigError, GeometryError, Result};

/// `[min, max, start_halo, end_halo]` for one dimension of one tile
pub type BlockRange = [i64; 4];

/// One tile of a partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTile {
    /// Position in the partition, row-major with the last dimension fastest
    pub index: usize,

    /// Filename suffix, `_` followed by the zero-padded index
    pub suffix: String,

    /// One range per dimension
    pub ranges: Vec<BlockRange>,
}

/// Filename suffix for a tile index.
pub fn tile_suffix(index: usize) -> String {
    format!("_{index:04}")
}

/// Number of blocks per dimension. A maximum of zero or less means the
/// dimension is not split.
pub fn number_of_blocks(image_size: &[i64], max_block_size: &[i64]) -> Vec<i64> {
    image_size
        .iter()
        .zip(max_block_size)
        .map(|(&size, &max)| if max <= 0 { 1 } else { div_ceil(size, max) })
        .collect()
}

/// Near-equal block size per dimension for the given block counts.
pub fn suggested_block_size(image_size: &[i64], number_of_blocks: &[i64]) -> Vec<i64> {
    image_size
        .iter()
        .zip(number_of_blocks)
        .map(|(&size, &blocks)| div_ceil(size, blocks))
        .collect()
}

/// Range of block `block_number` along one dimension.
///
/// There is no halo at the outer border of the image, and the last block is
/// shortened rather than padded. Halos are clipped to the image, so a halo
/// can be shorter than `overlap` next to the border.
pub fn block_coordinate_range(
    block_number: i64,
    block_size: i64,
    overlap: i64,
    image_size: i64,
) -> BlockRange {
    let roi_start = block_number * block_size;
    let roi_end = ((block_number + 1) * block_size - 1).min(image_size - 1);

    let min = (roi_start - overlap).max(0);
    let max = (roi_end + overlap).min(image_size - 1);

    [min, max, roi_start - min, max - roi_end]
}

/// Compute the overlapping tiles covering `image_size`.
///
/// `max_block_size` and `overlap` must have one entry per dimension.
pub fn image_block_ranges(
    image_size: &[i64],
    max_block_size: &[i64],
    overlap: &[i64],
) -> Result<Vec<PlannedTile>> {
    let num_dims = image_size.len();
    for (parameter, values) in [("block size", max_block_size), ("overlap", overlap)] {
        if values.len() != num_dims {
            return Err(ConfigError::ParameterLength {
                parameter,
                expected: num_dims,
                actual: values.len(),
            }
            .into());
        }
    }
    if num_dims == 0 || image_size.iter().any(|&s| s <= 0) {
        return Err(GeometryError::InvalidImageSize(image_size.to_vec()).into());
    }
    if let Some(&negative) = overlap.iter().find(|&&o| o < 0) {
        return Err(ConfigError::NegativeOverlap(negative).into());
    }

    let blocks = number_of_blocks(image_size, max_block_size);
    let block_size = suggested_block_size(image_size, &blocks);

    // Per-dimension ranges, then their Cartesian product with the last
    // dimension varying fastest.
    let per_dim: Vec<Vec<BlockRange>> = (0..num_dims)
        .map(|d| {
            (0..blocks[d])
                .map(|i| block_coordinate_range(i, block_size[d], overlap[d], image_size[d]))
                .collect()
        })
        .collect();

    let total: usize = per_dim.iter().map(Vec::len).product();
    let mut tiles = Vec::with_capacity(total);
    let mut counter = vec![0usize; num_dims];
    for index in 0..total {
        let ranges = counter
            .iter()
            .zip(&per_dim)
            .map(|(&i, ranges)| ranges[i])
            .collect();
        tiles.push(PlannedTile {
            index,
            suffix: tile_suffix(index),
            ranges,
        });

        for d in (0..num_dims).rev() {
            counter[d] += 1;
            if counter[d] < per_dim[d].len() {
                break;
            }
            counter[d] = 0;
        }
    }
    Ok(tiles)
}

/// Expand a scalar-or-vector parameter to one value per dimension.
///
/// A single value is repeated for every dimension.
pub fn convert_to_array(
    values: &[i64],
    parameter: &'static str,
    num_dims: usize,
) -> std::result::Result<Vec<i64>, ConfigError> {
    match values.len() {
        1 => Ok(vec![values[0]; num_dims]),
        n if n == num_dims => Ok(values.to_vec()),
        n => Err(ConfigError::ParameterLength {
            parameter,
            expected: num_dims,
            actual: n,
        }),
    }
}

fn div_ceil(a: i64, b: i64) -> i64 {
    (a + b - 1) / b
}

// =============================================================================
// Slice presets
// =============================================================================

/// Orientation for splitting a 3-D volume into single slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceMode {
    Sagittal,
    Coronal,
    Axial,
    /// Slices across the given file dimension (0-based) of the input
    Relative(usize),
}

/// Output axis, block size and overlap for a [`SliceMode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlicePreset {
    pub axis: Vec<i32>,
    pub max_block_size: Vec<i64>,
    pub overlap: Vec<i64>,
}

impl SliceMode {
    /// Parameters for slicing a volume whose input axis is `axis`.
    pub fn preset(self, axis: &[i32]) -> std::result::Result<SlicePreset, ConfigError> {
        let (axis, max_block_size) = match self {
            SliceMode::Sagittal => (vec![2, -3, 1], vec![1, -1, -1]),
            SliceMode::Coronal => (vec![1, -3, 2], vec![-1, 1, -1]),
            SliceMode::Axial => (vec![1, 2, 3], vec![-1, -1, 1]),
            SliceMode::Relative(dim) => {
                if axis.len() != 3 {
                    return Err(ConfigError::ParameterLength {
                        parameter: "axis",
                        expected: 3,
                        actual: axis.len(),
                    });
                }
                if dim > 2 {
                    return Err(ConfigError::UnknownSlice((dim + 1).to_string()));
                }
                let new_axis = match dim {
                    0 => vec![axis[1], -axis[2], axis[0]],
                    1 => vec![axis[0], -axis[2], axis[1]],
                    _ => vec![axis[0], axis[1], axis[2]],
                };
                let mut max_block_size = vec![-1; 3];
                let across = (axis[dim].unsigned_abs() as usize).saturating_sub(1);
                if let Some(max) = max_block_size.get_mut(across) {
                    *max = 1;
                }
                (new_axis, max_block_size)
            }
        };
        Ok(SlicePreset {
            axis,
            max_block_size,
            overlap: vec![0; 3],
        })
    }
}

impl FromStr for SliceMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "1" => Ok(SliceMode::Relative(0)),
            "2" => Ok(SliceMode::Relative(1)),
            "3" => Ok(SliceMode::Relative(2)),
            _ if lower.starts_with('s') => Ok(SliceMode::Sagittal),
            _ if lower.starts_with('c') => Ok(SliceMode::Coronal),
            _ if lower.starts_with('a') => Ok(SliceMode::Axial),
            _ => Err(ConfigError::UnknownSlice(s.to_string())),
        }
    }
}
