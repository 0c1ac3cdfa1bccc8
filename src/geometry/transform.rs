//! Conversion of boxes and voxel buffers between a tile's local frame and the
//! global frame.
//!
//! ```text
//!   global frame                     local frame (file order)
//!   ┌──────────────┐   to_local      ┌──────────────┐
//!   │  start,size  │ ──────────────► │  start,size  │
//!   │              │ ◄────────────── │              │
//!   └──────────────┘   to_global     └──────────────┘
//!          1. subtract origin        2. permute by dim_order
//!                                    3. reflect flipped dimensions
//! ```
//!
//! Reflection of a box along a flipped local dimension of extent `L` maps
//! `start` to `L - start - size`. The mapping is its own inverse, so boxes of
//! any size survive a `to_local`/`to_global` round trip.

use crate::error::GeometryError;
use crate::volume::VoxelBuffer;

use super::{Axis, Region};

/// Moves coordinates between one tile's local frame and the global frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateTransformer {
    origin: Vec<i64>,
    size: Vec<i64>,
    axis: Axis,
    local_size: Vec<i64>,
}

impl CoordinateTransformer {
    /// Create a transformer for a tile whose physical minimum corner is at
    /// `origin` and whose extent is `size`, both in global order.
    pub fn new(origin: Vec<i64>, size: Vec<i64>, axis: Axis) -> Result<Self, GeometryError> {
        let n = axis.num_dims();
        for len in [origin.len(), size.len()] {
            if len != n {
                return Err(GeometryError::DimensionMismatch {
                    expected: n,
                    actual: len,
                });
            }
        }
        let local_size = axis.to_local_order(&size);
        Ok(Self {
            origin,
            size,
            axis,
            local_size,
        })
    }

    /// Transformer for the whole global volume in its canonical order.
    pub fn global(size: &[usize]) -> Self {
        let n = size.len();
        let size: Vec<i64> = size.iter().map(|&s| s as i64).collect();
        Self {
            origin: vec![0; n],
            local_size: size.clone(),
            size,
            axis: Axis::identity(n),
        }
    }

    pub fn origin(&self) -> &[i64] {
        &self.origin
    }

    /// Tile extent in global order.
    pub fn size(&self) -> &[i64] {
        &self.size
    }

    /// Tile extent in local order.
    pub fn local_size(&self) -> &[i64] {
        &self.local_size
    }

    pub fn axis(&self) -> &Axis {
        &self.axis
    }

    /// Convert a box from global to local coordinates.
    pub fn to_local(&self, global: &Region) -> Region {
        let shifted: Vec<i64> = global
            .start
            .iter()
            .zip(&self.origin)
            .map(|(s, o)| s - o)
            .collect();
        let mut start = self.axis.to_local_order(&shifted);
        let size = self.axis.to_local_order(&global.size);
        self.reflect(&mut start, &size);
        Region::new(start, size)
    }

    /// Convert a box from local to global coordinates.
    pub fn to_global(&self, local: &Region) -> Region {
        let mut start = local.start.clone();
        self.reflect(&mut start, &local.size);
        let start = self
            .axis
            .to_global_order(&start)
            .into_iter()
            .zip(&self.origin)
            .map(|(s, o)| s + o)
            .collect();
        let size = self.axis.to_global_order(&local.size);
        Region::new(start, size)
    }

    /// Convert a box from this local frame to the local frame of `other`.
    pub fn to_other(&self, local: &Region, other: &CoordinateTransformer) -> Region {
        other.to_local(&self.to_global(local))
    }

    /// Reorient a buffer from global to local order.
    pub fn image_to_local(&self, global: &VoxelBuffer) -> VoxelBuffer {
        global
            .permute(self.axis.dim_order())
            .flip(self.axis.dim_flip())
    }

    /// Reorient a buffer from local to global order.
    pub fn image_to_global(&self, local: &VoxelBuffer) -> VoxelBuffer {
        local
            .flip(self.axis.dim_flip())
            .permute(self.axis.reverse_dim_order())
    }

    /// Reorient a buffer from this local frame to the local frame of `other`.
    pub fn image_to_other(&self, local: &VoxelBuffer, other: &CoordinateTransformer) -> VoxelBuffer {
        if self.axis == other.axis {
            return local.clone();
        }
        other.image_to_local(&self.image_to_global(local))
    }

    fn reflect(&self, start: &mut [i64], size: &[i64]) {
        for (i, &flip) in self.axis.dim_flip().iter().enumerate() {
            if flip {
                start[i] = self.local_size[i] - start[i] - size[i];
            }
        }
    }
}
