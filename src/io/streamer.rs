//! Line-oriented streaming of voxels to and from raw image files.
//!
//! Raw files store voxels with dimension 0 varying fastest. A "line" is a run
//! of consecutive voxels along dimension 0, which is always contiguous on
//! disk, so reading or writing one line costs a single seek plus one I/O
//! call no matter how large the file is.

use crate::error::Result;
use crate::volume::{ByteOrder, DataType, VoxelBuffer};

use super::FileWrapper;

/// Byte offset of the voxel at `coords` in a file of the given shape.
///
/// Dimension 0 varies fastest.
pub fn linear_byte_offset(shape: &[usize], bytes_per_voxel: usize, coords: &[usize]) -> u64 {
    let mut offset = 0u64;
    let mut multiple = bytes_per_voxel as u64;
    for (&coord, &length) in coords.iter().zip(shape) {
        offset += coord as u64 * multiple;
        multiple *= length as u64;
    }
    offset
}

/// Input value range mapped onto the full range of an output data type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub min: f64,
    pub max: f64,
}

impl Limits {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Clamp values to `limits` and map them linearly onto the representable
/// range of `data_type`, rounding to the nearest value.
///
/// Floating point types have no fixed range, so values are only clamped.
pub fn rescale_line(line: &VoxelBuffer, data_type: DataType, limits: Limits) -> VoxelBuffer {
    let range = limits.max - limits.min;
    let type_range = data_type.integer_range();
    line.map_values(data_type, |v| {
        let v = v.clamp(limits.min, limits.max);
        match type_range {
            Some((type_min, type_max)) if range > 0.0 => {
                type_min + (type_max - type_min) * (v - limits.min) / range
            }
            Some((type_min, _)) => type_min,
            None => v,
        }
    })
}

/// Reads and writes lines of voxels in one raw data file.
#[derive(Debug)]
pub struct FileStreamer {
    wrapper: FileWrapper,
    image_size: Vec<usize>,
    data_type: DataType,
    byte_order: ByteOrder,
    data_offset: u64,
}

impl FileStreamer {
    pub fn new(
        wrapper: FileWrapper,
        image_size: Vec<usize>,
        data_type: DataType,
        byte_order: ByteOrder,
    ) -> Self {
        Self {
            wrapper,
            image_size,
            data_type,
            byte_order,
            data_offset: 0,
        }
    }

    /// Voxel data starts this many bytes into the file.
    pub fn with_data_offset(mut self, data_offset: u64) -> Self {
        self.data_offset = data_offset;
        self
    }

    pub fn image_size(&self) -> &[usize] {
        &self.image_size
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Read `num_voxels` consecutive voxels starting at `start`.
    ///
    /// Returns a one-dimensional buffer of the file's data type.
    pub fn read_line(&mut self, start: &[usize], num_voxels: usize) -> Result<VoxelBuffer> {
        let bpv = self.data_type.bytes_per_voxel();
        let offset = self.data_offset + linear_byte_offset(&self.image_size, bpv, start);
        let bytes = self.wrapper.read_exact_at(offset, num_voxels * bpv)?;

        let mut data = bytes.to_vec();
        self.byte_order.swap_in_place(&mut data, bpv);
        Ok(VoxelBuffer::from_bytes(&[num_voxels], self.data_type, data)?)
    }

    /// Write a line of voxels starting at `start`, converting to the file's
    /// data type and optionally rescaling first.
    pub fn write_line(
        &mut self,
        start: &[usize],
        line: &VoxelBuffer,
        rescale: Option<Limits>,
    ) -> Result<()> {
        let converted = match rescale {
            Some(limits) => rescale_line(line, self.data_type, limits),
            None => line.convert(self.data_type),
        };
        let bpv = self.data_type.bytes_per_voxel();
        let offset = self.data_offset + linear_byte_offset(&self.image_size, bpv, start);

        let mut data = converted.into_bytes();
        self.byte_order.swap_in_place(&mut data, bpv);
        self.wrapper.write_all_at(offset, &data)?;
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        self.wrapper.close()?;
        Ok(())
    }
}
