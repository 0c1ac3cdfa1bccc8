//! In-memory N-dimensional voxel array.

use crate::error::GeometryError;
use crate::geometry::LineStarts;

use super::data_type::DataType;

/// An N-dimensional array of voxels of a single [`DataType`].
///
/// All indexing uses logical coordinates in the order of the buffer's
/// dimensions. Elements are stored little-endian with dimension 0 varying
/// fastest, so a line along dimension 0 is contiguous and matches the layout
/// of raw image files. Callers never depend on that layout.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelBuffer {
    data_type: DataType,
    size: Vec<usize>,
    data: Vec<u8>,
}

impl VoxelBuffer {
    /// Create a zero-filled buffer.
    pub fn zeros(size: &[usize], data_type: DataType) -> Self {
        let len = num_voxels(size) * data_type.bytes_per_voxel();
        Self {
            data_type,
            size: size.to_vec(),
            data: vec![0; len],
        }
    }

    /// Wrap raw little-endian element bytes laid out with dimension 0 fastest.
    pub fn from_bytes(
        size: &[usize],
        data_type: DataType,
        data: Vec<u8>,
    ) -> Result<Self, GeometryError> {
        let expected = num_voxels(size) * data_type.bytes_per_voxel();
        if data.len() != expected {
            return Err(GeometryError::DimensionMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data_type,
            size: size.to_vec(),
            data,
        })
    }

    /// Build a buffer from values, converted to `data_type`.
    pub fn from_values(
        size: &[usize],
        data_type: DataType,
        values: &[f64],
    ) -> Result<Self, GeometryError> {
        let n = num_voxels(size);
        if values.len() != n {
            return Err(GeometryError::DimensionMismatch {
                expected: n,
                actual: values.len(),
            });
        }
        let bpv = data_type.bytes_per_voxel();
        let mut data = vec![0; n * bpv];
        for (value, out) in values.iter().zip(data.chunks_exact_mut(bpv)) {
            data_type.encode(*value, out);
        }
        Ok(Self {
            data_type,
            size: size.to_vec(),
            data,
        })
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn size(&self) -> &[usize] {
        &self.size
    }

    pub fn num_dims(&self) -> usize {
        self.size.len()
    }

    pub fn num_voxels(&self) -> usize {
        num_voxels(&self.size)
    }

    /// Raw little-endian element bytes, dimension 0 fastest.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Value at the given coordinates.
    pub fn get(&self, coords: &[usize]) -> Option<f64> {
        let index = self.linear_index(coords)?;
        let bpv = self.data_type.bytes_per_voxel();
        Some(self.data_type.decode(&self.data[index * bpv..(index + 1) * bpv]))
    }

    /// Set the value at the given coordinates. Returns false when out of range.
    pub fn set(&mut self, coords: &[usize], value: f64) -> bool {
        match self.linear_index(coords) {
            Some(index) => {
                let bpv = self.data_type.bytes_per_voxel();
                self.data_type
                    .encode(value, &mut self.data[index * bpv..(index + 1) * bpv]);
                true
            }
            None => false,
        }
    }

    /// All values in storage order.
    pub fn to_values(&self) -> Vec<f64> {
        self.data
            .chunks_exact(self.data_type.bytes_per_voxel())
            .map(|e| self.data_type.decode(e))
            .collect()
    }

    /// Smallest and largest value, or `None` for an empty buffer.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.data
            .chunks_exact(self.data_type.bytes_per_voxel())
            .map(|e| self.data_type.decode(e))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Copy converted to another data type.
    pub fn convert(&self, data_type: DataType) -> VoxelBuffer {
        if data_type == self.data_type {
            return self.clone();
        }
        self.map_values(data_type, |v| v)
    }

    /// Apply `f` to every value, storing the results as `data_type`.
    pub fn map_values(&self, data_type: DataType, f: impl Fn(f64) -> f64) -> VoxelBuffer {
        let bpv = data_type.bytes_per_voxel();
        let mut data = vec![0; self.num_voxels() * bpv];
        for (element, out) in self
            .data
            .chunks_exact(self.data_type.bytes_per_voxel())
            .zip(data.chunks_exact_mut(bpv))
        {
            data_type.encode(f(self.data_type.decode(element)), out);
        }
        VoxelBuffer {
            data_type,
            size: self.size.clone(),
            data,
        }
    }

    /// Same data with a different shape of equal voxel count.
    pub fn reshape(self, size: &[usize]) -> Result<VoxelBuffer, GeometryError> {
        if num_voxels(size) != self.num_voxels() {
            return Err(GeometryError::DimensionMismatch {
                expected: self.num_voxels(),
                actual: num_voxels(size),
            });
        }
        Ok(VoxelBuffer {
            data_type: self.data_type,
            size: size.to_vec(),
            data: self.data,
        })
    }

    /// Copy of the box `[start, start + size)`.
    pub fn sub_image(&self, start: &[usize], size: &[usize]) -> Result<VoxelBuffer, GeometryError> {
        self.check_box(start, size)?;
        let bpv = self.data_type.bytes_per_voxel();
        let strides = strides(&self.size);
        let line_bytes = size[0] * bpv;

        let mut out = VoxelBuffer::zeros(size, self.data_type);
        for (line, line_start) in LineStarts::new(size).enumerate() {
            let src: usize = line_start
                .iter()
                .zip(start)
                .zip(&strides)
                .map(|((i, s), stride)| (i + s) * stride)
                .sum();
            let src = src * bpv;
            out.data[line * line_bytes..(line + 1) * line_bytes]
                .copy_from_slice(&self.data[src..src + line_bytes]);
        }
        Ok(out)
    }

    /// Overwrite the box starting at `start` with `part`, converting its data
    /// type if needed.
    pub fn set_sub_image(&mut self, start: &[usize], part: &VoxelBuffer) -> Result<(), GeometryError> {
        self.check_box(start, part.size())?;
        let converted;
        let part = if part.data_type == self.data_type {
            part
        } else {
            converted = part.convert(self.data_type);
            &converted
        };

        let bpv = self.data_type.bytes_per_voxel();
        let strides = strides(&self.size);
        let line_bytes = part.size[0] * bpv;
        for (line, line_start) in LineStarts::new(&part.size).enumerate() {
            let dst: usize = line_start
                .iter()
                .zip(start)
                .zip(&strides)
                .map(|((i, s), stride)| (i + s) * stride)
                .sum();
            let dst = dst * bpv;
            self.data[dst..dst + line_bytes]
                .copy_from_slice(&part.data[line * line_bytes..(line + 1) * line_bytes]);
        }
        Ok(())
    }

    /// Reorder dimensions: dimension `i` of the result is dimension
    /// `order[i]` of this buffer.
    pub fn permute(&self, order: &[usize]) -> VoxelBuffer {
        let old_strides = strides(&self.size);
        let new_size: Vec<usize> = order.iter().map(|&d| self.size[d]).collect();
        let new_strides: Vec<isize> = order.iter().map(|&d| old_strides[d] as isize).collect();
        self.strided_copy(new_size, new_strides, 0)
    }

    /// Reverse the marked dimensions.
    pub fn flip(&self, flip: &[bool]) -> VoxelBuffer {
        let old_strides = strides(&self.size);
        let mut base = 0isize;
        let mut new_strides = Vec::with_capacity(self.size.len());
        for (d, &stride) in old_strides.iter().enumerate() {
            if flip.get(d).copied().unwrap_or(false) && self.size[d] > 0 {
                base += (self.size[d] as isize - 1) * stride as isize;
                new_strides.push(-(stride as isize));
            } else {
                new_strides.push(stride as isize);
            }
        }
        self.strided_copy(self.size.clone(), new_strides, base)
    }

    /// Gather a new buffer where element `idx` comes from source element
    /// `base + sum(idx[d] * strides[d])`.
    fn strided_copy(&self, size: Vec<usize>, strides: Vec<isize>, base: isize) -> VoxelBuffer {
        let bpv = self.data_type.bytes_per_voxel();
        let total = num_voxels(&size);
        let mut data = vec![0; total * bpv];
        if total == 0 {
            return VoxelBuffer {
                data_type: self.data_type,
                size,
                data,
            };
        }

        let mut index = vec![0usize; size.len()];
        let mut offset = base;
        for out in data.chunks_exact_mut(bpv) {
            let src = offset as usize * bpv;
            out.copy_from_slice(&self.data[src..src + bpv]);

            for d in 0..size.len() {
                index[d] += 1;
                offset += strides[d];
                if index[d] < size[d] {
                    break;
                }
                offset -= strides[d] * size[d] as isize;
                index[d] = 0;
            }
        }
        VoxelBuffer {
            data_type: self.data_type,
            size,
            data,
        }
    }

    fn linear_index(&self, coords: &[usize]) -> Option<usize> {
        if coords.len() != self.size.len() || coords.iter().zip(&self.size).any(|(c, s)| c >= s) {
            return None;
        }
        Some(
            coords
                .iter()
                .zip(strides(&self.size))
                .map(|(c, stride)| c * stride)
                .sum(),
        )
    }

    fn check_box(&self, start: &[usize], size: &[usize]) -> Result<(), GeometryError> {
        let fits = start.len() == self.size.len()
            && size.len() == self.size.len()
            && start
                .iter()
                .zip(size)
                .zip(&self.size)
                .all(|((s, n), limit)| s + n <= *limit);
        if fits {
            Ok(())
        } else {
            Err(GeometryError::OutOfRange {
                start: start.iter().map(|&s| s as i64).collect(),
                size: size.iter().map(|&s| s as i64).collect(),
                image_size: self.size.clone(),
            })
        }
    }
}

fn num_voxels(size: &[usize]) -> usize {
    size.iter().product()
}

/// Element strides with dimension 0 fastest.
fn strides(size: &[usize]) -> Vec<usize> {
    let mut strides = Vec::with_capacity(size.len());
    let mut stride = 1;
    for &s in size {
        strides.push(stride);
        stride *= s;
    }
    strides
}
