//! A voxel buffer tagged with the frame it is expressed in.

use crate::error::GeometryError;
use crate::geometry::{CoordinateTransformer, Region};

use super::{DataType, VoxelBuffer};

/// A box of voxels in the local frame of `transformer`.
///
/// Parts read from different tiles can be pasted into one image: each part
/// is moved into this image's frame before its voxels are copied.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientedImage<'t> {
    region: Region,
    image: VoxelBuffer,
    transformer: &'t CoordinateTransformer,
}

impl<'t> OrientedImage<'t> {
    pub fn new(region: Region, image: VoxelBuffer, transformer: &'t CoordinateTransformer) -> Self {
        Self {
            region,
            image,
            transformer,
        }
    }

    /// A zero-filled image covering `region`.
    pub fn empty(region: Region, data_type: DataType, transformer: &'t CoordinateTransformer) -> Self {
        let image = VoxelBuffer::zeros(&region.extent(), data_type);
        Self::new(region, image, transformer)
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn image(&self) -> &VoxelBuffer {
        &self.image
    }

    pub fn transformer(&self) -> &'t CoordinateTransformer {
        self.transformer
    }

    pub fn into_image(self) -> VoxelBuffer {
        self.image
    }

    /// The same voxels expressed in the frame of `other`.
    pub fn to_other<'o>(&self, other: &'o CoordinateTransformer) -> OrientedImage<'o> {
        OrientedImage {
            region: self.transformer.to_other(&self.region, other),
            image: self.transformer.image_to_other(&self.image, other),
            transformer: other,
        }
    }

    /// Copy `part` into this image. The part must lie inside this image's
    /// region once moved into its frame.
    pub fn set_sub_image(&mut self, part: &OrientedImage<'_>) -> Result<(), GeometryError> {
        if part.transformer == self.transformer {
            self.paste(&part.region, &part.image)
        } else {
            let moved = part.to_other(self.transformer);
            self.paste(&moved.region, &moved.image)
        }
    }

    fn paste(&mut self, region: &Region, image: &VoxelBuffer) -> Result<(), GeometryError> {
        let offset: Vec<i64> = region
            .start
            .iter()
            .zip(&self.region.start)
            .map(|(&p, &s)| p - s)
            .collect();
        let inside = offset.len() == self.region.num_dims()
            && offset
                .iter()
                .zip(&region.size)
                .zip(&self.region.size)
                .all(|((&o, &n), &limit)| o >= 0 && o + n <= limit);
        if !inside {
            return Err(GeometryError::OutOfRange {
                start: offset,
                size: region.size.clone(),
                image_size: self.region.extent(),
            });
        }
        let offset: Vec<usize> = offset.iter().map(|&o| o as usize).collect();
        self.image.set_sub_image(&offset, image)
    }
}
