//! A logical volume made of many tile files.
//!
//! ```text
//!   read_image(region, frame)
//!         │
//!         ├─► tile 0: region ∩ ROI ─► read file ─► local frame ─┐
//!         ├─► tile 1: region ∩ ROI ─► read file ─► local frame ─┼─► paste into
//!         └─► tile N: (no overlap, skipped)                     │   frame
//!                                                               ▼
//!                                                        OrientedImage
//! ```
//!
//! Because the ROIs of the tiles partition the volume, every voxel of the
//! result comes from exactly one tile and halos are never read.

use std::sync::Arc;

use crate::descriptor::SubImageDescriptor;
use crate::error::{GeometryError, Result};
use crate::format::FileFactory;
use crate::geometry::{CoordinateTransformer, Region};
use crate::io::Limits;

use super::{DataType, OrientedImage, SubImage, TileLookupCache, VoxelBuffer};

/// How values are mapped into the output data type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RescaleOption {
    /// Use the smallest and largest value of the source volume
    VolumeLimits,

    /// Use the given limits
    Explicit(Limits),
}

pub struct CombinedImage {
    sub_images: Vec<SubImage>,

    /// Global size covered by the tiles' ROIs
    size: Vec<usize>,

    /// Type of assembled images
    data_type: DataType,

    /// Computed on first use
    limits: Option<Option<Limits>>,
}

impl CombinedImage {
    /// Wrap a set of tiles. All tiles must have the same number of
    /// dimensions.
    pub fn new(descriptors: Vec<SubImageDescriptor>, factory: Arc<dyn FileFactory>) -> Result<Self> {
        let Some(first) = descriptors.first() else {
            return Err(GeometryError::InvalidImageSize(Vec::new()).into());
        };
        let data_type = first.data_type;
        let num_dims = first.num_dims();

        let mut size = vec![0usize; num_dims];
        let mut sub_images = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            if descriptor.num_dims() != num_dims {
                return Err(GeometryError::DimensionMismatch {
                    expected: num_dims,
                    actual: descriptor.num_dims(),
                }
                .into());
            }
            let sub_image = SubImage::new(descriptor, Arc::clone(&factory))?;
            for (s, end) in size.iter_mut().zip(sub_image.roi().end()) {
                *s = (*s).max(end.max(0) as usize);
            }
            sub_images.push(sub_image);
        }

        Ok(Self {
            sub_images,
            size,
            data_type,
            limits: None,
        })
    }

    /// Global size of the volume.
    pub fn size(&self) -> &[usize] {
        &self.size
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn sub_images(&self) -> &[SubImage] {
        &self.sub_images
    }

    /// Assemble the box `region`, given in the local frame of `transformer`.
    pub fn read_image<'t>(
        &mut self,
        region: &Region,
        transformer: &'t CoordinateTransformer,
    ) -> Result<OrientedImage<'t>> {
        let mut combined = OrientedImage::empty(region.clone(), self.data_type, transformer);
        let global = transformer.to_global(region);
        for sub_image in &mut self.sub_images {
            if let Some(part) = sub_image.read_image_bound_by_roi(&global)? {
                combined.set_sub_image(&part)?;
            }
        }
        Ok(combined)
    }

    /// Assemble a box given in global coordinates.
    pub fn read(&mut self, region: &Region) -> Result<VoxelBuffer> {
        let global = CoordinateTransformer::global(&self.size);
        Ok(self.read_image(region, &global)?.into_image())
    }

    /// Read `num_voxels` voxels along global dimension 0 starting at
    /// `start`. The line may cross any number of tiles; `cache` remembers
    /// which tiles matched recently.
    pub fn read_line(
        &mut self,
        start: &[usize],
        num_voxels: usize,
        cache: Option<&mut TileLookupCache>,
    ) -> Result<VoxelBuffer> {
        let num_dims = self.size.len();
        let mut line_size = vec![1i64; num_dims];
        if let Some(first) = line_size.first_mut() {
            *first = num_voxels as i64;
        }
        let line_region = Region::new(start.iter().map(|&s| s as i64).collect(), line_size);
        if start.len() != num_dims {
            return Err(GeometryError::DimensionMismatch {
                expected: num_dims,
                actual: start.len(),
            }
            .into());
        }

        let global = CoordinateTransformer::global(&self.size);
        let mut line = OrientedImage::empty(line_region.clone(), self.data_type, &global);
        let mut local_cache = TileLookupCache::with_capacity(1);
        let cache = cache.unwrap_or(&mut local_cache);

        let end = line_region.start[0] + num_voxels as i64;
        let mut voxel = line_region.start.clone();
        while voxel[0] < end {
            let sub_images = &self.sub_images;
            let found = cache.find(sub_images.len(), |i| sub_images[i].contains_voxel(&voxel));
            let Some(index) = found else {
                return Err(GeometryError::OutOfRange {
                    start: voxel,
                    size: vec![1; num_dims],
                    image_size: self.size.clone(),
                }
                .into());
            };

            let sub_image = &mut self.sub_images[index];
            let run_end = end.min(sub_image.roi().end()[0]);
            let mut run = line_region.clone();
            run.start[0] = voxel[0];
            run.size[0] = run_end - voxel[0];
            let part = sub_image.read_image(&run)?;
            line.set_sub_image(&part)?;
            voxel[0] = run_end;
        }

        Ok(line.into_image().reshape(&[num_voxels])?)
    }

    /// Fill every tile's file from `source`.
    ///
    /// Returns the limits used for rescaling, if any. With `test` set the
    /// limits are computed but nothing is written.
    pub fn write_image(
        &mut self,
        source: &mut CombinedImage,
        rescale: Option<RescaleOption>,
        test: bool,
    ) -> Result<Option<Limits>> {
        let limits = match rescale {
            None => None,
            Some(RescaleOption::VolumeLimits) => source.get_limits()?,
            Some(RescaleOption::Explicit(limits)) => Some(limits),
        };
        if !test {
            for sub_image in &self.sub_images {
                sub_image.write_image(source, limits)?;
            }
        }
        Ok(limits)
    }

    /// Smallest and largest value across all tiles. Computed once.
    pub fn get_limits(&mut self) -> Result<Option<Limits>> {
        if let Some(limits) = self.limits {
            return Ok(limits);
        }
        let mut limits: Option<Limits> = None;
        for sub_image in &mut self.sub_images {
            if let Some((min, max)) = sub_image.get_limits()? {
                limits = Some(match limits {
                    None => Limits::new(min, max),
                    Some(l) => Limits::new(l.min.min(min), l.max.max(max)),
                });
            }
        }
        self.limits = Some(limits);
        Ok(limits)
    }

    /// Close every tile, returning the first error.
    pub fn close(&mut self) -> Result<()> {
        let mut result = Ok(());
        for sub_image in &mut self.sub_images {
            let closed = sub_image.close();
            if result.is_ok() {
                result = closed;
            }
        }
        result
    }
}
