//! One tile of a larger volume.
//!
//! A [`SubImage`] knows where its file sits in the global volume and
//! converts global requests into reads of its own file. Its region of
//! interest (ROI) is the part of the volume the tile is authoritative for;
//! the halo around it is written but never read back when assembling.

use std::sync::Arc;

use crate::descriptor::SubImageDescriptor;
use crate::error::Result;
use crate::format::FileFactory;
use crate::geometry::{CoordinateTransformer, Region};
use crate::io::{ImageFile, ImageSource, Limits};

use super::{CombinedImage, OrientedImage, VoxelBuffer};

pub struct SubImage {
    descriptor: SubImageDescriptor,
    factory: Arc<dyn FileFactory>,

    /// Opened on first read
    read_file: Option<Box<dyn ImageFile>>,

    transformer: CoordinateTransformer,

    /// Region of interest in global coordinates
    roi: Region,
}

impl SubImage {
    pub fn new(descriptor: SubImageDescriptor, factory: Arc<dyn FileFactory>) -> Result<Self> {
        let transformer = CoordinateTransformer::new(
            descriptor.ranges.origin_start(),
            descriptor.ranges.image_size(),
            descriptor.axis.clone(),
        )?;
        let roi = descriptor.ranges.roi();
        Ok(Self {
            descriptor,
            factory,
            read_file: None,
            transformer,
            roi,
        })
    }

    pub fn descriptor(&self) -> &SubImageDescriptor {
        &self.descriptor
    }

    pub fn transformer(&self) -> &CoordinateTransformer {
        &self.transformer
    }

    pub fn roi(&self) -> &Region {
        &self.roi
    }

    /// Whether the ROI contains a global voxel.
    pub fn contains_voxel(&self, voxel: &[i64]) -> bool {
        self.roi.contains(voxel)
    }

    /// The part of a global region inside the ROI. Empty when they do not
    /// overlap.
    pub fn bind_by_roi(&self, region: &Region) -> Region {
        region.intersect(&self.roi)
    }

    /// Read a global region from the file. The result is in this tile's
    /// local frame.
    pub fn read_image(&mut self, region: &Region) -> Result<OrientedImage<'_>> {
        let local = self.transformer.to_local(region);
        let file = open_read_file(&mut self.read_file, self.factory.as_ref(), &self.descriptor)?;
        let image = file.read_image(&local)?;
        Ok(OrientedImage::new(local, image, &self.transformer))
    }

    /// Read the part of a global region that lies in the ROI, if any.
    pub fn read_image_bound_by_roi(&mut self, region: &Region) -> Result<Option<OrientedImage<'_>>> {
        let bound = self.bind_by_roi(region);
        if bound.is_empty() {
            return Ok(None);
        }
        self.read_image(&bound).map(Some)
    }

    /// Create this tile's file, filling it from `source`.
    pub fn write_image(&self, source: &mut CombinedImage, rescale: Option<Limits>) -> Result<()> {
        let mut out_file = self.factory.create_write_file(&self.descriptor)?;
        let mut local_source = LocalSource::new(source, &self.transformer);
        let written = out_file.write_image(&mut local_source, rescale);
        let closed = out_file.close();
        written.and(closed)
    }

    /// Smallest and largest value stored in the file, halo included. Read
    /// one slab at a time along the last global dimension.
    pub fn get_limits(&mut self) -> Result<Option<(f64, f64)>> {
        let extent = self.descriptor.ranges.extent();
        let Some(last) = extent.num_dims().checked_sub(1) else {
            return Ok(None);
        };

        let mut limits: Option<(f64, f64)> = None;
        for position in extent.start[last]..extent.start[last] + extent.size[last] {
            let mut slab = extent.clone();
            slab.start[last] = position;
            slab.size[last] = 1;
            let part = self.read_image(&slab)?;
            if let Some((min, max)) = part.image().min_max() {
                limits = Some(match limits {
                    None => (min, max),
                    Some((lo, hi)) => (lo.min(min), hi.max(max)),
                });
            }
        }
        Ok(limits)
    }

    /// Close the read file if open. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        match self.read_file.take() {
            Some(mut file) => file.close(),
            None => Ok(()),
        }
    }
}

fn open_read_file<'f>(
    read_file: &'f mut Option<Box<dyn ImageFile>>,
    factory: &dyn FileFactory,
    descriptor: &SubImageDescriptor,
) -> Result<&'f mut Box<dyn ImageFile>> {
    let file = match read_file.take() {
        Some(file) => file,
        None => factory.create_read_file(descriptor)?,
    };
    Ok(read_file.insert(file))
}

// =============================================================================
// LocalSource
// =============================================================================

/// Reads a combined image in the local frame of one tile.
pub struct LocalSource<'a> {
    source: &'a mut CombinedImage,
    transformer: &'a CoordinateTransformer,
}

impl<'a> LocalSource<'a> {
    pub fn new(source: &'a mut CombinedImage, transformer: &'a CoordinateTransformer) -> Self {
        Self {
            source,
            transformer,
        }
    }
}

impl ImageSource for LocalSource<'_> {
    fn read_image(&mut self, region: &Region) -> Result<VoxelBuffer> {
        Ok(self.source.read_image(region, self.transformer)?.into_image())
    }
}
