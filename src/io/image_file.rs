//! Region-level access to image files.
//!
//! Every format adapter implements [`ImageFile`]. Raw formats that can seek to
//! any voxel implement the smaller [`LinearImageFile`] contract instead and
//! forward to [`read_image_by_lines`] and [`write_image_by_lines`], which turn
//! region requests into one `read_line`/`write_line` call per line.
//!
//! ```text
//!   read_image(region)                     write_image(source)
//!         │                                       │
//!         ▼                                       ▼
//!   for each line in region              for each 2-D slab of the file
//!     read_line(start, len)                source.read_image(slab)
//!     copy into output buffer              for each line in slab
//!                                            write_line(start, line)
//!                                          close_file()
//! ```

use crate::error::{GeometryError, Result};
use crate::geometry::{LineStarts, Region};
use crate::volume::{DataType, VoxelBuffer};

use super::Limits;

/// Something that can supply voxels for a box in its own coordinate frame.
pub trait ImageSource {
    fn read_image(&mut self, region: &Region) -> Result<VoxelBuffer>;
}

/// One physical image file, addressed in its local coordinate frame.
pub trait ImageFile {
    /// Read a box of voxels.
    fn read_image(&mut self, region: &Region) -> Result<VoxelBuffer>;

    /// Create the whole file from `source`, then close it.
    fn write_image(&mut self, source: &mut dyn ImageSource, rescale: Option<Limits>)
        -> Result<()>;

    /// Release any open handles. Closing twice is a no-op.
    fn close(&mut self) -> Result<()>;
}

/// A raw image file that can read and write runs of voxels along dimension 0.
pub trait LinearImageFile {
    /// File extent in local order.
    fn image_size(&self) -> &[usize];

    /// Data type of the values stored in the file.
    fn data_type(&self) -> DataType;

    fn read_line(&mut self, start: &[usize], num_voxels: usize) -> Result<VoxelBuffer>;

    fn write_line(
        &mut self,
        start: &[usize],
        line: &VoxelBuffer,
        rescale: Option<Limits>,
    ) -> Result<()>;

    fn close_file(&mut self) -> Result<()>;
}

/// Read a box from a linear file one line at a time.
pub fn read_image_by_lines<F>(file: &mut F, region: &Region) -> Result<VoxelBuffer>
where
    F: LinearImageFile + ?Sized,
{
    let image_size = file.image_size().to_vec();
    let inside = region.num_dims() == image_size.len()
        && region
            .start
            .iter()
            .zip(&region.size)
            .zip(&image_size)
            .all(|((&s, &n), &limit)| s >= 0 && n >= 0 && s + n <= limit as i64);
    if !inside {
        return Err(GeometryError::OutOfRange {
            start: region.start.clone(),
            size: region.size.clone(),
            image_size,
        }
        .into());
    }

    let extent = region.extent();
    let origin: Vec<usize> = region.start.iter().map(|&s| s as usize).collect();
    let mut line_shape = vec![1; extent.len()];
    if let Some(first) = line_shape.first_mut() {
        *first = extent[0];
    }

    let mut image = VoxelBuffer::zeros(&extent, file.data_type());
    for offset in LineStarts::new(&extent) {
        let start: Vec<usize> = origin.iter().zip(&offset).map(|(o, i)| o + i).collect();
        let line = file.read_line(&start, extent[0])?.reshape(&line_shape)?;
        image.set_sub_image(&offset, &line)?;
    }
    Ok(image)
}

/// Fill a whole linear file from `source`, reading one 2-D slab at a time
/// and writing it line by line. The file is closed afterwards, also when
/// writing fails.
pub fn write_image_by_lines<F>(
    file: &mut F,
    source: &mut dyn ImageSource,
    rescale: Option<Limits>,
) -> Result<()>
where
    F: LinearImageFile + ?Sized,
{
    let written = write_slabs(file, source, rescale);
    let closed = file.close_file();
    written.and(closed)
}

fn write_slabs<F>(file: &mut F, source: &mut dyn ImageSource, rescale: Option<Limits>) -> Result<()>
where
    F: LinearImageFile + ?Sized,
{
    let size = file.image_size().to_vec();
    if size.is_empty() || size.contains(&0) {
        return Ok(());
    }
    let num_dims = size.len();
    let lines_per_slab = if num_dims > 1 { size[1] } else { 1 };

    let mut slab_size: Vec<i64> = vec![1; num_dims];
    slab_size[0] = size[0] as i64;
    if num_dims > 1 {
        slab_size[1] = size[1] as i64;
    }
    let mut line_size = vec![1usize; num_dims];
    line_size[0] = size[0];

    // Outer loop runs over dimensions 2.. of the file.
    let outer: Vec<usize> = std::iter::once(1).chain(size.iter().skip(2).copied()).collect();
    for outer_index in LineStarts::new(&outer) {
        let mut start = vec![0usize; num_dims];
        for (d, &i) in outer_index.iter().enumerate().skip(1) {
            start[d + 1] = i;
        }
        let slab_start: Vec<i64> = start.iter().map(|&s| s as i64).collect();
        let slab = source.read_image(&Region::new(slab_start, slab_size.clone()))?;

        for line in 0..lines_per_slab {
            let mut slab_offset = vec![0usize; num_dims];
            if num_dims > 1 {
                slab_offset[1] = line;
                start[1] = line;
            }
            let image_line = slab
                .sub_image(&slab_offset, &line_size)?
                .reshape(&[size[0]])?;
            file.write_line(&start, &image_line, rescale)?;
        }
    }
    Ok(())
}
