//! Single-page TIFF images.
//!
//! TIFF files are read and written as a whole 2-D image through the `image`
//! crate, so a tile stored as TIFF must have at most two dimensions larger
//! than one. The decoded image is kept until the file is closed.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::tiff::TiffEncoder;
use image::{DynamicImage, GrayImage, ImageBuffer, ImageFormat, ImageReader, Luma, RgbImage};
use serde_json::Value;

use crate::descriptor::{FileDescriptor, SubImageDescriptor};
use crate::error::{FormatError, GeometryError, IoError, Result};
use crate::geometry::{Axis, Region};
use crate::io::{rescale_line, FileHandleFactory, FileMode, ImageFile, ImageSource, Limits};
use crate::volume::{DataType, VoxelBuffer};

use super::FileFormat;

const FORMAT_NAME: &str = "TIFF";

/// Width and height of a TIFF holding an image of `size`, if all further
/// dimensions are singletons.
fn plane_shape(size: &[usize]) -> Option<(u32, u32)> {
    let width = *size.first()?;
    let height = size.get(1).copied().unwrap_or(1);
    if size.iter().skip(2).any(|&s| s != 1) {
        return None;
    }
    Some((u32::try_from(width).ok()?, u32::try_from(height).ok()?))
}

fn codec_error(path: &Path, e: impl ToString) -> FormatError {
    FormatError::Codec {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

fn decode(path: &Path) -> Result<DynamicImage> {
    let file = File::open(path).map_err(|e| IoError::file(path, e))?;
    let reader = ImageReader::with_format(BufReader::new(file), ImageFormat::Tiff);
    Ok(reader.decode().map_err(|e| codec_error(path, e))?)
}

/// Voxel type used for a decoded image.
fn voxel_type(image: &DynamicImage) -> Option<DataType> {
    match image {
        DynamicImage::ImageLuma8(_) => Some(DataType::UChar),
        DynamicImage::ImageLuma16(_) => Some(DataType::UShort),
        DynamicImage::ImageRgb8(_) => Some(DataType::Rgb),
        _ => None,
    }
}

fn unsupported_colour(image: &DynamicImage) -> FormatError {
    FormatError::UnsupportedDataType {
        data_type: format!("{:?}", image.color()),
        format: FORMAT_NAME,
    }
}

/// Convert a decoded image to a `[width, height]` buffer. Colour images
/// keep their first channel.
fn to_buffer(image: DynamicImage) -> Result<VoxelBuffer> {
    let size = [image.width() as usize, image.height() as usize];
    let (data_type, bytes) = match image {
        DynamicImage::ImageLuma8(img) => (DataType::UChar, img.into_raw()),
        DynamicImage::ImageLuma16(img) => (
            DataType::UShort,
            img.into_raw().iter().flat_map(|v| v.to_le_bytes()).collect(),
        ),
        DynamicImage::ImageRgb8(img) => (DataType::Rgb, img.into_raw().into_iter().step_by(3).collect()),
        other => return Err(unsupported_colour(&other).into()),
    };
    Ok(VoxelBuffer::from_bytes(&size, data_type, bytes)?)
}

/// Build an image of the buffer's type from a `[width, height]` buffer.
fn to_image(buffer: VoxelBuffer, width: u32, height: u32) -> Option<DynamicImage> {
    match buffer.data_type() {
        DataType::UChar => GrayImage::from_raw(width, height, buffer.into_bytes())
            .map(DynamicImage::ImageLuma8),
        DataType::UShort => {
            let values: Vec<u16> = buffer
                .as_bytes()
                .chunks_exact(2)
                .map(|b| u16::from_le_bytes([b[0], b[1]]))
                .collect();
            ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(width, height, values)
                .map(DynamicImage::ImageLuma16)
        }
        DataType::Rgb => {
            let rgb: Vec<u8> = buffer.as_bytes().iter().flat_map(|&v| [v, v, v]).collect();
            RgbImage::from_raw(width, height, rgb).map(DynamicImage::ImageRgb8)
        }
        _ => None,
    }
}

pub(super) fn load_and_parse_header(path: &Path) -> Result<(FileDescriptor, Value)> {
    let image = decode(path)?;
    let data_type = voxel_type(&image).ok_or_else(|| unsupported_colour(&image))?;
    Ok((
        FileDescriptor {
            file_format: FileFormat::Tiff,
            axis: Axis::identity(2),
            data_type,
            image_size: vec![image.width() as usize, image.height() as usize],
            msb: false,
            compression: None,
            voxel_size: Vec::new(),
        },
        Value::Null,
    ))
}

// =============================================================================
// TiffFile
// =============================================================================

/// A TIFF image, read or written as one block.
#[derive(Debug)]
pub struct TiffFile {
    path: PathBuf,

    /// Extent in local order
    image_size: Vec<usize>,

    /// Type written to the file
    data_type: DataType,

    handles: FileHandleFactory,

    /// Decoded contents, loaded on first read
    cached: Option<VoxelBuffer>,
}

impl TiffFile {
    pub fn open_read(descriptor: &SubImageDescriptor, handles: FileHandleFactory) -> Result<Self> {
        Ok(Self {
            path: descriptor.filename.clone(),
            image_size: descriptor.local_size(),
            data_type: descriptor.data_type,
            handles,
            cached: None,
        })
    }

    /// Prepare a new TIFF. Only uncompressed uchar, ushort and rgb images
    /// with at most two non-singleton dimensions can be written.
    pub fn create_write(descriptor: &SubImageDescriptor, handles: FileHandleFactory) -> Result<Self> {
        if let Some(compression) = &descriptor.compression {
            if !compression.eq_ignore_ascii_case("none") {
                return Err(FormatError::UnsupportedCompression {
                    compression: compression.clone(),
                    format: FORMAT_NAME,
                }
                .into());
            }
        }
        if !matches!(
            descriptor.data_type,
            DataType::UChar | DataType::UShort | DataType::Rgb
        ) {
            return Err(FormatError::UnsupportedDataType {
                data_type: descriptor.data_type.to_string(),
                format: FORMAT_NAME,
            }
            .into());
        }
        let image_size = descriptor.local_size();
        if plane_shape(&image_size).is_none() {
            return Err(FormatError::Unsupported {
                format: FORMAT_NAME,
                reason: format!("cannot store an image of size {image_size:?} in one plane"),
            }
            .into());
        }

        Ok(Self {
            path: descriptor.filename.clone(),
            image_size,
            data_type: descriptor.data_type,
            handles,
            cached: None,
        })
    }

    /// The whole image in local order.
    fn load(&mut self) -> Result<&VoxelBuffer> {
        if self.cached.is_none() {
            let image = to_buffer(decode(&self.path)?)?;
            let expected = plane_shape(&self.image_size);
            if expected != Some((image.size()[0] as u32, image.size()[1] as u32)) {
                return Err(FormatError::InvalidHeader {
                    path: self.path.clone(),
                    message: format!(
                        "image is {:?}, expected {:?}",
                        image.size(),
                        self.image_size
                    ),
                }
                .into());
            }
            self.cached = Some(image.reshape(&self.image_size)?);
        }
        match &self.cached {
            Some(image) => Ok(image),
            None => Err(IoError::Closed(self.path.clone()).into()),
        }
    }

    fn save(&self, image: DynamicImage) -> Result<()> {
        let file = self.handles.create_file_handle(&self.path, FileMode::Write)?;
        let mut writer = BufWriter::new(file);
        image
            .write_with_encoder(TiffEncoder::new(&mut writer))
            .map_err(|e| codec_error(&self.path, e))?;
        writer.flush().map_err(|e| IoError::file(&self.path, e))?;
        Ok(())
    }
}

impl ImageFile for TiffFile {
    fn read_image(&mut self, region: &Region) -> Result<VoxelBuffer> {
        let image_size = self.image_size.clone();
        let image = self.load()?;
        let out_of_range = || GeometryError::OutOfRange {
            start: region.start.clone(),
            size: region.size.clone(),
            image_size: image_size.clone(),
        };
        if region.start.iter().any(|&s| s < 0) || region.size.iter().any(|&s| s < 0) {
            return Err(out_of_range().into());
        }
        let start: Vec<usize> = region.start.iter().map(|&s| s as usize).collect();
        image
            .sub_image(&start, &region.extent())
            .map_err(|_| out_of_range().into())
    }

    fn write_image(&mut self, source: &mut dyn ImageSource, rescale: Option<Limits>) -> Result<()> {
        let (width, height) = plane_shape(&self.image_size).ok_or_else(|| {
            FormatError::Unsupported {
                format: FORMAT_NAME,
                reason: format!("cannot store an image of size {:?}", self.image_size),
            }
        })?;

        let data = source.read_image(&Region::from_size(&self.image_size))?;
        let converted = match rescale {
            Some(limits) => rescale_line(&data, self.data_type, limits),
            None => data.convert(self.data_type),
        };
        let image = to_image(converted, width, height).ok_or_else(|| {
            codec_error(&self.path, "voxel buffer does not match the image size")
        })?;
        self.save(image)?;
        self.close()
    }

    fn close(&mut self) -> Result<()> {
        self.cached = None;
        Ok(())
    }
}
