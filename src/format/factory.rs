//! Creating image files from tile descriptors.

use crate::descriptor::SubImageDescriptor;
use crate::error::Result;
use crate::geometry::Region;
use crate::io::{FileHandleFactory, ImageFile, ImageSource, Limits};
use crate::volume::VoxelBuffer;

use super::{FileFormat, MetaIoFile, TiffFile, VolFile};

// =============================================================================
// FileFactory Trait
// =============================================================================

/// Opens the file behind a tile descriptor.
///
/// Tiles only create files through this trait, which lets tests substitute
/// in-memory files.
pub trait FileFactory: Send + Sync {
    /// Open an existing file for reading.
    fn create_read_file(&self, descriptor: &SubImageDescriptor) -> Result<Box<dyn ImageFile>>;

    /// Create a new file for writing.
    fn create_write_file(&self, descriptor: &SubImageDescriptor) -> Result<Box<dyn ImageFile>>;
}

// =============================================================================
// FormatFile
// =============================================================================

/// An open file of any supported format, one variant per [`FileFormat`].
#[derive(Debug)]
pub enum FormatFile {
    MetaIo(MetaIoFile),
    Vol(VolFile),
    Tiff(TiffFile),
}

impl FormatFile {
    pub fn open_read(descriptor: &SubImageDescriptor, handles: FileHandleFactory) -> Result<Self> {
        Ok(match descriptor.file_format {
            FileFormat::MetaIo => FormatFile::MetaIo(MetaIoFile::open_read(descriptor, handles)?),
            FileFormat::Vol => FormatFile::Vol(VolFile::open_read(descriptor, handles)?),
            FileFormat::Tiff => FormatFile::Tiff(TiffFile::open_read(descriptor, handles)?),
        })
    }

    pub fn create_write(descriptor: &SubImageDescriptor, handles: FileHandleFactory) -> Result<Self> {
        Ok(match descriptor.file_format {
            FileFormat::MetaIo => {
                FormatFile::MetaIo(MetaIoFile::create_write(descriptor, handles)?)
            }
            FileFormat::Vol => FormatFile::Vol(VolFile::create_write(descriptor)?),
            FileFormat::Tiff => FormatFile::Tiff(TiffFile::create_write(descriptor, handles)?),
        })
    }

    pub fn format(&self) -> FileFormat {
        match self {
            FormatFile::MetaIo(_) => FileFormat::MetaIo,
            FormatFile::Vol(_) => FileFormat::Vol,
            FormatFile::Tiff(_) => FileFormat::Tiff,
        }
    }
}

impl ImageFile for FormatFile {
    fn read_image(&mut self, region: &Region) -> Result<VoxelBuffer> {
        match self {
            FormatFile::MetaIo(f) => f.read_image(region),
            FormatFile::Vol(f) => f.read_image(region),
            FormatFile::Tiff(f) => f.read_image(region),
        }
    }

    fn write_image(&mut self, source: &mut dyn ImageSource, rescale: Option<Limits>) -> Result<()> {
        match self {
            FormatFile::MetaIo(f) => f.write_image(source, rescale),
            FormatFile::Vol(f) => f.write_image(source, rescale),
            FormatFile::Tiff(f) => f.write_image(source, rescale),
        }
    }

    fn close(&mut self) -> Result<()> {
        match self {
            FormatFile::MetaIo(f) => f.close(),
            FormatFile::Vol(f) => f.close(),
            FormatFile::Tiff(f) => f.close(),
        }
    }
}

// =============================================================================
// FormatFileFactory
// =============================================================================

/// Creates files of the format named in each descriptor.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatFileFactory {
    handles: FileHandleFactory,
}

impl FormatFileFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handles(handles: FileHandleFactory) -> Self {
        Self { handles }
    }
}

impl FileFactory for FormatFileFactory {
    fn create_read_file(&self, descriptor: &SubImageDescriptor) -> Result<Box<dyn ImageFile>> {
        Ok(Box::new(FormatFile::open_read(descriptor, self.handles)?))
    }

    fn create_write_file(&self, descriptor: &SubImageDescriptor) -> Result<Box<dyn ImageFile>> {
        Ok(Box::new(FormatFile::create_write(descriptor, self.handles)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::SubImageRanges;
    use crate::geometry::Axis;
    use crate::volume::DataType;
    use std::path::PathBuf;

    fn descriptor(path: PathBuf, format: FileFormat) -> SubImageDescriptor {
        SubImageDescriptor {
            filename: path,
            file_format: format,
            data_type: DataType::UChar,
            template: serde_json::Value::Null,
            ranges: SubImageRanges::full(&[2, 2]),
            axis: Axis::identity(2),
            suffix: String::new(),
            index: 0,
            msb: false,
            compression: None,
            voxel_size: Vec::new(),
        }
    }

    #[test]
    fn test_dispatch_by_format() {
        let dir = tempfile::tempdir().unwrap();
        let desc = descriptor(dir.path().join("a.mhd"), FileFormat::MetaIo);
        let file = FormatFile::create_write(&desc, FileHandleFactory::new()).unwrap();
        assert_eq!(file.format(), FileFormat::MetaIo);
        assert!(dir.path().join("a.mhd").exists());

        let desc = descriptor(dir.path().join("a.tiff"), FileFormat::Tiff);
        let file = FormatFile::create_write(&desc, FileHandleFactory::new()).unwrap();
        assert_eq!(file.format(), FileFormat::Tiff);
    }

    #[test]
    fn test_vol_cannot_be_written() {
        let desc = descriptor(PathBuf::from("a.vge"), FileFormat::Vol);
        assert!(FormatFileFactory::new().create_write_file(&desc).is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let desc = descriptor(dir.path().join("missing.mhd"), FileFormat::MetaIo);
        assert!(matches!(
            FormatFileFactory::new().create_read_file(&desc),
            Err(crate::error::SplitError::Io(_))
        ));
    }
}
