//! VGE volumes (`.vge` header, raw `.vol` data). Read only.
//!
//! The header is an ini file. The sections used are:
//!
//! ```text
//!   [VolumeSection0]
//!   volumeresolution = 0.1 0.1 0.1
//!
//!   [VolumeSection0\_FileSection0]
//!   filename = C:\scans\part.vol
//!   filesize = 512 512 300
//!   filedatatype = VolumeDataType_Float
//!   fileendian = VolumeEndian_Little
//!   filefileformat = VolumeFileFormat_Raw
//! ```
//!
//! Only the base name of `filename` is used; the data file is looked up in
//! the parent of the header's directory. Files are stored with global axes
//! 1 and 3 swapped relative to their dimension order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::descriptor::{FileDescriptor, SubImageDescriptor};
use crate::error::{FormatError, IoError, Result};
use crate::geometry::{Axis, Region};
use crate::io::{
    read_image_by_lines, FileHandleFactory, FileMode, FileStreamer, FileWrapper, ImageFile,
    ImageSource, LinearImageFile, Limits,
};
use crate::volume::{ByteOrder, DataType, VoxelBuffer};

use super::FileFormat;

const FORMAT_NAME: &str = "VGE";

const VOLUME_SECTION: &str = "VolumeSection0";
const FILE_SECTION: &str = "VolumeSection0\\_FileSection0";
const RAW_FORMAT: &str = "VolumeFileFormat_Raw";
const LITTLE_ENDIAN: &str = "VolumeEndian_Little";

/// Orientation of every VGE file
const VGE_AXIS: [i32; 3] = [1, 3, 2];

// =============================================================================
// VgeHeader
// =============================================================================

/// Ini sections of a VGE header. Keys are lower case.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VgeHeader {
    sections: HashMap<String, HashMap<String, String>>,
}

impl VgeHeader {
    /// Parse ini text. Comment lines start with `#` or `;`.
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current: Option<String> = None;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let name = name.trim().to_string();
                sections.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }
            let Some((key, value)) = line.split_once(['=', ':']) else {
                return Err(format!("expected 'key = value', found {line:?}"));
            };
            let Some(section) = &current else {
                return Err(format!("key outside of a section: {line:?}"));
            };
            sections
                .entry(section.clone())
                .or_default()
                .insert(key.trim().to_ascii_lowercase(), unquote(value.trim()).to_string());
        }
        Ok(Self { sections })
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| IoError::file(path, e))?;
        Ok(Self::parse(&text).map_err(|message| invalid(path, message))?)
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.get(&key.to_ascii_lowercase()))
            .map(String::as_str)
    }

    fn require(&self, section: &str, key: &str, path: &Path) -> Result<&str, FormatError> {
        self.get(section, key)
            .ok_or_else(|| invalid(path, format!("missing {key} in [{section}]")))
    }

    /// Big-endian unless the file says otherwise.
    pub fn msb(&self) -> bool {
        self.get(FILE_SECTION, "fileendian")
            .is_some_and(|e| !e.is_empty() && e != LITTLE_ENDIAN)
    }

    /// Describe the volume this header belongs to.
    pub fn file_descriptor(&self, path: &Path) -> Result<FileDescriptor> {
        let file_format = self.require(FILE_SECTION, "filefileformat", path)?;
        if file_format != RAW_FORMAT {
            return Err(FormatError::Unsupported {
                format: FORMAT_NAME,
                reason: format!("file format {file_format}"),
            }
            .into());
        }

        let image_size: Vec<usize> = parse_numbers(self.require(FILE_SECTION, "filesize", path)?)
            .ok_or_else(|| invalid(path, "cannot parse filesize"))?;
        let voxel_size: Vec<f64> = match self.get(VOLUME_SECTION, "volumeresolution") {
            Some(value) => {
                parse_numbers(value).ok_or_else(|| invalid(path, "cannot parse volumeresolution"))?
            }
            None => Vec::new(),
        };
        let type_name = self.require(FILE_SECTION, "filedatatype", path)?;
        let data_type =
            DataType::from_vge(type_name).ok_or_else(|| FormatError::UnsupportedDataType {
                data_type: type_name.to_string(),
                format: FORMAT_NAME,
            })?;
        if image_size.len() != VGE_AXIS.len() {
            return Err(invalid(path, "filesize must have three dimensions").into());
        }

        Ok(FileDescriptor {
            file_format: FileFormat::Vol,
            axis: Axis::from_condensed(&VGE_AXIS)?,
            data_type,
            image_size,
            msb: self.msb(),
            compression: None,
            voxel_size,
        })
    }

    /// Path of the raw data file.
    pub fn data_path(&self, header_path: &Path) -> Result<PathBuf> {
        let name = self.require(FILE_SECTION, "filename", header_path)?;
        let base_name = name.rsplit(['/', '\\']).next().unwrap_or(name);
        let header_dir = header_path.parent().unwrap_or(Path::new(""));
        Ok(header_dir.join("..").join(base_name))
    }

    /// The header as nested JSON objects.
    pub fn to_template(&self) -> Value {
        let sections: Map<String, Value> = self
            .sections
            .iter()
            .map(|(name, entries)| {
                let entries: Map<String, Value> = entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect();
                (name.clone(), Value::Object(entries))
            })
            .collect();
        Value::Object(sections)
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn parse_numbers<T: std::str::FromStr>(value: &str) -> Option<Vec<T>> {
    value.split_whitespace().map(|s| s.parse().ok()).collect()
}

fn invalid(path: &Path, message: impl Into<String>) -> FormatError {
    FormatError::InvalidHeader {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

pub(super) fn load_and_parse_header(path: &Path) -> Result<(FileDescriptor, Value)> {
    let header = VgeHeader::read(path)?;
    Ok((header.file_descriptor(path)?, header.to_template()))
}

// =============================================================================
// VolFile
// =============================================================================

/// A VGE volume read one line at a time.
#[derive(Debug)]
pub struct VolFile {
    streamer: FileStreamer,
}

impl VolFile {
    pub fn open_read(descriptor: &SubImageDescriptor, handles: FileHandleFactory) -> Result<Self> {
        let path = &descriptor.filename;
        let header = VgeHeader::read(path)?;
        let file = header.file_descriptor(path)?;
        if file.image_size != descriptor.local_size() {
            return Err(invalid(
                path,
                format!(
                    "filesize {:?} does not match the expected size {:?}",
                    file.image_size,
                    descriptor.local_size()
                ),
            )
            .into());
        }

        let wrapper = FileWrapper::new(header.data_path(path)?, handles, FileMode::Read);
        Ok(Self {
            streamer: FileStreamer::new(
                wrapper,
                file.image_size,
                file.data_type,
                ByteOrder::from_msb(file.msb),
            ),
        })
    }

    fn read_only() -> FormatError {
        FormatError::Unsupported {
            format: FORMAT_NAME,
            reason: "files of this format cannot be written".to_string(),
        }
    }

    /// VGE files cannot be created.
    pub fn create_write(_descriptor: &SubImageDescriptor) -> Result<Self> {
        Err(Self::read_only().into())
    }
}

impl LinearImageFile for VolFile {
    fn image_size(&self) -> &[usize] {
        self.streamer.image_size()
    }

    fn data_type(&self) -> DataType {
        self.streamer.data_type()
    }

    fn read_line(&mut self, start: &[usize], num_voxels: usize) -> Result<VoxelBuffer> {
        self.streamer.read_line(start, num_voxels)
    }

    fn write_line(
        &mut self,
        _start: &[usize],
        _line: &VoxelBuffer,
        _rescale: Option<Limits>,
    ) -> Result<()> {
        Err(Self::read_only().into())
    }

    fn close_file(&mut self) -> Result<()> {
        self.streamer.close()
    }
}

impl ImageFile for VolFile {
    fn read_image(&mut self, region: &Region) -> Result<VoxelBuffer> {
        read_image_by_lines(self, region)
    }

    fn write_image(&mut self, _source: &mut dyn ImageSource, _rescale: Option<Limits>) -> Result<()> {
        Err(Self::read_only().into())
    }

    fn close(&mut self) -> Result<()> {
        self.close_file()
    }
}
