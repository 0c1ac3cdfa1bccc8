//! File format adapters.
//!
//! Each supported format provides header parsing and an [`ImageFile`]
//! implementation. The core only sees formats through [`FileFactory`] and
//! the [`FileDescriptor`] returned by [`load_and_parse_header`].
//!
//! | Format | Headers         | Access          | Write |
//! |--------|-----------------|-----------------|-------|
//! | MetaIO | `.mhd`, `.mha`  | line streaming  | yes   |
//! | VGE    | `.vge`          | line streaming  | no    |
//! | TIFF   | `.tif`, `.tiff` | whole 2-D image | yes   |
//!
//! [`ImageFile`]: crate::io::ImageFile

mod factory;
mod metaio;
mod tiff;
mod vol;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::descriptor::FileDescriptor;
use crate::error::{FormatError, Result};

pub use factory::{FileFactory, FormatFile, FormatFileFactory};
pub use metaio::{MetaIoFile, MetaIoHeader};
pub use tiff::TiffFile;
pub use vol::{VgeHeader, VolFile};

// =============================================================================
// FileFormat
// =============================================================================

/// Supported image file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// MetaIO header with raw data (`.mhd`/`.mha`)
    MetaIo,

    /// VGE ini header with a raw `.vol` file
    Vol,

    /// Single-page greyscale or colour TIFF
    Tiff,
}

impl FileFormat {
    /// Canonical name, as stored in manifests.
    pub const fn name(self) -> &'static str {
        match self {
            FileFormat::MetaIo => "mhd",
            FileFormat::Vol => "vol",
            FileFormat::Tiff => "tiff",
        }
    }

    /// Normalise a user-supplied format name or extension.
    pub fn simplify(name: &str) -> Result<Self, FormatError> {
        let lower = name.trim().trim_start_matches('.').to_ascii_lowercase();
        match lower.as_str() {
            "mhd" | "mha" | "metaio" => Ok(FileFormat::MetaIo),
            "vol" | "vge" => Ok(FileFormat::Vol),
            "tif" | "tiff" => Ok(FileFormat::Tiff),
            _ => Err(FormatError::UnknownFormat(name.to_string())),
        }
    }

    /// Format of a header file with the given extension.
    pub fn from_extension(extension: &str) -> Result<Self, FormatError> {
        let lower = extension.trim_start_matches('.').to_ascii_lowercase();
        match lower.as_str() {
            "mhd" | "mha" => Ok(FileFormat::MetaIo),
            "vge" => Ok(FileFormat::Vol),
            "tif" | "tiff" => Ok(FileFormat::Tiff),
            _ => Err(FormatError::UnknownFormat(extension.to_string())),
        }
    }

    /// Format of a header file, from its extension.
    pub fn from_path(path: &Path) -> Result<Self, FormatError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| FormatError::UnknownFormat(path.display().to_string()))?;
        Self::from_extension(extension)
    }

    /// Extension for newly written files of this format.
    pub fn extension(self) -> Result<&'static str, FormatError> {
        match self {
            FileFormat::MetaIo => Ok(".mhd"),
            FileFormat::Tiff => Ok(".tiff"),
            FileFormat::Vol => Err(FormatError::Unsupported {
                format: self.name(),
                reason: "files of this format cannot be written".to_string(),
            }),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FileFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::simplify(s)
    }
}

impl Serialize for FileFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for FileFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Self::simplify(&name).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Header loading
// =============================================================================

/// Read the header of any supported file.
///
/// Returns what the core needs to know about the file, and the header itself
/// as a JSON template for files written from it.
pub fn load_and_parse_header(path: &Path) -> Result<(FileDescriptor, Value)> {
    match FileFormat::from_path(path)? {
        FileFormat::MetaIo => metaio::load_and_parse_header(path),
        FileFormat::Vol => vol::load_and_parse_header(path),
        FileFormat::Tiff => tiff::load_and_parse_header(path),
    }
}
