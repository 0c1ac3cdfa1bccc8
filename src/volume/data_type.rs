//! Voxel data types and byte order.
//!
//! Every voxel value in a file is one of a small set of scalar numeric types.
//! `DataType` carries the per-type facts the rest of the crate needs: the
//! storage width, the names used by the MetaIO and VGE header formats, the
//! representable range used when rescaling, and conversion between raw
//! little-endian element bytes and `f64`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// =============================================================================
// ByteOrder
// =============================================================================

/// Byte order of multi-byte voxel values stored in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Least significant byte first
    LittleEndian,
    /// Most significant byte first
    BigEndian,
}

impl ByteOrder {
    /// Byte order from the MSB flag used in descriptors and headers.
    pub fn from_msb(msb: bool) -> Self {
        if msb {
            ByteOrder::BigEndian
        } else {
            ByteOrder::LittleEndian
        }
    }

    /// True if values are stored most significant byte first.
    pub fn is_msb(self) -> bool {
        self == ByteOrder::BigEndian
    }

    /// Convert elements between this byte order and the in-memory
    /// (little-endian) representation. The conversion is its own inverse.
    pub fn swap_in_place(self, data: &mut [u8], bytes_per_voxel: usize) {
        if self == ByteOrder::LittleEndian || bytes_per_voxel < 2 {
            return;
        }
        for element in data.chunks_exact_mut(bytes_per_voxel) {
            element.reverse();
        }
    }
}

// =============================================================================
// DataType
// =============================================================================

/// Scalar type of one voxel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Greyscale unsigned bytes, written as 3-channel colour where the format
    /// supports it
    Rgb,
    Char,
    UChar,
    Short,
    UShort,
    Long,
    ULong,
    LongLong,
    ULongLong,
    Float,
    Double,
}

const ALL_TYPES: [DataType; 11] = [
    DataType::Rgb,
    DataType::Char,
    DataType::UChar,
    DataType::Short,
    DataType::UShort,
    DataType::Long,
    DataType::ULong,
    DataType::LongLong,
    DataType::ULongLong,
    DataType::Float,
    DataType::Double,
];

impl DataType {
    /// Name used in manifests and on the command line.
    pub const fn name(self) -> &'static str {
        match self {
            DataType::Rgb => "rgb",
            DataType::Char => "char",
            DataType::UChar => "uchar",
            DataType::Short => "short",
            DataType::UShort => "ushort",
            DataType::Long => "long",
            DataType::ULong => "ulong",
            DataType::LongLong => "longlong",
            DataType::ULongLong => "ulonglong",
            DataType::Float => "float",
            DataType::Double => "double",
        }
    }

    /// Number of bytes used to store one voxel.
    pub const fn bytes_per_voxel(self) -> usize {
        match self {
            DataType::Rgb | DataType::Char | DataType::UChar => 1,
            DataType::Short | DataType::UShort => 2,
            DataType::Long | DataType::ULong | DataType::Float => 4,
            DataType::LongLong | DataType::ULongLong | DataType::Double => 8,
        }
    }

    /// MetaIO `ElementType` name.
    pub const fn metaio_name(self) -> &'static str {
        match self {
            DataType::Rgb | DataType::UChar => "MET_UCHAR",
            DataType::Char => "MET_CHAR",
            DataType::Short => "MET_SHORT",
            DataType::UShort => "MET_USHORT",
            DataType::Long => "MET_LONG",
            DataType::ULong => "MET_ULONG",
            DataType::LongLong => "MET_LONG_LONG",
            DataType::ULongLong => "MET_ULONG_LONG",
            DataType::Float => "MET_FLOAT",
            DataType::Double => "MET_DOUBLE",
        }
    }

    /// Parse a MetaIO `ElementType`. `MET_INT`/`MET_UINT` are aliases of the
    /// 4-byte long types.
    pub fn from_metaio(name: &str) -> Option<Self> {
        match name.trim() {
            "MET_INT" => Some(DataType::Long),
            "MET_UINT" => Some(DataType::ULong),
            other => ALL_TYPES
                .iter()
                .copied()
                .filter(|t| !t.is_rgb())
                .find(|t| t.metaio_name() == other),
        }
    }

    /// Parse a VGE `FileDataType`.
    pub fn from_vge(name: &str) -> Option<Self> {
        match name.trim() {
            "VolumeDataType_Float" => Some(DataType::Float),
            _ => None,
        }
    }

    pub const fn is_rgb(self) -> bool {
        matches!(self, DataType::Rgb)
    }

    pub const fn is_float(self) -> bool {
        matches!(self, DataType::Float | DataType::Double)
    }

    /// Smallest and largest representable values, or `None` for floating
    /// point types.
    pub fn integer_range(self) -> Option<(f64, f64)> {
        let range = match self {
            DataType::Rgb | DataType::UChar => (u8::MIN as f64, u8::MAX as f64),
            DataType::Char => (i8::MIN as f64, i8::MAX as f64),
            DataType::Short => (i16::MIN as f64, i16::MAX as f64),
            DataType::UShort => (u16::MIN as f64, u16::MAX as f64),
            DataType::Long => (i32::MIN as f64, i32::MAX as f64),
            DataType::ULong => (u32::MIN as f64, u32::MAX as f64),
            DataType::LongLong => (i64::MIN as f64, i64::MAX as f64),
            DataType::ULongLong => (u64::MIN as f64, u64::MAX as f64),
            DataType::Float | DataType::Double => return None,
        };
        Some(range)
    }

    /// Decode one little-endian element.
    ///
    /// # Panics
    /// Panics if `bytes` is shorter than [`DataType::bytes_per_voxel`].
    #[inline]
    pub fn decode(self, bytes: &[u8]) -> f64 {
        match self {
            DataType::Rgb | DataType::UChar => bytes[0] as f64,
            DataType::Char => bytes[0] as i8 as f64,
            DataType::Short => i16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            DataType::UShort => u16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            DataType::Long => i32::from_le_bytes(array4(bytes)) as f64,
            DataType::ULong => u32::from_le_bytes(array4(bytes)) as f64,
            DataType::Float => f32::from_le_bytes(array4(bytes)) as f64,
            DataType::LongLong => i64::from_le_bytes(array8(bytes)) as f64,
            DataType::ULongLong => u64::from_le_bytes(array8(bytes)) as f64,
            DataType::Double => f64::from_le_bytes(array8(bytes)),
        }
    }

    /// Encode one value as a little-endian element. Integer types round half
    /// to even and saturate at the type limits.
    #[inline]
    pub fn encode(self, value: f64, out: &mut [u8]) {
        let n = self.bytes_per_voxel();
        let rounded = value.round_ties_even();
        match self {
            DataType::Rgb | DataType::UChar => out[0] = rounded as u8,
            DataType::Char => out[0] = (rounded as i8) as u8,
            DataType::Short => out[..n].copy_from_slice(&(rounded as i16).to_le_bytes()),
            DataType::UShort => out[..n].copy_from_slice(&(rounded as u16).to_le_bytes()),
            DataType::Long => out[..n].copy_from_slice(&(rounded as i32).to_le_bytes()),
            DataType::ULong => out[..n].copy_from_slice(&(rounded as u32).to_le_bytes()),
            DataType::LongLong => out[..n].copy_from_slice(&(rounded as i64).to_le_bytes()),
            DataType::ULongLong => out[..n].copy_from_slice(&(rounded as u64).to_le_bytes()),
            DataType::Float => out[..n].copy_from_slice(&(value as f32).to_le_bytes()),
            DataType::Double => out[..n].copy_from_slice(&value.to_le_bytes()),
        }
    }
}

#[inline]
fn array4(bytes: &[u8]) -> [u8; 4] {
    [bytes[0], bytes[1], bytes[2], bytes[3]]
}

#[inline]
fn array8(bytes: &[u8]) -> [u8; 8] {
    [
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ]
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        ALL_TYPES
            .iter()
            .copied()
            .find(|t| t.name() == lower)
            .ok_or_else(|| ConfigError::UnknownDataType(s.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================
