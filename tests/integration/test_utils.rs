//! Test utilities for integration tests.
//!
//! Helpers for writing small MetaIO volumes to scratch directories and
//! reading back the raw voxel data of the files a pipeline produced.

use std::path::{Path, PathBuf};

use voxel_split::{DataType, VoxelBuffer};

/// Values `0, 1, 2, ...` for a volume of `size`, wrapped into the range of
/// `data_type` for small integer types.
pub fn sequential_values(size: &[usize], data_type: DataType) -> Vec<f64> {
    let n: usize = size.iter().product();
    let modulus = match data_type {
        DataType::UChar | DataType::Rgb => 256,
        DataType::Char => 128,
        _ => usize::MAX,
    };
    (0..n).map(|v| (v % modulus) as f64).collect()
}

/// Write a MetaIO header and raw file named `name` in `dir`.
///
/// `values` are in file order, dimension 0 fastest. Returns the header
/// path.
pub fn write_metaio(
    dir: &Path,
    name: &str,
    size: &[usize],
    data_type: DataType,
    values: &[f64],
) -> PathBuf {
    let header = dir.join(format!("{name}.mhd"));
    let raw_name = format!("{name}.raw");
    let dims: Vec<String> = size.iter().map(ToString::to_string).collect();
    let text = format!(
        "ObjectType = Image\n\
         NDims = {}\n\
         BinaryData = True\n\
         BinaryDataByteOrderMSB = False\n\
         ElementSpacing = {}\n\
         DimSize = {}\n\
         ElementType = {}\n\
         ElementDataFile = {}\n",
        size.len(),
        vec!["1"; size.len()].join(" "),
        dims.join(" "),
        data_type.metaio_name(),
        raw_name
    );
    std::fs::write(&header, text).unwrap();

    let buffer = VoxelBuffer::from_values(size, data_type, values).unwrap();
    std::fs::write(dir.join(raw_name), buffer.as_bytes()).unwrap();
    header
}

/// Raw data file written next to a MetaIO header.
pub fn raw_path(header: &Path) -> PathBuf {
    header.with_extension("raw")
}

/// Contents of the raw data file of a MetaIO header.
pub fn read_raw(header: &Path) -> Vec<u8> {
    std::fs::read(raw_path(header)).unwrap()
}

/// Value of a key in a MetaIO header, if present.
pub fn header_value(header: &Path, key: &str) -> Option<String> {
    let text = std::fs::read_to_string(header).unwrap();
    text.lines().find_map(|line| {
        let (k, v) = line.split_once('=')?;
        (k.trim() == key).then(|| v.trim().to_string())
    })
}
