//! Describing input files that come without a manifest.
//!
//! A single file becomes one tile covering the whole volume. A numbered
//! series (`scan0001.mhd`, `scan0002.mhd`, ...) becomes one tile per file,
//! stacked along the last global dimension:
//!
//! ```text
//!   scan0001  [0, 9]     ─┐
//!   scan0002  [10, 19]    ├─ one volume of depth 30
//!   scan0003  [20, 29]   ─┘
//! ```

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{GeometryError, Result};
use crate::format::{self, FileFormat};

use super::{GlobalDescriptor, SubImageDescriptor, SubImageRanges};

/// Widest zero padding tried when looking for a numbered series
const MAX_SERIES_WIDTH: usize = 10;

/// Tiles and global description of a set of input files.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSet {
    /// Header of the first file, with its size updated to the whole volume
    pub template: Value,
    pub descriptors: Vec<SubImageDescriptor>,
    pub global: GlobalDescriptor,
}

/// Describe `input`, or the numbered series starting at `start_index`.
pub fn generate_input_descriptors(input: &Path, start_index: Option<usize>) -> Result<InputSet> {
    let series = match start_index {
        None => None,
        Some(start) => {
            let width = find_series_width(input, start)
                .ok_or_else(|| missing_series(&series_filename(input, start, 0)))?;
            Some((start, width))
        }
    };

    let mut descriptors: Vec<SubImageDescriptor> = Vec::new();
    let mut template = Value::Null;
    let mut full_size: Vec<usize> = Vec::new();
    let mut index = series.map_or(0, |(start, _)| start);

    loop {
        let (filename, suffix) = match series {
            None => (input.to_path_buf(), String::new()),
            Some((_, width)) => (
                series_filename(input, index, width),
                format!("{index:0width$}"),
            ),
        };
        if series.is_some() && !descriptors.is_empty() && !filename.is_file() {
            break;
        }

        let (file, header) = format::load_and_parse_header(&filename)?;
        let size = file.global_size();
        let Some(last) = size.len().checked_sub(1) else {
            return Err(GeometryError::InvalidImageSize(Vec::new()).into());
        };

        let mut ranges = SubImageRanges::full(&size).ranges().to_vec();
        if descriptors.is_empty() {
            full_size = size.clone();
            template = header;
        } else {
            let compatible =
                size.len() == full_size.len() && size[..last] == full_size[..last];
            if !compatible {
                return Err(GeometryError::SeriesMismatch {
                    filename: filename.display().to_string(),
                    size,
                    expected: full_size,
                }
                .into());
            }
            ranges[last][0] = full_size[last] as i64;
            ranges[last][1] = (full_size[last] + size[last]) as i64 - 1;
            full_size[last] += size[last];
        }

        descriptors.push(SubImageDescriptor {
            filename,
            file_format: file.file_format,
            data_type: file.data_type,
            template: template.clone(),
            ranges: SubImageRanges::new(ranges)?,
            axis: file.axis.clone(),
            suffix,
            index,
            msb: file.msb,
            compression: file.compression.clone(),
            voxel_size: file.global_voxel_size(),
        });

        if series.is_none() {
            break;
        }
        index += 1;
    }

    let first = &descriptors[0];
    let global = GlobalDescriptor {
        size: full_size.clone(),
        axis: first.axis.clone(),
        data_type: first.data_type,
        msb: first.msb,
        voxel_size: first.voxel_size.clone(),
        file_format: first.file_format,
    };
    update_template_size(&mut template, &full_size, first.file_format);

    Ok(InputSet {
        template,
        descriptors,
        global,
    })
}

/// Zero-padding width of the series file with index `start_index`, trying
/// the widest padding first.
pub fn find_series_width(input: &Path, start_index: usize) -> Option<usize> {
    (0..=MAX_SERIES_WIDTH)
        .rev()
        .find(|&width| series_filename(input, start_index, width).is_file())
}

/// `base{index:0width}{ext}` for an input named `base{ext}`.
fn series_filename(input: &Path, index: usize, width: usize) -> PathBuf {
    let mut name = input.with_extension("").into_os_string();
    name.push(format!("{index:0width$}"));
    if let Some(extension) = input.extension() {
        name.push(".");
        name.push(extension);
    }
    PathBuf::from(name)
}

fn missing_series(first: &Path) -> crate::error::SplitError {
    crate::error::IoError::file(
        first,
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no file series found starting with this file",
        ),
    )
    .into()
}

/// Record the combined size in a MetaIO template.
fn update_template_size(template: &mut Value, size: &[usize], file_format: FileFormat) {
    if file_format != FileFormat::MetaIo {
        return;
    }
    if let Value::Object(map) = template {
        let dims: Vec<String> = size.iter().map(ToString::to_string).collect();
        map.insert("DimSize".to_string(), Value::String(dims.join(" ")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_filename() {
        assert_eq!(
            series_filename(Path::new("data/scan.mhd"), 7, 4),
            PathBuf::from("data/scan0007.mhd")
        );
        assert_eq!(
            series_filename(Path::new("data/scan.mhd"), 12, 0),
            PathBuf::from("data/scan12.mhd")
        );
    }

    #[test]
    fn test_find_series_width() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("scan003.mhd"), "").unwrap();
        let input = dir.path().join("scan.mhd");
        assert_eq!(find_series_width(&input, 3), Some(3));
        assert_eq!(find_series_width(&input, 4), None);
    }

    #[test]
    fn test_missing_series_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = generate_input_descriptors(&dir.path().join("scan.mhd"), Some(1));
        assert!(matches!(result, Err(crate::error::SplitError::Io(_))));
    }

    #[test]
    fn test_update_template_size() {
        let mut template = serde_json::json!({"DimSize": "4 4 2", "Comment": "x"});
        update_template_size(&mut template, &[4, 4, 6], FileFormat::MetaIo);
        assert_eq!(template["DimSize"], "4 4 6");
        assert_eq!(template["Comment"], "x");
    }
}
