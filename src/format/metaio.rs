//! MetaIO (`.mhd`/`.mha`) images.
//!
//! A MetaIO header is a list of `Key = Value` lines. The voxels live in the
//! raw file named by `ElementDataFile`, or directly after the header when
//! that key is `LOCAL`:
//!
//! ```text
//!   ObjectType = Image
//!   NDims = 3
//!   BinaryDataByteOrderMSB = False
//!   TransformMatrix = 1 0 0 0 1 0 0 0 1
//!   DimSize = 256 256 120
//!   ElementType = MET_SHORT
//!   ElementDataFile = scan.raw        <- always the last key
//! ```
//!
//! The orientation of the file relative to the global volume is read from
//! `TransformMatrix`, falling back to `AnatomicalOrientation`. Column `l`
//! of the matrix holds a single non-zero entry in row `g` when local
//! dimension `l` runs along global dimension `g`; a negative entry means the
//! dimension is flipped.

use std::fmt::Display;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::descriptor::{FileDescriptor, SubImageDescriptor};
use crate::error::{FormatError, IoError, Result};
use crate::geometry::{Axis, Region};
use crate::io::{
    read_image_by_lines, write_image_by_lines, FileHandleFactory, FileMode, FileStreamer,
    FileWrapper, ImageFile, ImageSource, LinearImageFile, Limits,
};
use crate::volume::{ByteOrder, DataType, VoxelBuffer};

use super::FileFormat;

const FORMAT_NAME: &str = "MetaIO";

/// Data stored after the header in the same file
const LOCAL_DATA: &str = "LOCAL";

const ELEMENT_DATA_FILE: &str = "ElementDataFile";

/// Longest header accepted before `ElementDataFile` is found
const MAX_HEADER_BYTES: u64 = 1 << 20;

/// Order in which known keys are written.
const CANONICAL_KEYS: [&str; 22] = [
    "ObjectType",
    "NDims",
    "BinaryData",
    "BinaryDataByteOrderMSB",
    "CompressedData",
    "CompressedDataSize",
    "TransformMatrix",
    "Offset",
    "CenterOfRotation",
    "AnatomicalOrientation",
    "ElementSpacing",
    "DimSize",
    "ElementNumberOfChannels",
    "ElementSize",
    "ElementType",
    ELEMENT_DATA_FILE,
    "Comment",
    "SeriesDescription",
    "AcquisitionDate",
    "AcquisitionTime",
    "StudyDate",
    "StudyTime",
];

/// Descriptive keys copied from the source header into every output header.
const PASS_THROUGH_KEYS: [&str; 6] = [
    "Comment",
    "SeriesDescription",
    "AcquisitionDate",
    "AcquisitionTime",
    "StudyDate",
    "StudyTime",
];

// =============================================================================
// MetaIoHeader
// =============================================================================

/// Parsed MetaIO header, keys in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetaIoHeader {
    entries: Vec<(String, String)>,
}

impl MetaIoHeader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse header text. Parsing stops after `ElementDataFile`.
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        let mut header = Self::new();
        for line in text.lines() {
            if header.push_line(line)? {
                break;
            }
        }
        Ok(header)
    }

    /// Read the header of `path`.
    ///
    /// Also returns the byte offset just past the header, where `LOCAL`
    /// voxel data begins.
    pub fn read(path: &Path) -> Result<(Self, u64)> {
        let file = std::fs::File::open(path).map_err(|e| IoError::file(path, e))?;
        let mut reader = BufReader::new(file);
        let mut header = Self::new();
        let mut offset = 0u64;
        let mut line = Vec::new();
        loop {
            line.clear();
            let read = (&mut reader)
                .take(MAX_HEADER_BYTES - offset + 1)
                .read_until(b'\n', &mut line)
                .map_err(|e| IoError::file(path, e))?;
            if read == 0 {
                break;
            }
            offset += read as u64;
            if offset > MAX_HEADER_BYTES {
                let message = format!("header longer than {MAX_HEADER_BYTES} bytes");
                return Err(invalid(path, message).into());
            }
            let text = std::str::from_utf8(&line).map_err(|_| invalid(path, "header is not text"))?;
            if header.push_line(text).map_err(|message| invalid(path, message))? {
                break;
            }
        }
        Ok((header, offset))
    }

    /// Add one `Key = Value` line. Returns true once `ElementDataFile` has
    /// been seen.
    fn push_line(&mut self, line: &str) -> std::result::Result<bool, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(false);
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(format!("expected 'Key = Value', found {line:?}"));
        };
        let key = key.trim();
        self.set(key, value.trim());
        Ok(key == ELEMENT_DATA_FILE)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set a key, keeping its position if already present.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    /// Header text with known keys in canonical order, then any other keys,
    /// and `ElementDataFile` last.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        let mut push = |key: &str, value: &str| {
            text.push_str(key);
            text.push_str(" = ");
            text.push_str(value);
            text.push('\n');
        };
        for key in CANONICAL_KEYS.iter().filter(|&&k| k != ELEMENT_DATA_FILE) {
            if let Some(value) = self.get(key) {
                push(key, value);
            }
        }
        for (key, value) in &self.entries {
            if !CANONICAL_KEYS.contains(&key.as_str()) {
                push(key, value);
            }
        }
        if let Some(value) = self.get(ELEMENT_DATA_FILE) {
            push(ELEMENT_DATA_FILE, value);
        }
        text
    }

    /// The header as a JSON object of strings.
    pub fn to_template(&self) -> Value {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(map)
    }

    fn flag(&self, key: &str) -> bool {
        self.get(key)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    fn numbers<T: FromStr>(&self, key: &str, path: &Path) -> Result<Option<Vec<T>>> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        value
            .split_whitespace()
            .map(|s| s.parse::<T>())
            .collect::<std::result::Result<Vec<T>, _>>()
            .map(Some)
            .map_err(|_| invalid(path, format!("cannot parse {key} = {value}")).into())
    }

    /// Describe the file this header belongs to.
    pub fn file_descriptor(&self, path: &Path) -> Result<FileDescriptor> {
        let image_size: Vec<usize> = self
            .numbers(DIM_SIZE, path)?
            .ok_or_else(|| invalid(path, "missing DimSize"))?;
        if image_size.is_empty() {
            return Err(invalid(path, "empty DimSize").into());
        }
        let element_type = self
            .get("ElementType")
            .ok_or_else(|| invalid(path, "missing ElementType"))?;
        let data_type = DataType::from_metaio(element_type).ok_or_else(|| {
            FormatError::UnsupportedDataType {
                data_type: element_type.to_string(),
                format: FORMAT_NAME,
            }
        })?;
        let voxel_size = match self.numbers::<f64>("ElementSize", path)? {
            Some(size) => size,
            None => self.numbers("ElementSpacing", path)?.unwrap_or_default(),
        };

        Ok(FileDescriptor {
            file_format: FileFormat::MetaIo,
            axis: self.axis(image_size.len(), path)?,
            data_type,
            image_size,
            msb: self.flag("BinaryDataByteOrderMSB"),
            compression: None,
            voxel_size,
        })
    }

    /// Orientation from `TransformMatrix` or `AnatomicalOrientation`.
    pub fn axis(&self, num_dims: usize, path: &Path) -> Result<Axis> {
        if let Some(matrix) = self.numbers::<f64>("TransformMatrix", path)? {
            if matrix.len() != num_dims * num_dims {
                return Err(invalid(path, "TransformMatrix does not match NDims").into());
            }
            return cosines_to_axis(&matrix, num_dims)
                .ok_or_else(|| invalid(path, "TransformMatrix is not a permutation").into());
        }
        if let Some(orientation) = self.get("AnatomicalOrientation") {
            let rows = orientation
                .chars()
                .map(anatomical_to_cosine)
                .collect::<Option<Vec<[f64; 3]>>>()
                .ok_or_else(|| invalid(path, format!("unknown orientation {orientation}")))?;
            if rows.len() != 3 || num_dims != 3 {
                return Err(invalid(path, "AnatomicalOrientation needs 3 dimensions").into());
            }
            let matrix: Vec<f64> = rows.concat();
            return cosines_to_axis(&matrix, 3)
                .ok_or_else(|| invalid(path, "AnatomicalOrientation is not a permutation").into());
        }
        Ok(Axis::identity(num_dims))
    }
}

const DIM_SIZE: &str = "DimSize";

fn invalid(path: &Path, message: impl Into<String>) -> FormatError {
    FormatError::InvalidHeader {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

fn anatomical_to_cosine(c: char) -> Option<[f64; 3]> {
    match c.to_ascii_uppercase() {
        'R' => Some([1.0, 0.0, 0.0]),
        'L' => Some([-1.0, 0.0, 0.0]),
        'A' => Some([0.0, 1.0, 0.0]),
        'P' => Some([0.0, -1.0, 0.0]),
        'I' => Some([0.0, 0.0, 1.0]),
        'S' => Some([0.0, 0.0, -1.0]),
        _ => None,
    }
}

/// Axis of a row-major `n x n` direction matrix.
fn cosines_to_axis(matrix: &[f64], n: usize) -> Option<Axis> {
    let mut dim_order = Vec::with_capacity(n);
    let mut dim_flip = Vec::with_capacity(n);
    for local in 0..n {
        let global = (0..n).max_by(|&a, &b| {
            matrix[a * n + local]
                .abs()
                .total_cmp(&matrix[b * n + local].abs())
        })?;
        dim_order.push(global);
        dim_flip.push(matrix[global * n + local] < 0.0);
    }
    Axis::new(dim_order, dim_flip).ok()
}

/// Row-major direction matrix of an axis.
fn axis_to_cosines(axis: &Axis) -> Vec<i32> {
    let n = axis.num_dims();
    let mut matrix = vec![0; n * n];
    for (local, (&global, &flip)) in axis.dim_order().iter().zip(axis.dim_flip()).enumerate() {
        matrix[global * n + local] = if flip { -1 } else { 1 };
    }
    matrix
}

fn join<T: Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn bool_name(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Header for writing the tile described by `descriptor`.
fn header_for(descriptor: &SubImageDescriptor, data_file: &str) -> MetaIoHeader {
    let local_size = descriptor.local_size();
    let voxel_size = descriptor.local_voxel_size();
    let offset: Vec<f64> = descriptor
        .local_origin()
        .iter()
        .zip(&voxel_size)
        .map(|(&o, &v)| o as f64 * v)
        .collect();

    let mut header = MetaIoHeader::new();
    header.set("ObjectType", "Image");
    header.set("NDims", local_size.len().to_string());
    header.set("BinaryData", "True");
    header.set("BinaryDataByteOrderMSB", bool_name(descriptor.msb));
    header.set("CompressedData", "False");
    header.set("TransformMatrix", join(&axis_to_cosines(&descriptor.axis)));
    header.set("Offset", join(&offset));
    header.set("ElementSpacing", join(&voxel_size));
    header.set(DIM_SIZE, join(&local_size));
    header.set("ElementSize", join(&voxel_size));
    header.set("ElementType", descriptor.data_type.metaio_name());
    header.set(ELEMENT_DATA_FILE, data_file);

    if let Value::Object(template) = &descriptor.template {
        for key in PASS_THROUGH_KEYS {
            if let Some(Value::String(value)) = template.get(key) {
                header.set(key, value.as_str());
            }
        }
    }
    header
}

/// Read a MetaIO header and describe the file.
pub(super) fn load_and_parse_header(path: &Path) -> Result<(FileDescriptor, Value)> {
    let (header, _) = MetaIoHeader::read(path)?;
    Ok((header.file_descriptor(path)?, header.to_template()))
}

// =============================================================================
// MetaIoFile
// =============================================================================

/// A MetaIO image, read or written one line at a time.
#[derive(Debug)]
pub struct MetaIoFile {
    header_path: PathBuf,
    streamer: FileStreamer,
}

impl MetaIoFile {
    /// Open an existing image for reading.
    pub fn open_read(descriptor: &SubImageDescriptor, handles: FileHandleFactory) -> Result<Self> {
        let path = &descriptor.filename;
        let (header, header_end) = MetaIoHeader::read(path)?;
        let file = header.file_descriptor(path)?;

        if header.flag("CompressedData") {
            return Err(FormatError::UnsupportedCompression {
                compression: "zlib".to_string(),
                format: FORMAT_NAME,
            }
            .into());
        }
        if let Some(channels) = header.numbers::<usize>("ElementNumberOfChannels", path)? {
            if channels.iter().any(|&c| c != 1) {
                return Err(FormatError::Unsupported {
                    format: FORMAT_NAME,
                    reason: "images with more than one channel".to_string(),
                }
                .into());
            }
        }
        if file.image_size != descriptor.local_size() {
            return Err(invalid(
                path,
                format!(
                    "DimSize {:?} does not match the expected size {:?}",
                    file.image_size,
                    descriptor.local_size()
                ),
            )
            .into());
        }

        let data_file = header
            .get(ELEMENT_DATA_FILE)
            .ok_or_else(|| invalid(path, "missing ElementDataFile"))?;
        let (data_path, data_offset) = if data_file == LOCAL_DATA {
            (path.clone(), header_end)
        } else if data_file.starts_with("LIST") || data_file.contains('%') {
            return Err(FormatError::Unsupported {
                format: FORMAT_NAME,
                reason: "data split across multiple files".to_string(),
            }
            .into());
        } else {
            (header_dir(path).join(data_file), 0)
        };

        let wrapper = FileWrapper::new(data_path, handles, FileMode::Read);
        let streamer = FileStreamer::new(
            wrapper,
            file.image_size,
            file.data_type,
            ByteOrder::from_msb(file.msb),
        )
        .with_data_offset(data_offset);

        Ok(Self {
            header_path: path.clone(),
            streamer,
        })
    }

    /// Write the header for a new image. The raw data file takes the
    /// header's name with a `.raw` extension.
    pub fn create_write(
        descriptor: &SubImageDescriptor,
        handles: FileHandleFactory,
    ) -> Result<Self> {
        if let Some(compression) = &descriptor.compression {
            if !compression.eq_ignore_ascii_case("none") {
                return Err(FormatError::UnsupportedCompression {
                    compression: compression.clone(),
                    format: FORMAT_NAME,
                }
                .into());
            }
        }

        let path = &descriptor.filename;
        let data_path = path.with_extension("raw");
        let data_file = data_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| invalid(path, "header path has no file name"))?;

        let header = header_for(descriptor, &data_file);
        let mut file = handles.create_file_handle(path, FileMode::Write)?;
        file.write_all(header.to_text().as_bytes())
            .map_err(|e| IoError::file(path, e))?;

        let wrapper = FileWrapper::new(data_path, handles, FileMode::Write);
        let streamer = FileStreamer::new(
            wrapper,
            descriptor.local_size(),
            descriptor.data_type,
            descriptor.byte_order(),
        );
        Ok(Self {
            header_path: path.clone(),
            streamer,
        })
    }

    pub fn header_path(&self) -> &Path {
        &self.header_path
    }
}

fn header_dir(path: &Path) -> &Path {
    path.parent().unwrap_or(Path::new(""))
}

impl LinearImageFile for MetaIoFile {
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
        start: &[usize],
        line: &VoxelBuffer,
        rescale: Option<Limits>,
    ) -> Result<()> {
        self.streamer.write_line(start, line, rescale)
    }

    fn close_file(&mut self) -> Result<()> {
        self.streamer.close()
    }
}

impl ImageFile for MetaIoFile {
    fn read_image(&mut self, region: &Region) -> Result<VoxelBuffer> {
        read_image_by_lines(self, region)
    }

    fn write_image(&mut self, source: &mut dyn ImageSource, rescale: Option<Limits>) -> Result<()> {
        write_image_by_lines(self, source, rescale)
    }

    fn close(&mut self) -> Result<()> {
        self.close_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::SubImageRanges;

    const HEADER: &str = "ObjectType = Image\n\
        NDims = 3\n\
        BinaryData = True\n\
        BinaryDataByteOrderMSB = False\n\
        TransformMatrix = 0 1 0 1 0 0 0 0 -1\n\
        DimSize = 4 3 2\n\
        ElementSpacing = 0.5 0.5 2\n\
        ElementType = MET_USHORT\n\
        Comment = phantom\n\
        ElementDataFile = scan.raw\n";

    fn descriptor(filename: PathBuf, axis: &[i32], size: &[usize]) -> SubImageDescriptor {
        SubImageDescriptor {
            filename,
            file_format: FileFormat::MetaIo,
            data_type: DataType::Short,
            template: serde_json::json!({"Comment": "phantom", "NDims": "7"}),
            ranges: SubImageRanges::full(size),
            axis: Axis::from_condensed(axis).unwrap(),
            suffix: String::new(),
            index: 0,
            msb: false,
            compression: None,
            voxel_size: vec![1.0; size.len()],
        }
    }

    #[test]
    fn test_parse_header() {
        let header = MetaIoHeader::parse(HEADER).unwrap();
        let file = header.file_descriptor(Path::new("scan.mhd")).unwrap();
        assert_eq!(file.image_size, vec![4, 3, 2]);
        assert_eq!(file.data_type, DataType::UShort);
        assert!(!file.msb);
        assert_eq!(file.voxel_size, vec![0.5, 0.5, 2.0]);
        assert_eq!(file.axis.to_condensed(), vec![2, 1, -3]);
        assert_eq!(file.global_size(), vec![3, 4, 2]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(MetaIoHeader::parse("NDims 3\n").is_err());
    }

    #[test]
    fn test_anatomical_orientation() {
        let header = MetaIoHeader::parse(
            "NDims = 3\nAnatomicalOrientation = LAI\nDimSize = 2 2 2\nElementType = MET_UCHAR\n",
        )
        .unwrap();
        let axis = header.axis(3, Path::new("a.mhd")).unwrap();
        assert_eq!(axis.to_condensed(), vec![-1, 2, 3]);
    }

    #[test]
    fn test_no_orientation_is_identity() {
        let header = MetaIoHeader::parse("DimSize = 2 2\nElementType = MET_UCHAR\n").unwrap();
        let file = header.file_descriptor(Path::new("a.mhd")).unwrap();
        assert!(file.axis.is_identity());
        assert!(file.voxel_size.is_empty());
    }

    #[test]
    fn test_cosines_round_trip() {
        for condensed in [vec![1, 2, 3], vec![2, -3, 1], vec![-3, 1, -2], vec![2, -1]] {
            let axis = Axis::from_condensed(&condensed).unwrap();
            let matrix: Vec<f64> = axis_to_cosines(&axis).iter().map(|&v| v as f64).collect();
            assert_eq!(cosines_to_axis(&matrix, condensed.len()).unwrap(), axis);
        }
    }

    #[test]
    fn test_header_text_order() {
        let mut header = MetaIoHeader::parse(HEADER).unwrap();
        header.set("Origin", "0 0 0");
        let text = header.to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ObjectType = Image");
        assert_eq!(lines.last(), Some(&"ElementDataFile = scan.raw"));
        let spacing = lines.iter().position(|l| l.starts_with("ElementSpacing")).unwrap();
        let dims = lines.iter().position(|l| l.starts_with("DimSize")).unwrap();
        let origin = lines.iter().position(|l| l.starts_with("Origin")).unwrap();
        assert!(spacing < dims);
        assert!(dims < origin);
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.mhd");
        let desc = descriptor(path.clone(), &[2, -1], &[3, 2]);

        let mut file = MetaIoFile::create_write(&desc, FileHandleFactory::new()).unwrap();
        let line = VoxelBuffer::from_values(&[2], DataType::Short, &[-5.0, 7.0]).unwrap();
        file.write_line(&[0, 0], &line, None).unwrap();
        file.write_line(&[0, 1], &line, None).unwrap();
        file.write_line(&[0, 2], &line, None).unwrap();
        file.close().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("DimSize = 2 3\n"));
        assert!(text.contains("TransformMatrix = 0 -1 1 0\n"));
        assert!(text.contains("Comment = phantom\n"));
        assert!(text.contains("NDims = 2\n"));
        assert!(text.ends_with("ElementDataFile = tile.raw\n"));
        assert_eq!(std::fs::metadata(dir.path().join("tile.raw")).unwrap().len(), 12);

        let (file_desc, _) = load_and_parse_header(&path).unwrap();
        assert_eq!(file_desc.axis.to_condensed(), vec![2, -1]);

        let mut file = MetaIoFile::open_read(&desc, FileHandleFactory::new()).unwrap();
        let image = file.read_image(&Region::new(vec![0, 1], vec![2, 2])).unwrap();
        assert_eq!(image.to_values(), vec![-5.0, 7.0, -5.0, 7.0]);
    }

    #[test]
    fn test_local_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.mha");
        let mut contents =
            b"NDims = 2\nDimSize = 2 2\nElementType = MET_UCHAR\nElementDataFile = LOCAL\n"
                .to_vec();
        contents.extend_from_slice(&[1, 2, 3, 4]);
        std::fs::write(&path, contents).unwrap();

        let desc = descriptor(path, &[1, 2], &[2, 2]);
        let mut file = MetaIoFile::open_read(&desc, FileHandleFactory::new()).unwrap();
        let image = file.read_image(&Region::new(vec![0, 0], vec![2, 2])).unwrap();
        assert_eq!(image.to_values(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_unbounded_header_rejected() {
        // Raw voxel data with no line breaks is not read into memory whole
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("volume.mhd");
        std::fs::write(&path, vec![b'7'; (MAX_HEADER_BYTES + 4096) as usize]).unwrap();
        assert!(matches!(
            MetaIoHeader::read(&path),
            Err(crate::error::SplitError::Format(FormatError::InvalidHeader { .. }))
        ));
    }

    #[test]
    fn test_compressed_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.mhd");
        std::fs::write(
            &path,
            "NDims = 1\nCompressedData = True\nDimSize = 4\nElementType = MET_UCHAR\nElementDataFile = scan.zraw\n",
        )
        .unwrap();
        let desc = descriptor(path, &[1], &[4]);
        assert!(matches!(
            MetaIoFile::open_read(&desc, FileHandleFactory::new()),
            Err(crate::error::SplitError::Format(
                FormatError::UnsupportedCompression { .. }
            ))
        ));
    }

    #[test]
    fn test_write_compression_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut desc = descriptor(dir.path().join("t.mhd"), &[1], &[4]);
        desc.compression = Some("default".to_string());
        assert!(MetaIoFile::create_write(&desc, FileHandleFactory::new()).is_err());
        assert!(!dir.path().join("t.mhd").exists());
    }
}
