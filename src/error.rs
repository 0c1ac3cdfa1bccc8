use std::path::PathBuf;

use thiserror::Error;

/// Errors caused by invalid or conflicting user-supplied parameters
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Mutually exclusive options were supplied together
    #[error("Conflicting options: {0}")]
    ConflictingOptions(String),

    /// Rescale takes either no values (volume limits) or a min and a max
    #[error("Rescale must have no arguments, or a min and max (got {0} values)")]
    RescaleArguments(usize),

    /// Rescale limits must describe a non-empty range
    #[error("Invalid rescale range: min {min} must be less than max {max}")]
    RescaleRange { min: f64, max: f64 },

    /// Unknown voxel data type name
    #[error("Unknown data type: {0}")]
    UnknownDataType(String),

    /// Unknown slice orientation
    #[error("Unknown slice parameter: {0}")]
    UnknownSlice(String),

    /// A per-dimension parameter did not have one entry per dimension
    #[error(
        "The {parameter} parameter must be a scalar, or a list containing one entry for each of \
         the {expected} image dimensions (got {actual})"
    )]
    ParameterLength {
        parameter: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Overlap must be zero or positive
    #[error("Overlap must not be negative (got {0})")]
    NegativeOverlap(i64),

    /// A required parameter was missing
    #[error("Missing parameter: {0}")]
    Missing(&'static str),
}

/// Errors related to image geometry: sizes, ranges, axes and regions
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Requested region lies outside the addressable range of an image
    #[error("Region out of range: start {start:?} size {size:?} does not fit in image of size {image_size:?}")]
    OutOfRange {
        start: Vec<i64>,
        size: Vec<i64>,
        image_size: Vec<usize>,
    },

    /// Condensed axis vector is not a signed permutation of 1..=N
    #[error("Invalid permutation: {0:?}")]
    InvalidPermutation(Vec<i32>),

    /// Condensed axis vector contains a zero
    #[error("Dimensions are numbered from 1: {0:?}")]
    ZeroAxis(Vec<i32>),

    /// An image dimension is zero or negative
    #[error("Invalid image size: {0:?}")]
    InvalidImageSize(Vec<i64>),

    /// A tile range violates min <= roi_start <= roi_end <= max
    #[error("Invalid range in dimension {dimension}: {range:?}")]
    InvalidRange { dimension: usize, range: [i64; 4] },

    /// Vectors that should describe the same image disagree in length
    #[error("Dimension mismatch: expected {expected} dimensions, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Manifest describes a split of more or fewer than one source file
    #[error("Only data derived from a single file is supported (found {0} source files)")]
    SourceCount(usize),

    /// Volumes in a file series cannot be concatenated
    #[error("Series file {filename} has size {size:?}, incompatible with {expected:?}")]
    SeriesMismatch {
        filename: String,
        size: Vec<usize>,
        expected: Vec<usize>,
    },
}

/// I/O errors that can occur when reading or writing image files
#[derive(Debug, Error)]
pub enum IoError {
    /// Failure reported by the operating system
    #[error("I/O error on {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File ended before the requested voxels could be read
    #[error("Short read on {path}: requested {requested} bytes at offset {offset}")]
    ShortRead {
        path: PathBuf,
        offset: u64,
        requested: usize,
    },

    /// File was used after being closed
    #[error("File already closed: {0}")]
    Closed(PathBuf),
}

impl IoError {
    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IoError::File {
            path: path.into(),
            source,
        }
    }
}

/// Errors related to file formats, headers and manifests
#[derive(Debug, Error)]
pub enum FormatError {
    /// Unknown file format name or extension
    #[error("Unknown file format: {0}")]
    UnknownFormat(String),

    /// Format cannot be used for the requested operation
    #[error("Format {format} not supported: {reason}")]
    Unsupported { format: &'static str, reason: String },

    /// Compression scheme not available for this format
    #[error("{compression} compression not supported for {format} files")]
    UnsupportedCompression {
        compression: String,
        format: &'static str,
    },

    /// Data type cannot be stored in this format
    #[error("Data type {data_type} not supported for {format} files")]
    UnsupportedDataType {
        data_type: String,
        format: &'static str,
    },

    /// Header is missing a field or contains an unparseable value
    #[error("Invalid header {path}: {message}")]
    InvalidHeader { path: PathBuf, message: String },

    /// Manifest was not written by this application or has another version
    #[error("Invalid descriptor file: {0}")]
    InvalidManifest(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image codec error
    #[error("Codec error on {path}: {message}")]
    Codec { path: PathBuf, message: String },

    /// I/O error while reading or writing header files
    #[error("I/O error: {0}")]
    Io(#[from] IoError),
}

/// Top-level error returned by the split and combine pipelines
#[derive(Debug, Error)]
pub enum SplitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Format(#[from] FormatError),
}

pub type Result<T, E = SplitError> = std::result::Result<T, E>;
