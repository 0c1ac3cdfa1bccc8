//! # voxel-split
//!
//! Split very large multi-dimensional voxel volumes into smaller files with
//! overlapping halos, and reassemble them into one logical volume.
//!
//! Volumes are streamed line by line, so memory use does not grow with the
//! size of the volume.
//!
//! ## Architecture
//!
//! - [`plan`] - partition planner computing overlapping block ranges
//! - [`geometry`] - axis permutations and coordinate transforms
//! - [`io`] - file handles and the line streaming engine
//! - [`mod@format`] - MetaIO, VGE and TIFF adapters
//! - [`descriptor`] - tile descriptors, input discovery and manifests
//! - [`volume`] - voxel buffers, tiles and the combined image
//! - [`app`] - split and combine pipelines
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use voxel_split::{split_files, OutputOptions, SplitOptions};
//!
//! let options = SplitOptions {
//!     input: "volume.mhd".into(),
//!     output: OutputOptions {
//!         max_block_size: Some(vec![256]),
//!         overlap: Some(vec![8]),
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//! let report = split_files(&options).unwrap();
//! println!("wrote {} tiles", report.outputs.len());
//! ```

pub mod app;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod format;
pub mod geometry;
pub mod io;
pub mod plan;
pub mod volume;

// Re-export commonly used types
pub use app::{
    combine_files, combine_files_with, split_files, split_files_with, CombineOptions,
    OutputOptions, PipelineReport, SplitOptions,
};
pub use config::{Cli, Command, CombineConfig, SplitConfig};
pub use descriptor::{
    generate_input_descriptors, generate_output_descriptors, load_descriptor,
    write_descriptor_file, FileDescriptor, GlobalDescriptor, Manifest, OutputParameters,
    SubImageDescriptor, SubImageRanges,
};
pub use error::{ConfigError, FormatError, GeometryError, IoError, Result, SplitError};
pub use format::{load_and_parse_header, FileFactory, FileFormat, FormatFileFactory};
pub use geometry::{Axis, CoordinateTransformer, Region};
pub use io::{FileHandleFactory, ImageFile, Limits};
pub use plan::{image_block_ranges, BlockRange, PlannedTile, SliceMode};
pub use volume::{CombinedImage, DataType, RescaleOption, SubImage, VoxelBuffer};
