//! Command-line configuration for voxel-split.
//!
//! The binary has two subcommands:
//!
//! - `split` divides a volume into overlapping tiles and writes a manifest
//! - `combine` reassembles tiles into a single file
//!
//! # Example
//!
//! ```text
//! voxel-split split -i volume.mhd -m 256 -l 8
//! voxel-split split -i volume.mhd --slice axial -t uchar -r
//! voxel-split combine -i volume.mhd -d volume_split_info.gift -o restored
//! ```
//!
//! Logging goes through `tracing`. `RUST_LOG` overrides the level chosen by
//! `--verbose`.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::app::{CombineOptions, OutputOptions, SplitOptions};
use crate::error::ConfigError;
use crate::format::FileFormat;
use crate::io::Limits;
use crate::plan::SliceMode;
use crate::volume::{DataType, RescaleOption};

// =============================================================================
// Default Values
// =============================================================================

/// Block size meaning "do not split this dimension".
pub const DEFAULT_MAX_BLOCK_SIZE: i64 = -1;

/// Default overlap between neighbouring tiles.
pub const DEFAULT_OVERLAP: i64 = 0;

/// Appended to the input name when `split` has no output name.
pub const SPLIT_SUFFIX: &str = "_split";

/// Appended to the input name when `combine` has no output name.
pub const COMBINED_SUFFIX: &str = "_combined";

/// Compression chosen by a bare `-z`.
pub const DEFAULT_COMPRESSION: &str = "default";

// =============================================================================
// CLI Structure
// =============================================================================

/// voxel-split - split large voxel volumes into overlapping tiles and
/// combine them again.
#[derive(Parser, Debug, Clone)]
#[command(name = "voxel-split")]
#[command(author, version, about, long_about = None, disable_version_flag = true)]
pub struct Cli {
    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    pub version: Option<bool>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Split a large volume into slices or overlapping blocks
    Split(SplitConfig),

    /// Combine split files into a single volume
    Combine(CombineConfig),
}

impl Command {
    pub fn verbose(&self) -> bool {
        match self {
            Command::Split(config) => config.verbose,
            Command::Combine(config) => config.verbose,
        }
    }
}

// =============================================================================
// Split Configuration
// =============================================================================

#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct SplitConfig {
    /// Input file, or the first file of a numbered series
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output filename prefix (default: input name with "_split" appended)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Voxels of overlap between neighbouring output files, as a scalar or
    /// one value per dimension
    #[arg(short = 'l', long, num_args = 1..)]
    pub overlap: Option<Vec<i64>>,

    /// Maximum voxels per dimension in each output file, as a scalar or one
    /// value per dimension. Zero or less leaves a dimension unsplit.
    #[arg(short, long, num_args = 1.., allow_negative_numbers = true)]
    pub max: Option<Vec<i64>>,

    /// Start index of a numbered input series
    #[arg(short = 'x', long = "startindex")]
    pub start_index: Option<usize>,

    /// Output data type (default: same as input)
    #[arg(short = 't', long = "type")]
    pub data_type: Option<DataType>,

    /// Output file format such as mhd or tiff (default: same as input)
    #[arg(short, long)]
    pub format: Option<FileFormat>,

    /// Rescale between a min and max. With no values, use the volume
    /// limits.
    #[arg(short, long, num_args = 0.., allow_negative_numbers = true)]
    pub rescale: Option<Vec<f64>>,

    /// Compress the output. With no value, use the format's default.
    #[arg(short = 'z', long = "compress", num_args = 0..=1, default_missing_value = DEFAULT_COMPRESSION)]
    pub compression: Option<String>,

    /// Split into single slices: s, c or a for an absolute orientation, or
    /// 1, 2, 3 for a dimension of the input file
    #[arg(short, long, conflicts_with_all = ["axis", "max", "overlap"])]
    pub slice: Option<SliceMode>,

    /// Global axis of each output file dimension, numbered from 1. A
    /// negative value flips that axis.
    #[arg(short, long, num_args = 1.., allow_negative_numbers = true)]
    pub axis: Option<Vec<i32>>,

    /// Read the input through an existing descriptor (.gift) file
    #[arg(short, long)]
    pub descriptor: Option<PathBuf>,

    /// Plan and validate without writing any files
    #[arg(long, default_value_t = false)]
    pub test: bool,

    /// Enable verbose logging (debug level)
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

impl SplitConfig {
    /// Check option combinations clap cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slice.is_some()
            && (self.axis.is_some() || self.max.is_some() || self.overlap.is_some())
        {
            return Err(ConfigError::ConflictingOptions(
                "--slice cannot be used with --axis, --max or --overlap".to_string(),
            ));
        }
        if let Some(&negative) = self.overlap.iter().flatten().find(|&&o| o < 0) {
            return Err(ConfigError::NegativeOverlap(negative));
        }
        parse_rescale(self.rescale.as_deref())?;
        Ok(())
    }

    pub fn to_options(&self) -> Result<SplitOptions, ConfigError> {
        self.validate()?;
        Ok(SplitOptions {
            input: self.input.clone(),
            out: self.out.clone(),
            start_index: self.start_index,
            descriptor: self.descriptor.clone(),
            output: OutputOptions {
                axis: self.axis.clone(),
                max_block_size: self.max.clone(),
                overlap: self.overlap.clone(),
                slice: self.slice,
                data_type: self.data_type,
                file_format: self.format,
                compression: self.compression.clone(),
            },
            rescale: parse_rescale(self.rescale.as_deref())?,
            test: self.test,
        })
    }
}

// =============================================================================
// Combine Configuration
// =============================================================================

#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct CombineConfig {
    /// First file of a numbered series of split files
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output filename (default: input name with "_combined" appended)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Read the split files from a descriptor (.gift) file
    #[arg(short, long)]
    pub descriptor: Option<PathBuf>,

    /// Start index of a numbered input series
    #[arg(short = 'x', long = "startindex")]
    pub start_index: Option<usize>,

    /// Output data type (default: same as input)
    #[arg(short = 't', long = "type")]
    pub data_type: Option<DataType>,

    /// Output file format such as mhd or tiff (default: same as input)
    #[arg(short, long)]
    pub format: Option<FileFormat>,

    /// Rescale between a min and max. With no values, use the volume
    /// limits.
    #[arg(short, long, num_args = 0.., allow_negative_numbers = true)]
    pub rescale: Option<Vec<f64>>,

    /// Compress the output. With no value, use the format's default.
    #[arg(short = 'z', long = "compress", num_args = 0..=1, default_missing_value = DEFAULT_COMPRESSION)]
    pub compression: Option<String>,

    /// Validate without writing any files
    #[arg(long, default_value_t = false)]
    pub test: bool,

    /// Enable verbose logging (debug level)
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

impl CombineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_rescale(self.rescale.as_deref())?;
        Ok(())
    }

    pub fn to_options(&self) -> Result<CombineOptions, ConfigError> {
        self.validate()?;
        Ok(CombineOptions {
            input: self.input.clone(),
            out: self.out.clone(),
            start_index: self.start_index,
            descriptor: self.descriptor.clone(),
            data_type: self.data_type,
            file_format: self.format,
            compression: self.compression.clone(),
            rescale: parse_rescale(self.rescale.as_deref())?,
            test: self.test,
        })
    }
}

/// `None` when rescaling is off, volume limits for an empty list, explicit
/// limits for a min and max.
fn parse_rescale(values: Option<&[f64]>) -> Result<Option<RescaleOption>, ConfigError> {
    match values {
        None => Ok(None),
        Some([]) => Ok(Some(RescaleOption::VolumeLimits)),
        Some(&[min, max]) => {
            if min.is_nan() || max.is_nan() || min >= max {
                return Err(ConfigError::RescaleRange { min, max });
            }
            Ok(Some(RescaleOption::Explicit(Limits::new(min, max))))
        }
        Some(other) => Err(ConfigError::RescaleArguments(other.len())),
    }
}

// =============================================================================
// Tests
// =============================================================================
