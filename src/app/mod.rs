//! Split and combine pipelines.
//!
//! Both pipelines follow the same flow:
//!
//! ```text
//!   input file / series / manifest
//!           │
//!           ▼
//!   input descriptors ──► CombinedImage (source)
//!                                 │
//!   output parameters ──► output descriptors ──► CombinedImage (target)
//!                                 │
//!                                 ▼
//!                   target.write_image(source, rescale)
//! ```
//!
//! Splitting produces many tiles and a manifest. Combining produces a single
//! file covering the whole volume.

mod combine;
mod split;

pub use combine::{combine_files, combine_files_with, CombineOptions};
pub use split::{split_files, split_files_with, SplitOptions};

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::descriptor::{
    generate_input_descriptors, load_descriptor, GlobalDescriptor, InputSet, OutputParameters,
    SubImageDescriptor,
};
use crate::error::Result;
use crate::format::{FileFactory, FileFormat};
use crate::io::Limits;
use crate::plan::SliceMode;
use crate::volume::{CombinedImage, DataType, RescaleOption};

/// What a pipeline run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    /// Files written, or that would be written in test mode
    pub outputs: Vec<PathBuf>,

    /// Limits used for rescaling
    pub limits: Option<Limits>,

    /// Manifest written after a split
    pub manifest: Option<PathBuf>,
}

/// Layout and encoding of the output files. Unset fields follow the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputOptions {
    pub axis: Option<Vec<i32>>,
    pub max_block_size: Option<Vec<i64>>,
    pub overlap: Option<Vec<i64>>,
    pub slice: Option<SliceMode>,
    pub data_type: Option<DataType>,
    pub file_format: Option<FileFormat>,
    pub compression: Option<String>,
}

impl OutputOptions {
    fn parameters(
        &self,
        filename_base: PathBuf,
        global: &GlobalDescriptor,
        always_suffix: bool,
    ) -> Result<OutputParameters> {
        let mut axis = self
            .axis
            .clone()
            .unwrap_or_else(|| global.axis.to_condensed());
        let mut max_block_size = self
            .max_block_size
            .clone()
            .unwrap_or_else(|| vec![crate::config::DEFAULT_MAX_BLOCK_SIZE]);
        let mut overlap = self
            .overlap
            .clone()
            .unwrap_or_else(|| vec![crate::config::DEFAULT_OVERLAP]);

        if let Some(slice) = self.slice {
            let preset = slice.preset(&axis)?;
            axis = preset.axis;
            max_block_size = preset.max_block_size;
            overlap = preset.overlap;
        }

        Ok(OutputParameters {
            filename_base,
            max_block_size,
            overlap,
            axis,
            data_type: self.data_type.unwrap_or(global.data_type),
            file_format: self.file_format.unwrap_or(global.file_format),
            compression: self.compression.clone(),
            always_suffix,
        })
    }
}

/// Describe the input, either from a manifest or by reading file headers.
fn specify_inputs(
    input: &Path,
    start_index: Option<usize>,
    descriptor: Option<&Path>,
) -> Result<InputSet> {
    match descriptor {
        None => generate_input_descriptors(input, start_index),
        Some(path) => {
            let manifest = load_descriptor(path)?;
            let (global, template) = manifest.global_descriptor()?;
            Ok(InputSet {
                template,
                descriptors: manifest.split_descriptors()?,
                global,
            })
        }
    }
}

/// `out`, or the input path without its extension followed by `suffix`.
fn output_base(input: &Path, out: Option<&Path>, suffix: &str) -> PathBuf {
    match out {
        Some(out) if !out.as_os_str().is_empty() => out.to_path_buf(),
        _ => {
            let mut name: OsString = input.with_extension("").into_os_string();
            name.push(suffix);
            PathBuf::from(name)
        }
    }
}

/// Fill the output files from the input files.
///
/// Both images are closed before returning, whether or not writing
/// succeeded. The first error wins.
fn write_files(
    inputs: Vec<SubImageDescriptor>,
    outputs: Vec<SubImageDescriptor>,
    factory: Arc<dyn FileFactory>,
    rescale: Option<RescaleOption>,
    test: bool,
) -> Result<Option<Limits>> {
    let mut source = CombinedImage::new(inputs, Arc::clone(&factory))?;
    let mut target = match CombinedImage::new(outputs, factory) {
        Ok(target) => target,
        Err(e) => {
            let _ = source.close();
            return Err(e);
        }
    };

    let written = target.write_image(&mut source, rescale, test);
    let source_closed = source.close();
    let target_closed = target.close();

    let limits = written?;
    source_closed?;
    target_closed?;
    Ok(limits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Axis;

    fn global() -> GlobalDescriptor {
        GlobalDescriptor {
            size: vec![6, 4, 3],
            axis: Axis::from_condensed(&[2, 1, 3]).unwrap(),
            data_type: DataType::Short,
            msb: false,
            voxel_size: vec![1.0, 1.0, 1.0],
            file_format: FileFormat::MetaIo,
        }
    }

    #[test]
    fn test_output_base() {
        assert_eq!(
            output_base(Path::new("dir/volume.mhd"), None, "_split"),
            PathBuf::from("dir/volume_split")
        );
        assert_eq!(
            output_base(Path::new("volume.mhd"), Some(Path::new("out/tiles")), "_split"),
            PathBuf::from("out/tiles")
        );
        assert_eq!(
            output_base(Path::new("volume.mhd"), Some(Path::new("")), "_combined"),
            PathBuf::from("volume_combined")
        );
    }

    #[test]
    fn test_parameters_follow_input() {
        let params = OutputOptions::default()
            .parameters(PathBuf::from("x"), &global(), true)
            .unwrap();
        assert_eq!(params.axis, vec![2, 1, 3]);
        assert_eq!(params.max_block_size, vec![-1]);
        assert_eq!(params.overlap, vec![0]);
        assert_eq!(params.data_type, DataType::Short);
        assert_eq!(params.file_format, FileFormat::MetaIo);
    }

    #[test]
    fn test_slice_preset_overrides_layout() {
        let options = OutputOptions {
            slice: Some(SliceMode::Axial),
            data_type: Some(DataType::UChar),
            ..Default::default()
        };
        let params = options.parameters(PathBuf::from("x"), &global(), true).unwrap();
        assert_eq!(params.axis, vec![1, 2, 3]);
        assert_eq!(params.max_block_size, vec![-1, -1, 1]);
        assert_eq!(params.overlap, vec![0, 0, 0]);
        assert_eq!(params.data_type, DataType::UChar);
    }

    #[test]
    fn test_relative_slice_uses_input_axis() {
        let options = OutputOptions {
            slice: Some(SliceMode::Relative(0)),
            ..Default::default()
        };
        let params = options.parameters(PathBuf::from("x"), &global(), true).unwrap();
        assert_eq!(params.axis, vec![1, -3, 2]);
        assert_eq!(params.max_block_size, vec![-1, 1, -1]);
    }
}
