use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::COMBINED_SUFFIX;
use crate::descriptor::generate_output_descriptors;
use crate::error::Result;
use crate::format::{FileFactory, FileFormat, FormatFileFactory};
use crate::volume::{DataType, RescaleOption};

use super::{output_base, specify_inputs, write_files, OutputOptions, PipelineReport};

/// Inputs to [`combine_files`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombineOptions {
    /// First file of a numbered series, or a single file
    pub input: PathBuf,

    /// Output base name. Defaults to the input name with `_combined`
    /// appended.
    pub out: Option<PathBuf>,

    pub start_index: Option<usize>,

    /// Read the tiles from a manifest written by a split
    pub descriptor: Option<PathBuf>,

    pub data_type: Option<DataType>,
    pub file_format: Option<FileFormat>,
    pub compression: Option<String>,
    pub rescale: Option<RescaleOption>,
    pub test: bool,
}

/// Combine tiles into one file using the standard file formats.
pub fn combine_files(options: &CombineOptions) -> Result<PipelineReport> {
    combine_files_with(options, Arc::new(FormatFileFactory::new()))
}

/// Combine tiles into one file, creating files through `factory`.
///
/// The output keeps the orientation of the source volume and has no index
/// suffix.
pub fn combine_files_with(
    options: &CombineOptions,
    factory: Arc<dyn FileFactory>,
) -> Result<PipelineReport> {
    let filename_base = output_base(&options.input, options.out.as_deref(), COMBINED_SUFFIX);
    let inputs = specify_inputs(
        &options.input,
        options.start_index,
        options.descriptor.as_deref(),
    )?;

    let output = OutputOptions {
        data_type: options.data_type,
        file_format: options.file_format,
        compression: options.compression.clone(),
        ..Default::default()
    };
    let params = output.parameters(filename_base, &inputs.global, false)?;
    let outputs = generate_output_descriptors(&params, &inputs.global, &inputs.template)?;

    info!(
        "Combining {} file(s) into a volume of size {:?}",
        inputs.descriptors.len(),
        inputs.global.size
    );
    for tile in &inputs.descriptors {
        debug!(index = tile.index, "input {}", tile.filename.display());
    }

    let output_names: Vec<PathBuf> = outputs.iter().map(|d| d.filename.clone()).collect();
    let limits = write_files(inputs.descriptors, outputs, factory, options.rescale, options.test)?;
    if let Some(limits) = limits {
        info!("Rescaling from [{}, {}]", limits.min, limits.max);
    }
    for name in &output_names {
        if options.test {
            info!("Test mode: {} was not written", name.display());
        } else {
            info!("Wrote {}", name.display());
        }
    }

    Ok(PipelineReport {
        outputs: output_names,
        limits,
        manifest: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SplitError;

    #[test]
    fn test_missing_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let options = CombineOptions {
            input: dir.path().join("tiles.mhd"),
            descriptor: Some(dir.path().join("tiles_info.gift")),
            ..Default::default()
        };
        assert!(matches!(combine_files(&options), Err(SplitError::Io(_))));
    }

    #[test]
    fn test_single_file_copy() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("plane.mhd");
        std::fs::write(
            &input,
            "ObjectType = Image\nNDims = 2\nDimSize = 3 2\nElementType = MET_UCHAR\n\
             ElementDataFile = plane.raw\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("plane.raw"), [1u8, 2, 3, 4, 5, 6]).unwrap();

        let report = combine_files(&CombineOptions {
            input,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(report.outputs, vec![dir.path().join("plane_combined.mhd")]);
        assert!(report.manifest.is_none());
        assert_eq!(
            std::fs::read(dir.path().join("plane_combined.raw")).unwrap(),
            vec![1, 2, 3, 4, 5, 6]
        );
    }
}
