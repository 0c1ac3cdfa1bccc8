use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::SPLIT_SUFFIX;
use crate::descriptor::{generate_output_descriptors, write_descriptor_file};
use crate::error::Result;
use crate::format::{FileFactory, FormatFileFactory};
use crate::volume::RescaleOption;

use super::{output_base, specify_inputs, write_files, OutputOptions, PipelineReport};

/// Inputs to [`split_files`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitOptions {
    /// Input file, or the first name of a numbered series
    pub input: PathBuf,

    /// Output base name. Defaults to the input name with `_split` appended.
    pub out: Option<PathBuf>,

    /// Read a numbered series starting at this index
    pub start_index: Option<usize>,

    /// Read the input from an existing manifest
    pub descriptor: Option<PathBuf>,

    pub output: OutputOptions,
    pub rescale: Option<RescaleOption>,

    /// Plan and validate without writing any files
    pub test: bool,
}

/// Split a volume into tiles using the standard file formats.
pub fn split_files(options: &SplitOptions) -> Result<PipelineReport> {
    split_files_with(options, Arc::new(FormatFileFactory::new()))
}

/// Split a volume into tiles, creating files through `factory`.
///
/// A manifest describing the split is written next to the tiles unless the
/// input already came from a manifest or `test` is set.
pub fn split_files_with(
    options: &SplitOptions,
    factory: Arc<dyn FileFactory>,
) -> Result<PipelineReport> {
    let filename_base = output_base(&options.input, options.out.as_deref(), SPLIT_SUFFIX);
    let inputs = specify_inputs(
        &options.input,
        options.start_index,
        options.descriptor.as_deref(),
    )?;

    let params = options
        .output
        .parameters(filename_base.clone(), &inputs.global, true)?;
    let outputs = generate_output_descriptors(&params, &inputs.global, &inputs.template)?;

    info!(
        "Splitting {} input file(s) of size {:?} into {} tile(s)",
        inputs.descriptors.len(),
        inputs.global.size,
        outputs.len()
    );
    for tile in &outputs {
        debug!(
            index = tile.index,
            ranges = ?tile.ranges.ranges(),
            "tile {}",
            tile.filename.display()
        );
    }

    let output_names: Vec<PathBuf> = outputs.iter().map(|d| d.filename.clone()).collect();
    let input_descriptors = inputs.descriptors.clone();
    let output_descriptors = outputs.clone();

    let limits = write_files(inputs.descriptors, outputs, factory, options.rescale, options.test)?;
    if let Some(limits) = limits {
        info!("Rescaling from [{}, {}]", limits.min, limits.max);
    }

    let manifest = if options.descriptor.is_none() && !options.test {
        let path = write_descriptor_file(&input_descriptors, &output_descriptors, &filename_base)?;
        info!("Wrote descriptor {}", path.display());
        Some(path)
    } else {
        None
    };

    if options.test {
        info!("Test mode: no files were written");
    }

    Ok(PipelineReport {
        outputs: output_names,
        limits,
        manifest,
    })
}
