//! voxel-split - split large voxel volumes into tiles and combine them again.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use voxel_split::{
    app::{combine_files, split_files, PipelineReport},
    config::{Cli, Command, CombineConfig, SplitConfig},
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli.into_command();

    init_logging(command.verbose());

    match command {
        Command::Split(config) => run_split(config),
        Command::Combine(config) => run_combine(config),
    }
}

// =============================================================================
// Split Command
// =============================================================================

fn run_split(config: SplitConfig) -> ExitCode {
    let options = match config.to_options() {
        Ok(options) => options,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Input: {}", options.input.display());
    if let Some(ref descriptor) = options.descriptor {
        info!("  Descriptor: {}", descriptor.display());
    }

    match split_files(&options) {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Split failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Combine Command
// =============================================================================

fn run_combine(config: CombineConfig) -> ExitCode {
    let options = match config.to_options() {
        Ok(options) => options,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Input: {}", options.input.display());
    if let Some(ref descriptor) = options.descriptor {
        info!("  Descriptor: {}", descriptor.display());
    }

    match combine_files(&options) {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Combine failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_report(report: &PipelineReport) {
    info!("Output: {} file(s)", report.outputs.len());
    for output in &report.outputs {
        info!("  {}", output.display());
    }
    if let Some(ref manifest) = report.manifest {
        info!("Descriptor: {}", manifest.display());
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "voxel_split=debug"
    } else {
        "voxel_split=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
