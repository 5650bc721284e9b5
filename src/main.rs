use anyhow::{Context, Result};
use clap::Parser;
use img_compress::batch::{process_directory, BatchOptions, OutputMode};
use img_compress::cli::Args;
use img_compress::constants::DEFAULT_OUTPUT_DIR_NAME;
use img_compress::dependencies::{check_dependencies, installation_instructions};
use img_compress::logger::{self, Verbosity};
use img_compress::processing::{CompressConfig, Compressor, JpegSettings, PngSettings};
use img_compress::tool::ProcessRunner;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

fn main() -> Result<()> {
    let args = Args::parse();
    let verbosity = Verbosity::from_flags(args.quiet, args.verbose);
    logger::init(verbosity);

    let config = build_config(&args)?;
    let runner = ProcessRunner::new(config.tool_timeout);

    if let Err(e) = check_dependencies(&runner, &config) {
        error!("{}", e);
        error!("Install the missing tools and run again:\n{}", installation_instructions());
        return Err(e).context("dependency check failed");
    }

    let input_dir = resolve_input(args.input.as_deref())?;
    let mode = if args.replace {
        OutputMode::Replace
    } else {
        let output_root = match &args.output {
            Some(output) => absolute(output)?,
            None => input_dir.join(DEFAULT_OUTPUT_DIR_NAME),
        };
        OutputMode::Copy { output_root }
    };

    info!("🚀 Starting compression...");
    info!("📁 Input directory: {}", input_dir.display());
    match &mode {
        OutputMode::Copy { output_root } => {
            info!("📁 Output directory: {}", output_root.display())
        }
        OutputMode::Replace => info!("Mode: replace original files"),
    }

    let options = BatchOptions::new(input_dir, mode)
        .with_jobs(args.jobs)
        .with_progress(!args.no_progress && verbosity != Verbosity::Quiet);
    let compressor = Compressor::new(config, Box::new(runner));

    process_directory(&compressor, &options).context("compression run failed")?;
    Ok(())
}

fn build_config(args: &Args) -> Result<CompressConfig> {
    let png = PngSettings::new(
        args.pngquant.clone(),
        args.png_quality.clone().unwrap_or_default(),
        !args.no_passthrough,
    );
    let jpeg = JpegSettings::new(args.cjpeg.clone(), args.jpeg_quality)?;
    let timeout = (args.timeout > 0).then(|| Duration::from_secs(args.timeout));

    Ok(CompressConfig::new(png, jpeg).with_tool_timeout(timeout))
}

fn resolve_input(input: Option<&Path>) -> Result<PathBuf> {
    let input = match input {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    input
        .canonicalize()
        .with_context(|| format!("input directory not found: {}", input.display()))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()
        .context("cannot determine current directory")?
        .join(path))
}
