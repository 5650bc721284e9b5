use crate::constants::PNGQUANT_QUALITY_UNREACHABLE;
use crate::error::{CompressionError, Result};
use crate::formats::ImageKind;
use crate::processing::{CompressionOutcome, PngSettings};
use crate::quality::{LadderState, QualityRange};
use crate::staging::{move_into_place, StagingDir};
use crate::tool::{ToolInvocation, ToolRunner, ToolStatus};
use crate::utils::format_file_size;
use crate::validation::validate_source;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Build the pngquant command line for one rung
pub fn quantize_invocation(
    settings: &PngSettings,
    quality: QualityRange,
    staged: &Path,
    source: &Path,
) -> ToolInvocation {
    ToolInvocation::new(&settings.binary)
        .arg("--force")
        .arg(quality.as_arg())
        .arg("--output")
        .arg(staged)
        .arg(source)
}

/// Compress a PNG with pngquant, walking the quality ladder.
///
/// Each rung is tried in order until pngquant accepts one. When every rung
/// reports the quality floor as unreachable the source is passed through
/// unchanged (unless pass-through is disabled). Output is staged in a private
/// directory under `staging_root` and moved to `destination` only when
/// complete; the staging directory is removed on every path out of here.
///
/// # Returns
/// * `Ok(outcome)` - with `quality_used` set to the accepted rung, or `None`
///   for a pass-through
/// * `Err(CompressionError)` - validation, tool, or filesystem failure
pub fn compress_png(
    runner: &dyn ToolRunner,
    settings: &PngSettings,
    source: &Path,
    destination: &Path,
    staging_root: Option<&Path>,
) -> Result<CompressionOutcome> {
    let bytes_in = validate_source(source, ImageKind::Png)?;

    let staging = StagingDir::new(staging_root)?;
    let staged = staging.file_for(source);
    let ladder = &settings.ladder;

    let mut state = LadderState::NotTried.start();
    while let LadderState::Attempting(rung) = state {
        let Some(quality) = ladder.get(rung) else {
            break;
        };

        let invocation = quantize_invocation(settings, quality, &staged, source);
        let output = runner.run(&invocation)?;
        let status = ToolStatus::decode(&output, &[PNGQUANT_QUALITY_UNREACHABLE]);

        if let ToolStatus::Retryable(code) = status {
            debug!(
                path = %source.display(),
                quality = %quality,
                exit_code = code,
                "Quality floor unreachable, trying next range"
            );
        }
        if let Some(err) = status.clone().into_error(&invocation.tool_name()) {
            return Err(err);
        }

        state = state.advance(&status, ladder.len());
    }

    let quality_used = match state {
        LadderState::Succeeded(rung) => ladder.get(rung),
        LadderState::ExhaustedFallback if settings.passthrough => {
            warn!(
                path = %source.display(),
                ladder = %ladder,
                "No quality range reachable, keeping original bytes"
            );
            fs::copy(source, &staged)?;
            None
        }
        _ => {
            return Err(CompressionError::QualityUnreachable {
                path: source.to_path_buf(),
                ladder: ladder.to_string(),
            })
        }
    };

    if !staged.is_file() {
        return Err(CompressionError::OutputNotProduced(staged));
    }

    move_into_place(&staged, destination)?;
    staging.close()?;

    let bytes_out = fs::metadata(destination)?.len();
    let outcome = CompressionOutcome::succeeded(
        source,
        destination,
        ImageKind::Png,
        bytes_in,
        bytes_out,
        quality_used,
    );

    let quality = quality_used
        .map(|q| q.to_string())
        .unwrap_or_else(|| "passthrough".to_string());
    info!(
        path = %source.display(),
        quality = %quality,
        bytes_in,
        bytes_out,
        ratio = %outcome.ratio_label(),
        "Compressed PNG: {} -> {}",
        format_file_size(bytes_in),
        format_file_size(bytes_out)
    );

    Ok(outcome)
}
