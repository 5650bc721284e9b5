use crate::error::{CompressionError, Result};
use crate::formats::ImageKind;
use crate::processing::{CompressionOutcome, JpegSettings};
use crate::staging::{ensure_parent_dir, remove_if_exists};
use crate::tool::{ToolInvocation, ToolRunner, ToolStatus};
use crate::utils::format_file_size;
use crate::validation::validate_source;
use std::fs;
use std::path::Path;
use tracing::info;

/// Build the cjpeg command line
pub fn encode_invocation(
    settings: &JpegSettings,
    destination: &Path,
    source: &Path,
) -> ToolInvocation {
    ToolInvocation::new(&settings.binary)
        .arg("-quality")
        .arg(settings.quality.to_string())
        .arg("-optimize")
        .arg("-outfile")
        .arg(destination)
        .arg(source)
}

/// Re-encode a JPEG with mozjpeg's cjpeg in a single attempt.
///
/// The encoder writes straight to `destination`; callers that must not
/// disturb an existing file pass a staging path instead. Whatever a failed
/// run leaves at `destination` is removed.
pub fn compress_jpeg(
    runner: &dyn ToolRunner,
    settings: &JpegSettings,
    source: &Path,
    destination: &Path,
) -> Result<CompressionOutcome> {
    let bytes_in = validate_source(source, ImageKind::Jpeg)?;
    ensure_parent_dir(destination)?;

    let invocation = encode_invocation(settings, destination, source);
    let failure = match runner.run(&invocation) {
        Ok(output) => ToolStatus::decode(&output, &[]).into_error(&invocation.tool_name()),
        Err(e) => Some(e),
    };
    if let Some(err) = failure {
        remove_if_exists(destination)?;
        return Err(err);
    }

    if !destination.is_file() {
        return Err(CompressionError::OutputNotProduced(destination.to_path_buf()));
    }

    let bytes_out = fs::metadata(destination)?.len();
    let outcome = CompressionOutcome::succeeded(
        source,
        destination,
        ImageKind::Jpeg,
        bytes_in,
        bytes_out,
        None,
    );

    info!(
        path = %source.display(),
        quality = settings.quality,
        bytes_in,
        bytes_out,
        ratio = %outcome.ratio_label(),
        "Compressed JPEG: {} -> {}",
        format_file_size(bytes_in),
        format_file_size(bytes_out)
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ToolOutput;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    fn settings() -> JpegSettings {
        JpegSettings::new(PathBuf::from("cjpeg"), Some(70)).unwrap()
    }

    #[test]
    fn test_invocation_shape() {
        let invocation = encode_invocation(&settings(), Path::new("/out/y.jpg"), Path::new("/in/y.jpg"));
        assert_eq!(
            invocation.to_string(),
            "cjpeg -quality 70 -optimize -outfile /out/y.jpg /in/y.jpg"
        );
    }

    #[test]
    fn test_compress_jpeg_success() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("y.JPEG");
        fs::write(&source, [5u8; 80]).unwrap();
        let destination = dir.path().join("nested/out/y.JPEG");

        let runner = |inv: &ToolInvocation| -> Result<ToolOutput> {
            fs::write(inv.value_after("-outfile").unwrap(), [6u8; 20]).unwrap();
            Ok(ToolOutput::with_code(0))
        };

        let outcome = compress_jpeg(&runner, &settings(), &source, &destination).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.kind, ImageKind::Jpeg);
        assert_eq!(outcome.compression_ratio(), Some(0.75));
        assert_eq!(fs::read(&destination).unwrap(), vec![6u8; 20]);
    }

    #[test]
    fn test_compress_jpeg_failure_removes_partial_output() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("broken.jpg");
        fs::write(&source, b"not a jpeg").unwrap();
        let destination = dir.path().join("out/broken.jpg");

        let runner = |inv: &ToolInvocation| -> Result<ToolOutput> {
            fs::write(inv.value_after("-outfile").unwrap(), b"partial").unwrap();
            Ok(ToolOutput::with_code(1).with_stderr("Not a JPEG file: starts with 0x6e 0x6f\n"))
        };

        let result = compress_jpeg(&runner, &settings(), &source, &destination);
        match result {
            Err(CompressionError::ToolInvocationFailed { tool, code, diagnostic }) => {
                assert_eq!(tool, "cjpeg");
                assert_eq!(code, Some(1));
                assert!(diagnostic.starts_with("Not a JPEG file"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!destination.exists());
        assert_eq!(fs::read(&source).unwrap(), b"not a jpeg");
    }

    #[test]
    fn test_compress_jpeg_timeout_removes_partial_output() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("slow.jpg");
        fs::write(&source, [3u8; 64]).unwrap();
        let destination = dir.path().join("out/slow.jpg");

        let runner = |inv: &ToolInvocation| -> Result<ToolOutput> {
            fs::write(inv.value_after("-outfile").unwrap(), b"trunc").unwrap();
            Err(CompressionError::ToolTimedOut {
                tool: "cjpeg".to_string(),
                timeout: Duration::from_secs(1),
            })
        };

        let result = compress_jpeg(&runner, &settings(), &source, &destination);
        assert!(matches!(result, Err(CompressionError::ToolTimedOut { .. })));
        assert!(!destination.exists());
        assert_eq!(fs::read(&source).unwrap(), vec![3u8; 64]);
    }

    #[test]
    fn test_compress_jpeg_runner_error_removes_partial_output() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("y.jpg");
        fs::write(&source, [3u8; 64]).unwrap();
        let destination = dir.path().join("out/y.jpg");

        let runner = |inv: &ToolInvocation| -> Result<ToolOutput> {
            fs::write(inv.value_after("-outfile").unwrap(), b"half").unwrap();
            Err(CompressionError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "pipe closed",
            )))
        };

        assert!(compress_jpeg(&runner, &settings(), &source, &destination).is_err());
        assert!(!destination.exists());
    }

    #[test]
    fn test_compress_jpeg_rejects_png() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("x.png");
        fs::write(&source, b"png").unwrap();

        let runner = |_: &ToolInvocation| -> Result<ToolOutput> { panic!("must not run") };
        let result = compress_jpeg(&runner, &settings(), &source, &dir.path().join("x.jpg"));
        assert!(matches!(result, Err(CompressionError::NotImageFormat { .. })));
    }
}
