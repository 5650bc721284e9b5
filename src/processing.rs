use crate::constants::{
    DEFAULT_CJPEG_BIN, DEFAULT_JPEG_QUALITY, DEFAULT_PNGQUANT_BIN, MAX_QUALITY, MIN_QUALITY,
};
use crate::error::{CompressionError, Result};
use crate::formats::ImageKind;
use crate::jpeg::compress_jpeg;
use crate::png::compress_png;
use crate::quality::{QualityLadder, QualityRange};
use crate::tool::ToolRunner;
use crate::utils::compression_ratio;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// pngquant settings
#[derive(Debug, Clone)]
pub struct PngSettings {
    pub binary: PathBuf,
    pub ladder: QualityLadder,
    /// Copy the original bytes when no rung is reachable
    pub passthrough: bool,
}

impl PngSettings {
    pub fn new(binary: PathBuf, ladder: QualityLadder, passthrough: bool) -> Self {
        Self {
            binary,
            ladder,
            passthrough,
        }
    }
}

impl Default for PngSettings {
    fn default() -> Self {
        Self::new(PathBuf::from(DEFAULT_PNGQUANT_BIN), QualityLadder::default(), true)
    }
}

/// cjpeg settings
#[derive(Debug, Clone)]
pub struct JpegSettings {
    pub binary: PathBuf,
    pub quality: u8,
}

impl JpegSettings {
    pub fn new(binary: PathBuf, quality: Option<u8>) -> Result<Self> {
        let quality = quality.unwrap_or(DEFAULT_JPEG_QUALITY);
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
            return Err(CompressionError::InvalidQuality(quality));
        }
        Ok(Self { binary, quality })
    }
}

impl Default for JpegSettings {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_CJPEG_BIN),
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Everything a single compression call needs besides the runner
#[derive(Debug, Clone, Default)]
pub struct CompressConfig {
    pub png: PngSettings,
    pub jpeg: JpegSettings,
    /// Parent for private staging directories; the OS temp dir when `None`
    pub staging_root: Option<PathBuf>,
    /// Per-invocation limit for external tools
    pub tool_timeout: Option<Duration>,
}

impl CompressConfig {
    pub fn new(png: PngSettings, jpeg: JpegSettings) -> Self {
        Self {
            png,
            jpeg,
            ..Self::default()
        }
    }

    pub fn with_staging_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.staging_root = Some(root.into());
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.tool_timeout = timeout;
        self
    }
}

/// One file to compress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionRequest {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub kind: ImageKind,
}

impl CompressionRequest {
    /// Build a request, classifying the source by extension.
    ///
    /// Returns `None` when the source is not a PNG or JPEG.
    pub fn for_source(source_path: PathBuf, destination_path: PathBuf) -> Option<Self> {
        let kind = ImageKind::from_path(&source_path)?;
        Some(Self {
            source_path,
            destination_path,
            kind,
        })
    }
}

/// Result of compressing one file
#[derive(Debug)]
pub struct CompressionOutcome {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub kind: ImageKind,
    pub success: bool,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub quality_used: Option<QualityRange>,
    /// The original bytes were kept because no quality range was reachable
    pub passthrough: bool,
    pub error: Option<CompressionError>,
}

impl CompressionOutcome {
    pub fn succeeded(
        source: &Path,
        destination: &Path,
        kind: ImageKind,
        bytes_in: u64,
        bytes_out: u64,
        quality_used: Option<QualityRange>,
    ) -> Self {
        Self {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            kind,
            success: true,
            bytes_in,
            bytes_out,
            quality_used,
            passthrough: kind == ImageKind::Png && quality_used.is_none(),
            error: None,
        }
    }

    pub fn failed(request: &CompressionRequest, bytes_in: u64, error: CompressionError) -> Self {
        Self {
            source: request.source_path.clone(),
            destination: request.destination_path.clone(),
            kind: request.kind,
            success: false,
            bytes_in,
            bytes_out: 0,
            quality_used: None,
            passthrough: false,
            error: Some(error),
        }
    }

    /// `1 - bytes_out / bytes_in`; only defined for successful outcomes
    pub fn compression_ratio(&self) -> Option<f64> {
        if !self.success {
            return None;
        }
        compression_ratio(self.bytes_in, self.bytes_out)
    }

    pub fn ratio_label(&self) -> String {
        match self.compression_ratio() {
            Some(ratio) => format!("{:.1}%", ratio * 100.0),
            None => "n/a".to_string(),
        }
    }
}

/// Dispatches requests to the PNG or JPEG compressor
pub struct Compressor {
    config: CompressConfig,
    runner: Box<dyn ToolRunner>,
}

impl Compressor {
    pub fn new(config: CompressConfig, runner: Box<dyn ToolRunner>) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &CompressConfig {
        &self.config
    }

    pub fn runner(&self) -> &dyn ToolRunner {
        self.runner.as_ref()
    }

    /// Compress one file. Never fails: errors are captured in the outcome
    /// and logged.
    pub fn compress(&self, request: &CompressionRequest) -> CompressionOutcome {
        let result = match request.kind {
            ImageKind::Png => compress_png(
                self.runner(),
                &self.config.png,
                &request.source_path,
                &request.destination_path,
                self.config.staging_root.as_deref(),
            ),
            ImageKind::Jpeg => compress_jpeg(
                self.runner(),
                &self.config.jpeg,
                &request.source_path,
                &request.destination_path,
            ),
        };

        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    path = %request.source_path.display(),
                    kind = %request.kind,
                    tool = request.kind.tool_name(),
                    error = %e,
                    "Failed to compress {}",
                    request.kind
                );
                let bytes_in = std::fs::metadata(&request.source_path)
                    .map(|m| m.len())
                    .unwrap_or(0);
                CompressionOutcome::failed(request, bytes_in, e)
            }
        }
    }
}
