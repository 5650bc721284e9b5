pub mod batch;
pub mod cli;
pub mod constants;
pub mod dependencies;
pub mod error;
pub mod formats;
pub mod jpeg;
pub mod logger;
pub mod png;
pub mod processing;
pub mod quality;
pub mod staging;
pub mod tool;
pub mod utils;
pub mod validation;

pub use batch::{
    collect_image_files, process_directory, BatchOptions, BatchReport, BatchSummary, OutputMode,
};
pub use dependencies::check_dependencies;
pub use error::{CompressionError, Result};
pub use formats::ImageKind;
pub use jpeg::compress_jpeg;
pub use png::compress_png;
pub use processing::{
    CompressConfig, CompressionOutcome, CompressionRequest, Compressor, JpegSettings, PngSettings,
};
pub use quality::{LadderState, QualityLadder, QualityRange};
pub use tool::{ProcessRunner, ToolInvocation, ToolOutput, ToolRunner, ToolStatus};
