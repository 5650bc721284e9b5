pub const DEFAULT_JPEG_QUALITY: u8 = 70;
pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 100;

/// Upper bound of a pngquant quality range.
pub const MAX_PNG_QUALITY: u8 = 100;

/// Quality ranges tried by default, highest first.
pub const DEFAULT_PNG_QUALITY_LADDER: &[&str] = &["50-70", "40-60", "30-50"];

/// pngquant exits with this code when the minimum quality cannot be met.
pub const PNGQUANT_QUALITY_UNREACHABLE: i32 = 99;

pub const DEFAULT_PNGQUANT_BIN: &str = "pngquant";
pub const DEFAULT_CJPEG_BIN: &str = "cjpeg";

pub const PNGQUANT_BIN_ENV: &str = "IMG_COMPRESS_PNGQUANT";
pub const CJPEG_BIN_ENV: &str = "IMG_COMPRESS_CJPEG";
pub const LOG_ENV: &str = "IMG_COMPRESS_LOG";

pub const DEFAULT_OUTPUT_DIR_NAME: &str = "compressed";

pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 300;
pub const TOOL_POLL_INTERVAL_MS: u64 = 20;

pub const STAGING_DIR_PREFIX: &str = ".img-compress-stage-";
pub const REPLACE_ROOT_PREFIX: &str = ".img-compress-replace-";

pub const PNG_EXTENSIONS: &[&str] = &["png"];
pub const JPEG_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

pub const PROGRESS_BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";
