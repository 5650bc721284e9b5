use crate::constants::{
    CJPEG_BIN_ENV, DEFAULT_CJPEG_BIN, DEFAULT_PNGQUANT_BIN, DEFAULT_TOOL_TIMEOUT_SECS,
    PNGQUANT_BIN_ENV,
};
use crate::quality::QualityLadder;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "img-compress",
    about = "Compress PNG and JPEG images in a directory tree using pngquant and mozjpeg",
    long_about = "img-compress walks a directory tree and compresses every PNG (with pngquant) and \
                  JPEG (with mozjpeg's cjpeg). Results are written to a mirrored output directory, \
                  or over the originals with --replace. PNGs are tried against a ladder of quality \
                  ranges; when none can be met the original bytes are kept.",
    version,
    after_help = "EXAMPLES:\n  \
    img-compress -i ./assets\n  \
    img-compress -i ./assets -o ./assets-min --png-quality 65-80,50-70\n  \
    img-compress -i ./site/images --replace -j 4"
)]
pub struct Args {
    #[arg(
        short = 'i',
        long,
        help = "Input directory containing images (default: current directory)"
    )]
    pub input: Option<PathBuf>,

    #[arg(
        short = 'o',
        long,
        help = "Output directory (default: <input>/compressed)",
        conflicts_with = "replace"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        short = 'r',
        long,
        help = "Replace original files with compressed versions"
    )]
    pub replace: bool,

    #[arg(
        long = "png-quality",
        value_name = "RANGES",
        help = "Comma-separated pngquant quality ladder (default: 50-70,40-60,30-50)",
        long_help = "Quality ranges tried in order until pngquant accepts one. \
                     Each range is <min>-<max> between 0 and 100."
    )]
    pub png_quality: Option<QualityLadder>,

    #[arg(
        long = "jpeg-quality",
        value_name = "N",
        help = "cjpeg quality (1-100, default: 70)"
    )]
    pub jpeg_quality: Option<u8>,

    #[arg(
        long = "no-passthrough",
        help = "Fail PNGs whose quality ladder is exhausted instead of keeping the original"
    )]
    pub no_passthrough: bool,

    #[arg(
        long,
        value_name = "PATH",
        env = PNGQUANT_BIN_ENV,
        default_value = DEFAULT_PNGQUANT_BIN,
        help = "pngquant executable"
    )]
    pub pngquant: PathBuf,

    #[arg(
        long,
        value_name = "PATH",
        env = CJPEG_BIN_ENV,
        default_value = DEFAULT_CJPEG_BIN,
        help = "cjpeg (mozjpeg) executable"
    )]
    pub cjpeg: PathBuf,

    #[arg(
        short = 'j',
        long,
        default_value_t = 1,
        help = "Number of files processed in parallel (0: one per CPU)"
    )]
    pub jobs: usize,

    #[arg(
        long,
        value_name = "SECONDS",
        default_value_t = DEFAULT_TOOL_TIMEOUT_SECS,
        help = "Kill an external tool after this many seconds (0: no limit)"
    )]
    pub timeout: u64,

    #[arg(long = "no-progress", help = "Hide the progress bar")]
    pub no_progress: bool,

    #[arg(short = 'v', long, help = "Verbose logging", conflicts_with = "quiet")]
    pub verbose: bool,

    #[arg(short = 'q', long, help = "Only log warnings and errors")]
    pub quiet: bool,
}
