//! Presence checks for the external compressors.

use crate::error::{CompressionError, Result};
use crate::processing::CompressConfig;
use crate::tool::{probe, ToolRunner};
use std::path::Path;
use tracing::debug;

/// A required binary and how to probe it
#[derive(Debug, Clone, Copy)]
struct RequiredTool<'a> {
    label: &'static str,
    program: &'a Path,
    version_flag: &'static str,
}

/// Verify that pngquant and cjpeg can both be invoked.
///
/// Runs each tool's version probe. Any failure yields a single
/// `ToolUnavailable` naming every missing tool, before a file is touched.
pub fn check_dependencies(runner: &dyn ToolRunner, config: &CompressConfig) -> Result<()> {
    let required = [
        RequiredTool {
            label: "pngquant",
            program: &config.png.binary,
            version_flag: "--version",
        },
        RequiredTool {
            label: "cjpeg (mozjpeg)",
            program: &config.jpeg.binary,
            version_flag: "-version",
        },
    ];

    let missing: Vec<String> = required
        .iter()
        .filter(|tool| {
            let available = probe(runner, tool.program, tool.version_flag);
            debug!(
                tool = tool.label,
                program = %tool.program.display(),
                available,
                "Dependency probe"
            );
            !available
        })
        .map(|tool| tool.label.to_string())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    Err(CompressionError::ToolUnavailable {
        tool: missing.join(", "),
        reason: "not found on PATH or version probe failed".to_string(),
    })
}

/// Installation guidance for the current operating system
pub fn installation_instructions() -> &'static str {
    installation_instructions_for(std::env::consts::OS)
}

pub fn installation_instructions_for(os: &str) -> &'static str {
    match os {
        "macos" => {
            "Install the required tools with Homebrew:
  1. Install Homebrew (if not already installed):
     /bin/bash -c \"$(curl -fsSL https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh)\"
  2. Install pngquant:
     brew install pngquant
  3. Install mozjpeg:
     brew install mozjpeg"
        }
        "linux" => {
            "Install the required tools with your package manager:

Ubuntu/Debian:
  sudo apt-get update
  sudo apt-get install pngquant
  sudo apt-get install mozjpeg

CentOS/RHEL:
  sudo yum install pngquant
  sudo yum install mozjpeg

Arch Linux:
  sudo pacman -S pngquant
  sudo pacman -S mozjpeg"
        }
        "windows" => {
            "Install the required tools manually:

  1. pngquant:
     - Download the Windows build from https://pngquant.org/
     - Add the executable to your PATH

  2. mozjpeg:
     - Download the latest release from https://github.com/mozilla/mozjpeg/releases
     - Add the executable to your PATH"
        }
        _ => "See https://pngquant.org/ and https://github.com/mozilla/mozjpeg for installation instructions",
    }
}
