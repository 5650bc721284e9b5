#![allow(dead_code)]

use img_compress::{Result, ToolInvocation, ToolOutput};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const PNG_BYTES: usize = 500;
pub const JPEG_BYTES: usize = 200;

pub fn write_file(path: &Path, data: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(path).unwrap().write_all(data).unwrap();
}

/// `{x.png, y.jpg, z.txt}` plus a nested copy of each under `a/b/`
pub fn create_test_tree(root: &Path) -> Vec<PathBuf> {
    let files = vec![
        root.join("x.png"),
        root.join("y.jpg"),
        root.join("z.txt"),
        root.join("a/b/c.png"),
        root.join("a/b/d.JPEG"),
        root.join("a/notes.txt"),
    ];
    for file in &files {
        let data = match file.extension().and_then(|e| e.to_str()) {
            Some("png") => vec![0x89; PNG_BYTES],
            Some("jpg") | Some("JPEG") => vec![0xFF; JPEG_BYTES],
            _ => b"not an image".to_vec(),
        };
        write_file(file, &data);
    }
    files
}

pub fn create_temp_directory() -> TempDir {
    TempDir::new().unwrap()
}

/// Simulated pngquant/cjpeg: writes the first half of the input to the
/// requested output and exits 0.
pub fn halving_tool(invocation: &ToolInvocation) -> Result<ToolOutput> {
    let output = invocation
        .value_after("--output")
        .or_else(|| invocation.value_after("-outfile"))
        .expect("tool invocation without an output path");
    let input = invocation.last_arg().expect("tool invocation without an input");
    let data = fs::read(input)?;
    fs::write(output, &data[..data.len() / 2])?;
    Ok(ToolOutput::with_code(0))
}

pub fn is_cjpeg(invocation: &ToolInvocation) -> bool {
    invocation.value_after("-outfile").is_some()
}

/// Write an executable shell script standing in for an external tool
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    write_file(&path, format!("#!/bin/sh\n{}\n", body).as_bytes());
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A pngquant stand-in that answers `--version` and truncates its input
#[cfg(unix)]
pub fn fake_pngquant(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "fake-pngquant",
        r#"if [ "$1" = "--version" ]; then echo "2.18.0"; exit 0; fi
out=""; prev=""; last=""
for a in "$@"; do
  if [ "$prev" = "--output" ]; then out="$a"; fi
  prev="$a"; last="$a"
done
head -c 100 "$last" > "$out""#,
    )
}

/// A cjpeg stand-in that answers `-version` and truncates its input
#[cfg(unix)]
pub fn fake_cjpeg(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "fake-cjpeg",
        r#"if [ "$1" = "-version" ]; then echo "mozjpeg version 4.1.1" >&2; exit 0; fi
out=""; prev=""; last=""
for a in "$@"; do
  if [ "$prev" = "-outfile" ]; then out="$a"; fi
  prev="$a"; last="$a"
done
head -c 50 "$last" > "$out""#,
    )
}

/// A cjpeg stand-in whose encodes always fail after writing garbage
#[cfg(unix)]
pub fn failing_cjpeg(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "failing-cjpeg",
        r#"if [ "$1" = "-version" ]; then exit 0; fi
prev=""
for a in "$@"; do
  if [ "$prev" = "-outfile" ]; then echo "garbage" > "$a"; fi
  prev="$a"
done
echo "Not a JPEG file: starts with 0xff 0xff" >&2
exit 1"#,
    )
}
