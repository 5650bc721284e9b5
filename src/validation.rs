use crate::error::{CompressionError, Result};
use crate::formats::ImageKind;
use std::fs::{self, File};
use std::path::Path;

/// Validate a compression source before any tool is spawned.
///
/// Checks run in order and each yields its own error: the file must exist,
/// carry an extension of `kind`, and be openable for reading. Returns the
/// source size in bytes.
pub fn validate_source(path: &Path, kind: ImageKind) -> Result<u64> {
    if !path.is_file() {
        return Err(CompressionError::MissingInput(path.to_path_buf()));
    }

    if !kind.matches(path) {
        return Err(CompressionError::NotImageFormat {
            path: path.to_path_buf(),
            expected: kind.to_string(),
        });
    }

    File::open(path).map_err(|_| CompressionError::MissingInput(path.to_path_buf()))?;

    let metadata =
        fs::metadata(path).map_err(|_| CompressionError::MissingInput(path.to_path_buf()))?;
    Ok(metadata.len())
}

/// Validate the root of a tree walk
pub fn validate_input_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(CompressionError::MissingInput(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(CompressionError::InputNotDirectory(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_validate_source_not_found() {
        let result = validate_source(Path::new("nonexistent.png"), ImageKind::Png);
        assert!(matches!(result, Err(CompressionError::MissingInput(_))));
    }

    #[test]
    fn test_validate_source_wrong_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("photo.jpg");
        File::create(&path).unwrap().write_all(b"jpeg").unwrap();

        let result = validate_source(&path, ImageKind::Png);
        assert!(matches!(result, Err(CompressionError::NotImageFormat { .. })));
    }

    #[test]
    fn test_validate_source_directory_is_missing_input() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("folder.png");
        fs::create_dir(&dir).unwrap();

        let result = validate_source(&dir, ImageKind::Png);
        assert!(matches!(result, Err(CompressionError::MissingInput(_))));
    }

    #[test]
    fn test_validate_source_returns_size() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("image.PNG");
        File::create(&path).unwrap().write_all(b"fake png data").unwrap();

        assert_eq!(validate_source(&path, ImageKind::Png).unwrap(), 13);
    }

    #[test]
    fn test_validate_input_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert!(validate_input_dir(temp_dir.path()).is_ok());

        let file = temp_dir.path().join("file.txt");
        File::create(&file).unwrap();
        assert!(matches!(
            validate_input_dir(&file),
            Err(CompressionError::InputNotDirectory(_))
        ));
        assert!(matches!(
            validate_input_dir(&temp_dir.path().join("missing")),
            Err(CompressionError::MissingInput(_))
        ));
    }
}
