use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use crate::utils::{OptimizerError, OptimizerResult, OutputFormat, validate_input_path};

/// Reads a source image fully into memory.
pub async fn read_source(path: impl AsRef<Path>) -> OptimizerResult<Vec<u8>> {
    let path = path.as_ref();
    validate_input_path(path)?;
    fs::read(path)
        .await
        .map_err(|e| OptimizerError::io(format!("Failed to read {}: {}", path.display(), e)))
}

/// Display name for a source path (its file name, lossy).
pub fn file_name(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string())
}

/// Where the compressed copy of `name` goes: `compressed_<stem>.<ext>` in `out_dir`.
///
/// The extension follows the output format, so `photo.png` compressed to
/// JPEG becomes `compressed_photo.jpg`.
pub fn compressed_output_path(out_dir: &Path, name: &str, format: OutputFormat) -> PathBuf {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("image");
    out_dir.join(format!("compressed_{stem}.{}", format.primary_extension()))
}

/// Returns `path`, or `path` with `_1`, `_2`, ... appended to its stem,
/// whichever is not yet in `taken`. The returned path is added to `taken`.
pub fn claim_unique_path(path: PathBuf, taken: &mut HashSet<PathBuf>) -> PathBuf {
    let mut candidate = path.clone();
    let mut n = 0;
    while taken.contains(&candidate) {
        n += 1;
        let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
        let name = match path.extension() {
            Some(ext) => format!("{stem}_{n}.{}", ext.to_string_lossy()),
            None => format!("{stem}_{n}"),
        };
        candidate = path.with_file_name(name);
    }
    taken.insert(candidate.clone());
    candidate
}

/// Writes `bytes` to `path`, creating the parent directory if needed.
pub async fn write_output(path: &Path, bytes: &[u8]) -> OptimizerResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(|e| {
            OptimizerError::io(format!("Cannot create output directory: {e}"))
        })?;
    }
    fs::write(path, bytes)
        .await
        .map_err(|e| OptimizerError::io(format!("Failed to write {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_stem_outputs_get_distinct_paths() {
        let mut taken = HashSet::new();
        let first = compressed_output_path(Path::new("out"), "a.png", OutputFormat::Jpeg);
        let second = compressed_output_path(Path::new("out"), "a.jpg", OutputFormat::Jpeg);
        assert_eq!(first, second);

        assert_eq!(claim_unique_path(first, &mut taken), PathBuf::from("out/compressed_a.jpg"));
        assert_eq!(claim_unique_path(second.clone(), &mut taken), PathBuf::from("out/compressed_a_1.jpg"));
        assert_eq!(claim_unique_path(second, &mut taken), PathBuf::from("out/compressed_a_2.jpg"));
    }

    #[test]
    fn output_path_uses_format_extension() {
        let out = compressed_output_path(Path::new("/tmp/out"), "holiday.png", OutputFormat::Jpeg);
        assert_eq!(out, PathBuf::from("/tmp/out/compressed_holiday.jpg"));

        let out = compressed_output_path(Path::new("out"), "scan.tiff", OutputFormat::WebP);
        assert_eq!(out, PathBuf::from("out/compressed_scan.webp"));
    }

    #[test]
    fn file_name_strips_directories() {
        assert_eq!(file_name("a/b/c.jpg"), "c.jpg");
    }

    #[tokio::test]
    async fn write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("compressed_a.jpg");
        write_output(&path, b"jpegbytes").await.unwrap();

        let bytes = read_source(&path).await.unwrap();
        assert_eq!(bytes, b"jpegbytes");
    }

    #[tokio::test]
    async fn read_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_source(dir.path().join("nope.png")).await.is_err());
    }
}
