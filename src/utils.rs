use indicatif::{ProgressBar, ProgressStyle};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Read and parse a JSON file by streaming it from disk.
pub fn read_and_parse_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = fs::File::open(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
            label
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Create a directory (and parents) if missing, leaving existing contents alone
pub fn ensure_directory(path: &Path) -> Result<PathBuf> {
    fs::create_dir_all(path).map_err(|e| Error::io(path, e))?;
    Ok(path.to_path_buf())
}

/// File stem as an owned string, lossily converted.
pub fn file_stem_string(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coco::CocoFile;

    #[test]
    fn missing_json_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_and_parse_json::<CocoFile>(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn malformed_json_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{\"images\": [").unwrap();
        let err = read_and_parse_json::<CocoFile>(&path).unwrap_err();
        assert!(matches!(err, Error::Json { .. }));
    }

    #[test]
    fn ensure_directory_keeps_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let labels = dir.path().join("train/labels");
        ensure_directory(&labels).unwrap();
        fs::write(labels.join("keep.txt"), "0 0.5 0.5 0.1 0.1").unwrap();
        ensure_directory(&labels).unwrap();
        assert!(labels.join("keep.txt").exists());
    }

    #[test]
    fn stem_of_dotted_name() {
        assert_eq!(
            file_stem_string(Path::new("dir/a.b.JPG")),
            Some("a.b".to_string())
        );
    }
}
