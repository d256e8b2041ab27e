use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{DEFAULT_CLASS_ID, DEFAULT_CLASS_NAME, LABEL_EXTENSION};
use crate::utils::ensure_directory;

/// Write (or overwrite) `<stem>.txt` in `labels_dir` with the given contents.
pub fn write_label_file(labels_dir: &Path, stem: &str, contents: &str) -> Result<PathBuf> {
    let label_path = labels_dir.join(format!("{}.{}", stem, LABEL_EXTENSION));
    let file = File::create(&label_path).map_err(|e| Error::io(&label_path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(contents.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| Error::io(&label_path, e))?;
    Ok(label_path)
}

/// Create the dataset descriptor used by the training framework
pub fn create_dataset_yaml(yaml_path: &Path, yolo_root: &Path) -> Result<()> {
    if let Some(parent) = yaml_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }
    let absolute_path = fs::canonicalize(yolo_root).map_err(|e| Error::io(yolo_root, e))?;

    let mut yaml_content = format!(
        "path: {}\ntrain: train/images\nval: valid/images\n",
        absolute_path.to_string_lossy()
    );
    yaml_content.push_str("\nnames:\n");
    yaml_content.push_str(&format!("    {}: {}\n", DEFAULT_CLASS_ID, DEFAULT_CLASS_NAME));

    let file = File::create(yaml_path).map_err(|e| Error::io(yaml_path, e))?;
    let mut dataset_yaml = BufWriter::new(file);
    dataset_yaml
        .write_all(yaml_content.as_bytes())
        .and_then(|_| dataset_yaml.flush())
        .map_err(|e| Error::io(yaml_path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_file_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        write_label_file(dir.path(), "dog1", "0 0.1 0.1 0.1 0.1\n0 0.2 0.2 0.2 0.2").unwrap();
        let path = write_label_file(dir.path(), "dog1", "").unwrap();
        assert_eq!(path, dir.path().join("dog1.txt"));
        assert_eq!(fs::read_to_string(path).unwrap(), "");
    }

    #[test]
    fn test_create_dataset_yaml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let yolo_root = temp_dir.path().join("yolo");
        fs::create_dir_all(&yolo_root).unwrap();
        let yaml_path = temp_dir.path().join("data/hotdog.yaml");

        create_dataset_yaml(&yaml_path, &yolo_root).unwrap();

        let yaml_content = fs::read_to_string(yaml_path).unwrap();
        assert!(yaml_content.contains("path:"));
        assert!(yaml_content.contains("train: train/images"));
        assert!(yaml_content.contains("val: valid/images"));
        assert!(yaml_content.contains("names:"));
        assert!(yaml_content.contains("0: hotdog"));
    }
}
