//! Image/label consistency audit for YOLO dataset splits.
//!
//! Read-only: nothing on disk is created or modified.

use log::{info, warn};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{get_image_extensions_set, LABEL_EXTENSION};
use crate::utils::file_stem_string;

// Mismatched names shown per category
pub const PREVIEW_LIMIT: usize = 10;

/// Audit result for one split.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitAudit {
    pub split: String,
    pub images: usize,
    pub labels: usize,
    /// Image stems with no label file, sorted.
    pub missing_labels: Vec<String>,
    /// Label stems with no image, sorted.
    pub orphan_labels: Vec<String>,
}

impl SplitAudit {
    pub fn is_consistent(&self) -> bool {
        self.missing_labels.is_empty() && self.orphan_labels.is_empty()
    }

    pub fn missing_preview(&self) -> &[String] {
        &self.missing_labels[..self.missing_labels.len().min(PREVIEW_LIMIT)]
    }

    pub fn orphan_preview(&self) -> &[String] {
        &self.orphan_labels[..self.orphan_labels.len().min(PREVIEW_LIMIT)]
    }

    pub fn print_summary(&self) {
        info!(
            "[{}] images={} labels={}",
            self.split, self.images, self.labels
        );
        if !self.missing_labels.is_empty() {
            warn!(
                "  Missing labels for {} images (showing up to {}): {:?}",
                self.missing_labels.len(),
                PREVIEW_LIMIT,
                self.missing_preview()
            );
        }
        if !self.orphan_labels.is_empty() {
            warn!(
                "  Orphan label files for {} (showing up to {}): {:?}",
                self.orphan_labels.len(),
                PREVIEW_LIMIT,
                self.orphan_preview()
            );
        }
    }
}

// Files directly under `dir` (non-recursive) whose extension passes `keep`
fn collect_stems(dir: &Path, keep: impl Fn(&str) -> bool) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;

    let mut stems = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(&keep);
        if matches {
            if let Some(stem) = file_stem_string(&path) {
                stems.push(stem);
            }
        }
    }
    Ok(stems)
}

/// Compare image and label stems of one `images/` + `labels/` pair.
pub fn audit_dirs(split: &str, images_dir: &Path, labels_dir: &Path) -> Result<SplitAudit> {
    let image_exts = get_image_extensions_set();
    let images = collect_stems(images_dir, |ext| {
        image_exts.contains(&ext.to_ascii_lowercase())
    })?;
    let labels = collect_stems(labels_dir, |ext| ext == LABEL_EXTENSION)?;

    let image_stems: BTreeSet<&str> = images.iter().map(String::as_str).collect();
    let label_stems: BTreeSet<&str> = labels.iter().map(String::as_str).collect();

    Ok(SplitAudit {
        split: split.to_string(),
        images: images.len(),
        labels: labels.len(),
        missing_labels: image_stems
            .difference(&label_stems)
            .map(|s| s.to_string())
            .collect(),
        orphan_labels: label_stems
            .difference(&image_stems)
            .map(|s| s.to_string())
            .collect(),
    })
}

/// Audit `<yolo_root>/<split>/{images,labels}`.
pub fn scan_split(yolo_root: &Path, split: &str) -> Result<SplitAudit> {
    let split_dir = yolo_root.join(split);
    audit_dirs(split, &split_dir.join("images"), &split_dir.join("labels"))
}
