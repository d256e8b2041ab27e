use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::coco::{CocoFile, CocoIndex};
use crate::config::ConvertArgs;
use crate::conversion::convert_to_yolo_format;
use crate::error::Result;
use crate::io::{create_dataset_yaml, write_label_file};
use crate::types::{ConversionSummary, SplitOutcome};
use crate::utils::{create_progress_bar, ensure_directory, read_and_parse_json};

/// Where one split is read from and written to.
#[derive(Debug, Clone)]
pub struct SplitPaths {
    pub name: String,
    pub annotations_file: PathBuf,
    pub labels_dir: PathBuf,
}

impl SplitPaths {
    pub fn from_args(args: &ConvertArgs, split: &str) -> Self {
        Self {
            name: split.to_string(),
            annotations_file: args.coco_root.join(split).join(&args.annotations_file),
            labels_dir: args.yolo_root.join(split).join("labels"),
        }
    }
}

/// Write one label file per image listed in `coco`; returns the count written.
pub fn write_split_labels(
    coco: &CocoFile,
    labels_dir: &Path,
    label: &str,
) -> Result<usize> {
    ensure_directory(labels_dir)?;

    let index = CocoIndex::new(coco);
    let pb = create_progress_bar(index.len() as u64, label);

    let mut written = 0;
    for (image, annotations) in index.iter() {
        let yolo_data = convert_to_yolo_format(image, annotations);
        write_label_file(labels_dir, &image.stem(), &yolo_data)?;
        written += 1;
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(written)
}

/// Convert a single split; a missing annotation file skips the split.
pub fn convert_split(paths: &SplitPaths) -> Result<SplitOutcome> {
    if !paths.annotations_file.exists() {
        warn!(
            "Missing {}, skipping {}",
            paths.annotations_file.display(),
            paths.name
        );
        return Ok(SplitOutcome::Skipped);
    }

    let coco: CocoFile = read_and_parse_json(&paths.annotations_file)?;
    let written = write_split_labels(&coco, &paths.labels_dir, &paths.name)?;
    info!(
        "[{}] Wrote labels for {} images -> {}",
        paths.name,
        written,
        paths.labels_dir.display()
    );

    Ok(SplitOutcome::Converted { written })
}

/// Main conversion pipeline over every configured split
pub fn process_dataset(args: &ConvertArgs) -> Result<ConversionSummary> {
    let mut summary = ConversionSummary::default();

    for split in &args.splits {
        let paths = SplitPaths::from_args(args, split);
        let outcome = convert_split(&paths)?;
        summary.splits.push((split.clone(), outcome));
    }

    if let Some(data_config) = &args.data_config {
        info!("Creating {} ...", data_config.display());
        create_dataset_yaml(data_config, &args.yolo_root)?;
    }

    Ok(summary)
}
