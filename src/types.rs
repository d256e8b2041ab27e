use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

// Image formats the dataset audit recognises
pub const IMG_FORMATS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

// Extension of normalized label files
pub const LABEL_EXTENSION: &str = "txt";

// Splits processed when none are given on the command line
pub const DEFAULT_SPLITS: [&str; 2] = ["train", "valid"];

// Single-class dataset: every label line carries this id
pub const DEFAULT_CLASS_ID: u32 = 0;
pub const DEFAULT_CLASS_NAME: &str = "hotdog";

// Precomputed HashSet of image extensions for fast lookup
static IMAGE_EXTENSIONS_SET: OnceLock<HashSet<String>> = OnceLock::new();

/// Get the image extensions set
pub fn get_image_extensions_set() -> &'static HashSet<String> {
    IMAGE_EXTENSIONS_SET.get_or_init(|| IMG_FORMATS.iter().map(|ext| ext.to_lowercase()).collect())
}

/// A bounding box in center form, each field a fraction of the image size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoloBox {
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

/// One object line of a normalized label file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelLine {
    pub class_id: u32,
    pub bbox: YoloBox,
}

impl fmt::Display for LabelLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class_id,
            self.bbox.x_center,
            self.bbox.y_center,
            self.bbox.width,
            self.bbox.height
        )
    }
}

/// Per-split outcome of a conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitOutcome {
    /// Label files were written for this many images.
    Converted { written: usize },
    /// The interchange file for the split does not exist.
    Skipped,
}

// Struct to hold conversion statistics across all splits
#[derive(Debug, Default, Clone)]
pub struct ConversionSummary {
    pub splits: Vec<(String, SplitOutcome)>,
}

impl ConversionSummary {
    pub fn total_written(&self) -> usize {
        self.splits
            .iter()
            .map(|(_, outcome)| match outcome {
                SplitOutcome::Converted { written } => *written,
                SplitOutcome::Skipped => 0,
            })
            .sum()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &str> {
        self.splits
            .iter()
            .filter(|(_, outcome)| *outcome == SplitOutcome::Skipped)
            .map(|(split, _)| split.as_str())
    }

    pub fn print_summary(&self) {
        log::info!("=== Conversion Summary ===");
        for (split, outcome) in &self.splits {
            match outcome {
                SplitOutcome::Converted { written } => {
                    log::info!("[{}] label files written: {}", split, written)
                }
                SplitOutcome::Skipped => log::info!("[{}] skipped", split),
            }
        }
        log::info!("Total label files written: {}", self.total_written());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_line_uses_six_decimals() {
        let line = LabelLine {
            class_id: 0,
            bbox: YoloBox {
                x_center: 0.5,
                y_center: 0.25,
                width: 1.0 / 3.0,
                height: 0.0,
            },
        };
        assert_eq!(line.to_string(), "0 0.500000 0.250000 0.333333 0.000000");
    }

    #[test]
    fn extension_set_is_lowercase() {
        let set = get_image_extensions_set();
        assert!(set.contains("jpeg"));
        assert!(!set.contains("JPG"));
        assert!(!set.contains("webp"));
    }

    #[test]
    fn summary_counts_only_converted_splits() {
        let summary = ConversionSummary {
            splits: vec![
                ("train".to_string(), SplitOutcome::Converted { written: 3 }),
                ("valid".to_string(), SplitOutcome::Skipped),
                ("test".to_string(), SplitOutcome::Converted { written: 2 }),
            ],
        };
        assert_eq!(summary.total_written(), 5);
        assert_eq!(summary.skipped().collect::<Vec<_>>(), vec!["valid"]);
    }
}
