//! COCO to YOLO dataset tools and training launcher for a single-class
//! hot dog detector.
//!
//! This library provides the label converter, the dataset audit and the
//! launcher that drives an external YOLO training framework.

pub mod audit;
pub mod coco;
pub mod config;
pub mod conversion;
pub mod dataset;
pub mod error;
pub mod io;
pub mod launcher;
pub mod types;
pub mod utils;

// Re-export commonly used types and functions
pub use audit::{scan_split, SplitAudit};
pub use coco::{Annotation, CocoFile, Image};
pub use config::{CheckArgs, ConvertArgs, TrainArgs};
pub use conversion::{coco_to_yolo_bbox, convert_to_yolo_format};
pub use dataset::{convert_split, process_dataset, SplitPaths};
pub use error::{Error, Result};
pub use launcher::{
    run_training_pipeline, DetectionBackend, Device, TrainConfig, UltralyticsCli,
    ValidationMetrics,
};
pub use types::{ConversionSummary, LabelLine, SplitOutcome, YoloBox};
