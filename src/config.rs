use clap::Parser;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::launcher::{Device, TrainConfig};
use crate::types::DEFAULT_SPLITS;

/// Convert per-split COCO annotation files into YOLO label files.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct ConvertArgs {
    /// Root of the COCO export; each split lives in its own subdirectory
    #[arg(long = "coco-root", default_value = "Hot Dog Detection COCO")]
    pub coco_root: PathBuf,

    /// Root of the YOLO dataset; labels go to <split>/labels
    #[arg(long = "yolo-root", default_value = "Hot Dog Detection YOLO")]
    pub yolo_root: PathBuf,

    /// Splits to convert
    #[arg(long = "splits", value_delimiter = ',', default_values_t = DEFAULT_SPLITS.map(String::from))]
    pub splits: Vec<String>,

    /// Name of the annotation file inside each COCO split directory
    #[arg(long = "annotations-file", default_value = "_annotations.coco.json")]
    pub annotations_file: String,

    /// Also write the dataset descriptor for the training framework here
    #[arg(long = "data-config")]
    pub data_config: Option<PathBuf>,
}

/// Check that every image in a split has a label file and vice versa.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct CheckArgs {
    /// Root of the YOLO dataset
    #[arg(long = "yolo-root", default_value = "Hot Dog Detection YOLO")]
    pub yolo_root: PathBuf,

    /// Splits to check
    #[arg(long = "splits", value_delimiter = ',', default_values_t = DEFAULT_SPLITS.map(String::from))]
    pub splits: Vec<String>,
}

/// Train, validate and run inference with a pretrained YOLO detector.
///
/// Hyperparameters not given as flags are read from EPOCHS, BATCH, IMGSZ,
/// WORKERS and DEVICE; empty variables are ignored.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct TrainArgs {
    /// Number of training epochs [env: EPOCHS] [default: 50]
    #[arg(long)]
    pub epochs: Option<u32>,

    /// Batch size [env: BATCH] [default: 16]
    #[arg(long)]
    pub batch: Option<u32>,

    /// Input image size [env: IMGSZ] [default: 640]
    #[arg(long)]
    pub imgsz: Option<u32>,

    /// Data loader workers [env: WORKERS] [default: 2]
    #[arg(long)]
    pub workers: Option<u32>,

    /// Accelerator index list (e.g. "0" or "0,1") or "cpu" [env: DEVICE] [default: 0]
    #[arg(long, value_parser = parse_device)]
    pub device: Option<Device>,

    /// Pretrained weights to start from
    #[arg(long, default_value = "yolov8m.pt")]
    pub model: String,

    /// Dataset descriptor passed to the framework
    #[arg(long, default_value = "data/hotdog.yaml")]
    pub data: PathBuf,

    /// Directory holding all runs
    #[arg(long, default_value = "runs/hotdog")]
    pub project: PathBuf,

    /// Run name for training; validation and predictions derive theirs from it
    #[arg(long, default_value = "yolov8m")]
    pub name: String,

    /// Images used for the visualized predictions
    #[arg(long, default_value = "Hot Dog Detection YOLO/valid/images")]
    pub source: PathBuf,

    /// Framework command-line executable
    #[arg(long = "yolo-bin", default_value = "yolo")]
    pub yolo_bin: String,
}

fn parse_device(s: &str) -> std::result::Result<Device, String> {
    s.parse::<Device>().map_err(|e| e.to_string())
}

// Flag, then non-empty environment variable, then default
fn resolve<T, E>(
    flag: Option<&T>,
    var: &'static str,
    default: T,
    env: &E,
    parse: impl Fn(&str) -> Result<T>,
) -> Result<T>
where
    T: Clone,
    E: Fn(&str) -> Option<String>,
{
    if let Some(value) = flag {
        return Ok(value.clone());
    }
    match env(var).filter(|raw| !raw.trim().is_empty()) {
        Some(raw) => parse(raw.trim()),
        None => Ok(default),
    }
}

fn parse_u32(var: &'static str) -> impl Fn(&str) -> Result<u32> {
    move |raw: &str| {
        raw.parse::<u32>().map_err(|_| Error::InvalidEnv {
            var,
            value: raw.to_string(),
        })
    }
}

impl TrainArgs {
    /// Resolve the immutable run configuration from flags and the process environment.
    pub fn to_train_config(&self) -> Result<TrainConfig> {
        self.resolve_with(|var| std::env::var(var).ok())
    }

    /// Resolve the run configuration, looking variables up through `env`.
    pub fn resolve_with<E>(&self, env: E) -> Result<TrainConfig>
    where
        E: Fn(&str) -> Option<String>,
    {
        let defaults = TrainConfig::default();
        Ok(TrainConfig {
            model: self.model.clone(),
            data: self.data.clone(),
            epochs: resolve(
                self.epochs.as_ref(),
                "EPOCHS",
                defaults.epochs,
                &env,
                parse_u32("EPOCHS"),
            )?,
            batch: resolve(
                self.batch.as_ref(),
                "BATCH",
                defaults.batch,
                &env,
                parse_u32("BATCH"),
            )?,
            imgsz: resolve(
                self.imgsz.as_ref(),
                "IMGSZ",
                defaults.imgsz,
                &env,
                parse_u32("IMGSZ"),
            )?,
            workers: resolve(
                self.workers.as_ref(),
                "WORKERS",
                defaults.workers,
                &env,
                parse_u32("WORKERS"),
            )?,
            device: resolve(self.device.as_ref(), "DEVICE", defaults.device, &env, |raw| {
                raw.parse::<Device>()
            })?,
            project: self.project.clone(),
            name: self.name.clone(),
            source: self.source.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn convert_defaults() {
        let args = ConvertArgs::parse_from(["coco2yolo"]);
        assert_eq!(args.splits, DEFAULT_SPLITS);
        assert_eq!(args.coco_root, PathBuf::from("Hot Dog Detection COCO"));
        assert_eq!(args.annotations_file, "_annotations.coco.json");
        assert!(args.data_config.is_none());
    }

    #[test]
    fn class_id_is_not_configurable() {
        assert!(ConvertArgs::try_parse_from(["coco2yolo", "--class-id", "3"]).is_err());
    }

    #[test]
    fn splits_are_comma_delimited() {
        let args = CheckArgs::parse_from(["check-dataset", "--splits", "train,valid,test"]);
        assert_eq!(args.splits, vec!["train", "valid", "test"]);
        let args = CheckArgs::parse_from(["check-dataset"]);
        assert_eq!(args.splits, DEFAULT_SPLITS);
    }

    #[test]
    fn defaults_without_flags_or_environment() {
        let args = TrainArgs::parse_from(["train-yolo"]);
        let config = args.resolve_with(env_from(&[])).unwrap();
        assert_eq!(config, TrainConfig::default());
    }

    #[test]
    fn environment_overrides_defaults() {
        let args = TrainArgs::parse_from(["train-yolo"]);
        let config = args
            .resolve_with(env_from(&[
                ("EPOCHS", "5"),
                ("BATCH", "8"),
                ("IMGSZ", "320"),
                ("WORKERS", "0"),
                ("DEVICE", "cpu"),
            ]))
            .unwrap();
        assert_eq!(config.epochs, 5);
        assert_eq!(config.batch, 8);
        assert_eq!(config.imgsz, 320);
        assert_eq!(config.workers, 0);
        assert_eq!(config.device, Device::Cpu);
    }

    #[test]
    fn empty_environment_values_fall_back_to_defaults() {
        let args = TrainArgs::parse_from(["train-yolo"]);
        let config = args
            .resolve_with(env_from(&[("EPOCHS", ""), ("DEVICE", ""), ("BATCH", "  ")]))
            .unwrap();
        assert_eq!(config.epochs, 50);
        assert_eq!(config.batch, 16);
        assert_eq!(config.device, Device::Accelerator("0".to_string()));
    }

    #[test]
    fn flags_override_environment() {
        let args = TrainArgs::parse_from([
            "train-yolo",
            "--epochs",
            "3",
            "--batch",
            "4",
            "--device",
            "cpu",
        ]);
        let config = args
            .resolve_with(env_from(&[("EPOCHS", "100"), ("DEVICE", "1"), ("IMGSZ", "1280")]))
            .unwrap();
        assert_eq!(config.epochs, 3);
        assert_eq!(config.batch, 4);
        assert_eq!(config.device, Device::Cpu);
        assert_eq!(config.imgsz, 1280);
    }

    #[test]
    fn invalid_environment_values_are_errors() {
        let args = TrainArgs::parse_from(["train-yolo"]);
        let err = args.resolve_with(env_from(&[("WORKERS", "two")])).unwrap_err();
        assert!(matches!(err, Error::InvalidEnv { var: "WORKERS", .. }));
        let err = args.resolve_with(env_from(&[("DEVICE", "gpu")])).unwrap_err();
        assert!(matches!(err, Error::InvalidDevice(_)));
    }

    #[test]
    fn rejects_bad_device_flag() {
        assert!(TrainArgs::try_parse_from(["train-yolo", "--device", "gpu"]).is_err());
    }
}
