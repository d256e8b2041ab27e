//! Training launcher
//!
//! Builds one immutable [`TrainConfig`] and drives the external detection
//! framework through train, validate and predict, strictly in that order.
//! The framework is reached through [`DetectionBackend`]; the default
//! implementation spawns the Ultralytics command-line tool.

use log::{info, warn};
use std::fmt;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::types::DEFAULT_CLASS_NAME;

// Fixed augmentation and scheduling profile
const SEED: u64 = 42;
const DEGREES: f64 = 0.0;
const TRANSLATE: f64 = 0.1;
const SCALE: f64 = 0.5;
const SHEAR: f64 = 0.0;
const HSV_H: f64 = 0.015;
const HSV_S: f64 = 0.7;
const HSV_V: f64 = 0.4;
const MOSAIC: f64 = 1.0;
const MIXUP: f64 = 0.1;
const PATIENCE: u32 = 20;
const COS_LR: bool = true;

// Prediction thresholds
const PREDICT_CONF: f64 = 0.25;
const PREDICT_IOU: f64 = 0.6;

const RULE: &str = "==================================================";

/// Compute device handed to the framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Device {
    Cpu,
    /// Accelerator indices, e.g. `"0"` or `"0,1"`.
    Accelerator(String),
}

impl Default for Device {
    fn default() -> Self {
        Device::Accelerator("0".to_string())
    }
}

impl FromStr for Device {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("cpu") {
            return Ok(Device::Cpu);
        }
        let valid = !s.is_empty()
            && s.split(',')
                .all(|idx| !idx.is_empty() && idx.chars().all(|c| c.is_ascii_digit()));
        if valid {
            Ok(Device::Accelerator(s.to_string()))
        } else {
            Err(Error::InvalidDevice(s.to_string()))
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Accelerator(indices) => f.write_str(indices),
        }
    }
}

/// Resolved hyperparameters and run locations for one launch.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    pub model: String,
    pub data: PathBuf,
    pub epochs: u32,
    pub batch: u32,
    pub imgsz: u32,
    pub workers: u32,
    pub device: Device,
    pub project: PathBuf,
    pub name: String,
    pub source: PathBuf,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            model: "yolov8m.pt".to_string(),
            data: PathBuf::from("data/hotdog.yaml"),
            epochs: 50,
            batch: 16,
            imgsz: 640,
            workers: 2,
            device: Device::default(),
            project: PathBuf::from("runs/hotdog"),
            name: "yolov8m".to_string(),
            source: PathBuf::from("Hot Dog Detection YOLO/valid/images"),
        }
    }
}

/// Ordered `key=value` arguments for one framework call.
pub type TaskArgs = Vec<(&'static str, String)>;

fn float_arg(value: f64) -> String {
    format!("{:?}", value)
}

fn bool_arg(value: bool) -> String {
    let text = if value { "True" } else { "False" };
    text.to_string()
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl TrainConfig {
    /// Directory the framework writes the training run into.
    pub fn run_dir(&self) -> PathBuf {
        self.project.join(&self.name)
    }

    /// Best checkpoint produced by training.
    pub fn trained_weights(&self) -> PathBuf {
        self.run_dir().join("weights").join("best.pt")
    }

    /// The framework's own per-epoch metrics log.
    pub fn results_file(&self) -> PathBuf {
        self.run_dir().join("results.csv")
    }

    pub fn val_name(&self) -> String {
        format!("{}-val", self.name)
    }

    pub fn predict_name(&self) -> String {
        format!("{}-preds", self.name)
    }

    pub fn train_args(&self) -> TaskArgs {
        vec![
            ("model", self.model.clone()),
            ("data", path_arg(&self.data)),
            ("epochs", self.epochs.to_string()),
            ("imgsz", self.imgsz.to_string()),
            ("batch", self.batch.to_string()),
            ("seed", SEED.to_string()),
            ("workers", self.workers.to_string()),
            ("project", path_arg(&self.project)),
            ("name", self.name.clone()),
            ("exist_ok", bool_arg(true)),
            ("device", self.device.to_string()),
            ("degrees", float_arg(DEGREES)),
            ("translate", float_arg(TRANSLATE)),
            ("scale", float_arg(SCALE)),
            ("shear", float_arg(SHEAR)),
            ("hsv_h", float_arg(HSV_H)),
            ("hsv_s", float_arg(HSV_S)),
            ("hsv_v", float_arg(HSV_V)),
            ("mosaic", float_arg(MOSAIC)),
            ("mixup", float_arg(MIXUP)),
            ("patience", PATIENCE.to_string()),
            ("cos_lr", bool_arg(COS_LR)),
        ]
    }

    pub fn val_args(&self) -> TaskArgs {
        vec![
            ("model", path_arg(&self.trained_weights())),
            ("data", path_arg(&self.data)),
            ("imgsz", self.imgsz.to_string()),
            ("project", path_arg(&self.project)),
            ("name", self.val_name()),
            ("exist_ok", bool_arg(true)),
            ("device", self.device.to_string()),
        ]
    }

    pub fn predict_args(&self) -> TaskArgs {
        vec![
            ("model", path_arg(&self.trained_weights())),
            ("source", path_arg(&self.source)),
            ("imgsz", self.imgsz.to_string()),
            ("conf", float_arg(PREDICT_CONF)),
            ("iou", float_arg(PREDICT_IOU)),
            ("save", bool_arg(true)),
            ("project", path_arg(&self.project)),
            ("name", self.predict_name()),
            ("exist_ok", bool_arg(true)),
            ("device", self.device.to_string()),
        ]
    }
}

/// Framework operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    Val,
    Predict,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Train => "train",
            Mode::Val => "val",
            Mode::Predict => "predict",
        }
    }
}

/// The external detection framework.
pub trait DetectionBackend {
    /// Run `mode` with the given arguments and return its captured report.
    fn run(&mut self, mode: Mode, args: &[(&'static str, String)]) -> Result<String>;
}

/// Copy `reader` line by line to `echo`, returning everything read.
pub fn echo_and_capture<R: Read, W: Write>(reader: R, echo: &mut W) -> io::Result<String> {
    let mut reader = BufReader::new(reader);
    let mut captured = String::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        echo.write_all(line.as_bytes())?;
        captured.push_str(&line);
    }
    echo.flush()?;
    Ok(captured)
}

/// Drives the Ultralytics `yolo` executable.
#[derive(Debug, Clone)]
pub struct UltralyticsCli {
    program: String,
}

impl UltralyticsCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl DetectionBackend for UltralyticsCli {
    fn run(&mut self, mode: Mode, args: &[(&'static str, String)]) -> Result<String> {
        let launch_error = |source: std::io::Error| Error::Launch {
            program: self.program.clone(),
            source,
        };

        let mut child = Command::new(&self.program)
            .arg("detect")
            .arg(mode.as_str())
            .args(args.iter().map(|(key, value)| format!("{}={}", key, value)))
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(launch_error)?;

        let captured = match child.stdout.take() {
            Some(stdout) => echo_and_capture(stdout, &mut io::stdout()),
            None => Ok(String::new()),
        };
        let captured = match captured {
            Ok(captured) => captured,
            Err(e) => {
                // Reap the child before bailing out
                let _ = child.kill();
                let _ = child.wait();
                return Err(launch_error(e));
            }
        };

        let status = child.wait().map_err(launch_error)?;
        if !status.success() {
            return Err(Error::Backend {
                program: self.program.clone(),
                mode: mode.as_str(),
                status,
            });
        }
        Ok(captured)
    }
}

/// Box metrics read from a validation report.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxMetrics {
    pub map50: f64,
    pub map50_95: f64,
    pub precision: f64,
    pub recall: f64,
    /// mAP50-95 per class. Single-class reports have no class rows, so the
    /// `all` row stands in for the hotdog class.
    pub per_class: Vec<(String, f64)>,
}

/// Outcome of metric extraction after validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationMetrics {
    Available(BoxMetrics),
    Unavailable { results_file: PathBuf },
}

struct ReportRow {
    name: String,
    values: [f64; 4],
}

// "<class> <images> <instances> <P> <R> <mAP50> <mAP50-95>"
fn parse_report_row(line: &str) -> Option<ReportRow> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 7 {
        return None;
    }
    let (name, numbers) = tokens.split_at(tokens.len() - 6);
    numbers[0].parse::<u64>().ok()?;
    numbers[1].parse::<u64>().ok()?;
    let mut values = [0.0; 4];
    for (slot, token) in values.iter_mut().zip(&numbers[2..]) {
        *slot = token.parse::<f64>().ok().filter(|v| v.is_finite())?;
    }
    Some(ReportRow {
        name: name.join(" "),
        values,
    })
}

/// Parse the summary table of a validation report.
///
/// Returns `None` unless an `all` row is present.
pub fn parse_validation_report(report: &str) -> Option<BoxMetrics> {
    let mut overall = None;
    let mut per_class = Vec::new();

    for line in report.lines().flat_map(|line| line.split('\r')) {
        let Some(row) = parse_report_row(line) else {
            continue;
        };
        if row.name == "all" {
            overall = Some(row.values);
        } else {
            per_class.push((row.name, row.values[3]));
        }
    }

    let [precision, recall, map50, map50_95] = overall?;
    if per_class.is_empty() {
        per_class.push((DEFAULT_CLASS_NAME.to_string(), map50_95));
    }
    Some(BoxMetrics {
        map50,
        map50_95,
        precision,
        recall,
        per_class,
    })
}

pub fn extract_metrics(report: &str, config: &TrainConfig) -> ValidationMetrics {
    match parse_validation_report(report) {
        Some(metrics) => ValidationMetrics::Available(metrics),
        None => {
            warn!("No metrics summary found in the validation report");
            ValidationMetrics::Unavailable {
                results_file: config.results_file(),
            }
        }
    }
}

/// Human-readable metrics block.
pub fn render_metrics(metrics: &ValidationMetrics) -> String {
    let mut text = format!("\n{}\nHOTDOG DETECTION RESULTS\n{}\n", RULE, RULE);
    match metrics {
        ValidationMetrics::Available(m) => {
            text.push_str(&format!("mAP@0.5      : {:.4}\n", m.map50));
            text.push_str(&format!("mAP@0.5:0.95 : {:.4}\n", m.map50_95));
            text.push_str(&format!("Precision    : {:.4}\n", m.precision));
            text.push_str(&format!("Recall       : {:.4}\n", m.recall));
            if let Some((name, map)) = m.per_class.first() {
                text.push_str(&format!("Per-class mAP: {:.4} ({})\n", map, name));
            }
        }
        ValidationMetrics::Unavailable { results_file } => {
            text.push_str(&format!(
                "Metrics available in: {}\n",
                results_file.display()
            ));
        }
    }
    text.push_str(RULE);
    text.push('\n');
    text
}

fn log_task(mode: Mode, args: &[(&'static str, String)]) {
    let rendered: Vec<String> = args
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();
    info!("Running {} with {}", mode.as_str(), rendered.join(" "));
}

/// Train, validate and predict; any backend failure stops the sequence.
pub fn run_training_pipeline<B, W>(
    backend: &mut B,
    config: &TrainConfig,
    out: &mut W,
) -> Result<ValidationMetrics>
where
    B: DetectionBackend + ?Sized,
    W: Write,
{
    let write_err = |e: std::io::Error| Error::io("<output>", e);

    info!(
        "Fine-tuning {} on {} for the '{}' class",
        config.model,
        config.data.display(),
        DEFAULT_CLASS_NAME
    );
    let train_args = config.train_args();
    log_task(Mode::Train, &train_args);
    backend.run(Mode::Train, &train_args)?;

    let val_args = config.val_args();
    log_task(Mode::Val, &val_args);
    let report = backend.run(Mode::Val, &val_args)?;

    let metrics = extract_metrics(&report, config);
    out.write_all(render_metrics(&metrics).as_bytes())
        .map_err(write_err)?;

    let predict_args = config.predict_args();
    log_task(Mode::Predict, &predict_args);
    backend.run(Mode::Predict, &predict_args)?;

    writeln!(out, "\nResults saved to: {}", config.run_dir().display()).map_err(write_err)?;
    writeln!(out, "{}", RULE).map_err(write_err)?;
    Ok(metrics)
}
