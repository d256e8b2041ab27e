use crate::coco::{Annotation, Image};
use crate::types::{LabelLine, YoloBox, DEFAULT_CLASS_ID};

/// Convert a COCO `[x, y, w, h]` pixel box to a normalized center-form box.
///
/// Each field is clamped independently to `[0, 1]`.
pub fn coco_to_yolo_bbox(bbox: [f64; 4], image_width: f64, image_height: f64) -> YoloBox {
    let [x, y, w, h] = bbox;
    let x_center = (x + w / 2.0) / image_width;
    let y_center = (y + h / 2.0) / image_height;
    let width = w / image_width;
    let height = h / image_height;

    YoloBox {
        x_center: clamp_unit(x_center),
        y_center: clamp_unit(y_center),
        width: clamp_unit(width),
        height: clamp_unit(height),
    }
}

// NaN (zero-sized image) collapses to 0.0
fn clamp_unit(value: f64) -> f64 {
    value.max(0.0).min(1.0)
}

/// Build label lines for one image; annotations without a bbox are skipped.
///
/// The dataset has a single class, so every line carries [`DEFAULT_CLASS_ID`].
pub fn calculate_label_lines(image: &Image, annotations: &[&Annotation]) -> Vec<LabelLine> {
    let (width, height) = (image.width as f64, image.height as f64);
    annotations
        .iter()
        .filter_map(|annotation| annotation.bbox)
        .map(|bbox| LabelLine {
            class_id: DEFAULT_CLASS_ID,
            bbox: coco_to_yolo_bbox(bbox, width, height),
        })
        .collect()
}

/// Convert an image's annotations to label file contents.
///
/// Lines are newline-joined without a trailing newline; no annotations
/// yields an empty string.
pub fn convert_to_yolo_format(image: &Image, annotations: &[&Annotation]) -> String {
    let mut yolo_data = String::with_capacity(annotations.len() * 48);

    for (i, line) in calculate_label_lines(image, annotations).iter().enumerate() {
        if i > 0 {
            yolo_data.push('\n');
        }
        yolo_data.push_str(&line.to_string());
    }

    yolo_data
}
