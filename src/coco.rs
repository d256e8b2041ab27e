//! COCO interchange file structures
//!
//! Only the fields the label conversion needs are modelled; everything else
//! in the file (info, licenses, categories, segmentation, ...) is ignored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::utils::file_stem_string;

/// COCO image information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: u64,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

impl Image {
    pub fn new(id: u64, file_name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id,
            file_name: file_name.into(),
            width,
            height,
        }
    }

    /// Base name of the image without its extension; names the label file.
    pub fn stem(&self) -> String {
        file_stem_string(Path::new(&self.file_name)).unwrap_or_default()
    }
}

/// COCO annotation information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    pub image_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>, // [x, y, width, height]
}

impl Annotation {
    pub fn new(image_id: u64, bbox: Option<[f64; 4]>) -> Self {
        Self { image_id, bbox }
    }
}

/// The subset of a COCO file read by the converter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CocoFile {
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// Images keyed by id together with their annotations.
///
/// A repeated image id keeps the last record, annotations are grouped in
/// file order.
#[derive(Debug, Default)]
pub struct CocoIndex<'a> {
    images: BTreeMap<u64, &'a Image>,
    annotations: BTreeMap<u64, Vec<&'a Annotation>>,
}

impl<'a> CocoIndex<'a> {
    pub fn new(file: &'a CocoFile) -> Self {
        let images = file.images.iter().map(|image| (image.id, image)).collect();

        let mut annotations: BTreeMap<u64, Vec<&Annotation>> = BTreeMap::new();
        for annotation in &file.annotations {
            annotations
                .entry(annotation.image_id)
                .or_default()
                .push(annotation);
        }

        Self {
            images,
            annotations,
        }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Iterate images with their annotations; images without any get an empty slice.
    pub fn iter(&self) -> impl Iterator<Item = (&'a Image, &[&'a Annotation])> + '_ {
        self.images.iter().map(move |(id, image)| {
            let annotations = self
                .annotations
                .get(id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            (*image, annotations)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_roboflow_style_file() {
        let json = r#"{
            "info": {"year": "2024"},
            "categories": [{"id": 0, "name": "hotdog"}],
            "images": [{"id": 0, "license": 1, "file_name": "a.rf.123.jpg", "height": 480, "width": 640}],
            "annotations": [
                {"id": 0, "image_id": 0, "category_id": 0, "bbox": [1, 2, 3, 4], "area": 12, "iscrowd": 0},
                {"id": 1, "image_id": 0, "category_id": 0, "segmentation": []}
            ]
        }"#;
        let file: CocoFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.images.len(), 1);
        assert_eq!(file.annotations[0].bbox, Some([1.0, 2.0, 3.0, 4.0]));
        assert_eq!(file.annotations[1].bbox, None);
        assert_eq!(file.images[0].stem(), "a.rf.123");
    }

    #[test]
    fn stem_drops_directories_and_extension() {
        assert_eq!(Image::new(1, "train/dog1.jpg", 1, 1).stem(), "dog1");
        assert_eq!(Image::new(2, "no_extension", 1, 1).stem(), "no_extension");
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let file: CocoFile = serde_json::from_str("{}").unwrap();
        assert!(CocoIndex::new(&file).is_empty());
    }

    #[test]
    fn index_groups_annotations_and_keeps_unannotated_images() {
        let file = CocoFile {
            images: vec![Image::new(2, "b.jpg", 10, 10), Image::new(1, "a.jpg", 10, 10)],
            annotations: vec![
                Annotation::new(1, Some([0.0, 0.0, 1.0, 1.0])),
                Annotation::new(1, Some([1.0, 1.0, 1.0, 1.0])),
                Annotation::new(7, Some([0.0, 0.0, 1.0, 1.0])),
            ],
        };
        let index = CocoIndex::new(&file);
        let entries: Vec<_> = index
            .iter()
            .map(|(image, anns)| (image.file_name.as_str(), anns.len()))
            .collect();
        assert_eq!(entries, vec![("a.jpg", 2), ("b.jpg", 0)]);
    }

    #[test]
    fn repeated_image_id_keeps_last_record() {
        let file = CocoFile {
            images: vec![Image::new(1, "old.jpg", 10, 10), Image::new(1, "new.jpg", 20, 20)],
            annotations: vec![],
        };
        let index = CocoIndex::new(&file);
        assert_eq!(index.len(), 1);
        let (image, _) = index.iter().next().unwrap();
        assert_eq!(image.file_name, "new.jpg");
    }
}
