use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use crate::common::FrcnnBox;
use crate::utils;

/// One ground-truth box, in original-image pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthBox {
    pub class_name: String,
    pub bbox: FrcnnBox,
    #[serde(default)]
    pub difficult: bool,
}

/// Every ground-truth box of one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedImage {
    pub filepath: PathBuf,
    pub bboxes: Vec<GroundTruthBox>,
}

/// Parses one `filepath,x1,y1,x2,y2,class_name` line.
pub fn parse_annotation_line(line: &str) -> Result<(String, GroundTruthBox)> {
    let parts: Vec<&str> = line.trim().split(',').map(|x| x.trim()).collect();
    if parts.len() != 6 {
        bail!("Expected `filepath,x1,y1,x2,y2,class_name`, got `{}`", line.trim());
    }
    let mut coords = [0f32; 4];
    for (c, raw) in coords.iter_mut().zip(&parts[1..5]) {
        *c = raw
            .parse::<f32>()
            .with_context(|| format!("Invalid coordinate `{raw}` in `{}`", line.trim()))?;
    }
    let [x1, y1, x2, y2] = coords;
    Ok((
        parts[0].to_string(),
        GroundTruthBox {
            class_name: parts[5].to_string(),
            bbox: FrcnnBox::new(x1, y1, x2, y2),
            difficult: false,
        },
    ))
}

/// Reads an annotation file and groups its boxes by image, in order of first appearance.
///
/// Relative image paths are resolved against `data_dir` when one is given.
pub fn load_annotations(path: &str, data_dir: Option<&Path>) -> Result<Vec<AnnotatedImage>> {
    let lines = utils::file_to_vec(path.to_string())
        .with_context(|| format!("Failed to read annotation file {path}"))?;
    log::info!("Parsing annotation file {} ({} lines)", path, lines.len());

    let mut images: Vec<AnnotatedImage> = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let (filepath, gt) = parse_annotation_line(line)
            .with_context(|| format!("{}:{}", path, idx + 1))?;
        let filepath = match data_dir {
            Some(dir) if Path::new(&filepath).is_relative() => dir.join(&filepath),
            _ => PathBuf::from(&filepath),
        };

        match images.iter_mut().find(|img| img.filepath == filepath) {
            Some(img) => img.bboxes.push(gt),
            None => images.push(AnnotatedImage { filepath, bboxes: vec![gt] }),
        }
    }
    Ok(images)
}
