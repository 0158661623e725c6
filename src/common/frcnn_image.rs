use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

/// An image as read from disk, before any preprocessing.
#[derive(Debug, Clone, Default)]
pub struct FrcnnImage {
    pub image: RgbImage,
    pub img_width: u32,
    pub img_height: u32,
    pub path: Option<PathBuf>,
}

impl FrcnnImage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .with_context(|| format!("Failed to open image {}", path.display()))?;
        let mut frcnn_image = Self::from(image);
        frcnn_image.path = Some(path.to_path_buf());
        Ok(frcnn_image)
    }

    /// File name without directories or extension, used for output names.
    pub fn stem(&self) -> Option<String> {
        self.path
            .as_ref()
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned())
    }
}

impl std::ops::Deref for FrcnnImage {
    type Target = RgbImage;

    fn deref(&self) -> &Self::Target {
        &self.image
    }
}

impl std::ops::DerefMut for FrcnnImage {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.image
    }
}

impl From<RgbImage> for FrcnnImage {
    fn from(image: RgbImage) -> Self {
        let (img_width, img_height) = image.dimensions();
        Self {
            image,
            img_width,
            img_height,
            path: None,
        }
    }
}

impl From<DynamicImage> for FrcnnImage {
    fn from(image: DynamicImage) -> Self {
        Self::from(image.to_rgb8())
    }
}

impl From<GrayImage> for FrcnnImage {
    fn from(image: GrayImage) -> Self {
        Self::from(DynamicImage::from(image))
    }
}

impl From<RgbaImage> for FrcnnImage {
    fn from(image: RgbaImage) -> Self {
        Self::from(DynamicImage::from(image))
    }
}
