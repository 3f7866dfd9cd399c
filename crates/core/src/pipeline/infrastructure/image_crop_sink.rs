use std::path::{Path, PathBuf};

use crate::pipeline::crop_sink::CropSink;
use crate::shared::frame::Frame;

/// Saves each published crop as a numbered image file under a preview
/// directory.
///
/// A file-based preview keeps debug runs working on headless machines,
/// where an on-screen window would need a display.
pub struct ImageCropSink {
    dir: PathBuf,
    written: usize,
}

impl ImageCropSink {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            written: 0,
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl CropSink for ImageCropSink {
    fn publish(&mut self, crop: &Frame, label_id: u32) -> Result<(), Box<dyn std::error::Error>> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self
            .dir
            .join(format!("{:06}_label{}.png", self.written, label_id));

        match crop.channels() {
            1 => {
                let img =
                    image::GrayImage::from_raw(crop.width(), crop.height(), crop.data().to_vec())
                        .ok_or("Failed to create image from crop data")?;
                img.save(&path)?;
            }
            _ => {
                let img =
                    image::RgbImage::from_raw(crop.width(), crop.height(), crop.data().to_vec())
                        .ok_or("Failed to create image from crop data")?;
                img.save(&path)?;
            }
        }

        self.written += 1;
        Ok(())
    }
}
