//! Multi-scale face detector using ONNX Runtime via `ort`.
//!
//! A BlazeFace short-range model only sees 128x128 pixels at a time, so the
//! grayscale frame is swept as a tiled image pyramid: each level shrinks the
//! frame by `scale_factor`, every level is covered with overlapping 128x128
//! tiles, and the raw anchor detections from all tiles and levels are pooled.
//! A face is confirmed only where at least `min_neighbors` raw candidates
//! agree, which is what makes the two opaque tunables observable behavior.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::GrayImage;

use crate::detection::domain::face_detector::{DetectorOptions, FaceDetector};
use crate::shared::face_box::{FaceBox, DEFAULT_GROUP_IOU};
use crate::shared::frame::Frame;

/// BlazeFace model input resolution.
const INPUT_SIZE: u32 = 128;

/// Default confidence threshold for raw candidates.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Tile stride; half-window overlap so faces on tile seams are still seen.
const TILE_STRIDE: u32 = INPUT_SIZE / 2;

/// Number of BlazeFace anchors (short-range model).
const NUM_ANCHORS: usize = 896;

pub struct OnnxPyramidDetector {
    session: ort::session::Session,
    options: DetectorOptions,
    confidence: f64,
    anchors: Vec<[f32; 2]>,
}

impl OnnxPyramidDetector {
    pub fn new(
        model_path: &Path,
        options: DetectorOptions,
        confidence: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        if options.scale_factor <= 1.0 {
            return Err(format!(
                "scale factor must be greater than 1.0, got {}",
                options.scale_factor
            )
            .into());
        }
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;
        Ok(Self {
            session,
            options,
            confidence,
            anchors: generate_anchors(),
        })
    }

    /// Runs the model on one 128x128 tile and returns candidate boxes in
    /// tile pixel coordinates.
    fn detect_tile(&mut self, tile: &GrayImage) -> Result<Vec<RawDet>, Box<dyn std::error::Error>> {
        let input_tensor = preprocess(tile);
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // BlazeFace outputs two tensors:
        // - regressors: [1, 896, 16] (box deltas + keypoints)
        // - classificators: [1, 896, 1] (confidence scores)
        if outputs.len() < 2 {
            return Err(
                format!("BlazeFace model expected 2 outputs, got {}", outputs.len()).into(),
            );
        }

        let regressors = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;
        let reg_data = regressors.as_slice().ok_or("Cannot get regressor slice")?;
        let score_data = scores.as_slice().ok_or("Cannot get score slice")?;

        Ok(decode_candidates(
            reg_data,
            score_data,
            &self.anchors,
            self.confidence as f32,
        ))
    }
}

impl FaceDetector for OnnxPyramidDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
        let gray = frame.to_grayscale();
        let base = GrayImage::from_raw(gray.width(), gray.height(), gray.data().to_vec())
            .ok_or("Frame buffer does not match its dimensions")?;

        let mut candidates: Vec<FaceBox> = Vec::new();
        let mut scale = 1.0f64;

        loop {
            let lw = (frame.width() as f64 / scale).round() as u32;
            let lh = (frame.height() as f64 / scale).round() as u32;
            if lw < INPUT_SIZE || lh < INPUT_SIZE {
                break;
            }

            let level = if scale == 1.0 {
                base.clone()
            } else {
                imageops::resize(&base, lw, lh, FilterType::Triangle)
            };

            for ty in tile_origins(lh, INPUT_SIZE, TILE_STRIDE) {
                for tx in tile_origins(lw, INPUT_SIZE, TILE_STRIDE) {
                    let tile = imageops::crop_imm(&level, tx, ty, INPUT_SIZE, INPUT_SIZE)
                        .to_image();
                    for det in self.detect_tile(&tile)? {
                        candidates.push(det.to_frame_coords(tx, ty, scale));
                    }
                }
            }

            scale *= self.options.scale_factor;
        }

        let confirmed = FaceBox::group_candidates(
            &candidates,
            self.options.min_neighbors,
            DEFAULT_GROUP_IOU,
        );

        Ok(confirmed
            .iter()
            .filter_map(|b| b.clamp_to(frame.width(), frame.height()))
            .collect())
    }
}

/// A raw above-threshold detection in tile pixel coordinates.
#[derive(Clone, Copy, Debug)]
struct RawDet {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

impl RawDet {
    /// Maps tile coordinates back through tile origin and pyramid scale.
    fn to_frame_coords(self, tx: u32, ty: u32, scale: f64) -> FaceBox {
        let x1 = (self.x1 as f64 + tx as f64) * scale;
        let y1 = (self.y1 as f64 + ty as f64) * scale;
        let x2 = (self.x2 as f64 + tx as f64) * scale;
        let y2 = (self.y2 as f64 + ty as f64) * scale;
        FaceBox::new(
            x1.round() as i32,
            y1.round() as i32,
            (x2 - x1).round() as i32,
            (y2 - y1).round() as i32,
        )
    }
}

/// Decodes anchor-relative regressor output into tile-space boxes.
fn decode_candidates(
    reg_data: &[f32],
    score_data: &[f32],
    anchors: &[[f32; 2]],
    confidence: f32,
) -> Vec<RawDet> {
    let mut dets = Vec::new();
    let num_anchors = anchors.len().min(NUM_ANCHORS);

    for (i, &raw_score) in score_data.iter().enumerate().take(num_anchors) {
        let score = sigmoid(raw_score);
        if score < confidence {
            continue;
        }

        let anchor = &anchors[i];
        let reg_offset = i * 16;
        if reg_offset + 4 > reg_data.len() {
            break;
        }

        // Box center + size relative to the anchor, normalized to the tile
        let cx = anchor[0] + reg_data[reg_offset] / INPUT_SIZE as f32;
        let cy = anchor[1] + reg_data[reg_offset + 1] / INPUT_SIZE as f32;
        let w = reg_data[reg_offset + 2] / INPUT_SIZE as f32;
        let h = reg_data[reg_offset + 3] / INPUT_SIZE as f32;

        let side = INPUT_SIZE as f32;
        dets.push(RawDet {
            x1: ((cx - w / 2.0) * side).max(0.0),
            y1: ((cy - h / 2.0) * side).max(0.0),
            x2: ((cx + w / 2.0) * side).min(side),
            y2: ((cy + h / 2.0) * side).min(side),
        });
    }

    dets
}

/// Window origins covering `extent`, stepping by `stride`, with a final
/// window flush against the far edge when the stride does not divide evenly.
fn tile_origins(extent: u32, window: u32, stride: u32) -> Vec<u32> {
    debug_assert!(window <= extent);
    let mut origins = Vec::new();
    let mut origin = 0;
    while origin + window <= extent {
        origins.push(origin);
        origin += stride;
    }
    let last = extent - window;
    if origins.last() != Some(&last) {
        origins.push(last);
    }
    origins
}

/// Resize-free tile preprocessing: replicate the gray channel into RGB and
/// normalize to [0,1] NCHW float32, as the model expects.
fn preprocess(tile: &GrayImage) -> ndarray::Array4<f32> {
    let s = INPUT_SIZE as usize;
    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));

    for y in 0..s {
        for x in 0..s {
            let v = tile.get_pixel(x as u32, y as u32).0[0] as f32 / 255.0;
            for c in 0..3 {
                tensor[[0, c, y, x]] = v;
            }
        }
    }

    tensor
}

/// Generate BlazeFace anchors for the short-range model.
///
/// The short-range model uses two feature map sizes: 16x16 and 8x8,
/// with 2 and 6 anchors per cell respectively.
fn generate_anchors() -> Vec<[f32; 2]> {
    let strides = [(8, 2), (16, 6)]; // (stride, anchors_per_cell)
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for &(stride, num) in &strides {
        let grid_size = INPUT_SIZE as usize / stride;
        for y in 0..grid_size {
            for x in 0..grid_size {
                let cx = (x as f32 + 0.5) / grid_size as f32;
                let cy = (y as f32 + 0.5) / grid_size as f32;
                for _ in 0..num {
                    anchors.push([cx, cy]);
                }
            }
        }
    }

    anchors
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_origins_exact_fit() {
        assert_eq!(tile_origins(128, 128, 64), vec![0]);
    }

    #[test]
    fn test_tile_origins_even_stride() {
        assert_eq!(tile_origins(256, 128, 64), vec![0, 64, 128]);
    }

    #[test]
    fn test_tile_origins_flush_final_window() {
        // 300 - 128 = 172 is not on the stride grid; the sweep must still
        // reach the far edge.
        assert_eq!(tile_origins(300, 128, 64), vec![0, 64, 128, 172]);
    }

    #[test]
    fn test_tile_origins_cover_extent() {
        for extent in [128u32, 129, 200, 555, 1080] {
            let origins = tile_origins(extent, 128, 64);
            assert_eq!(origins[0], 0);
            assert_eq!(*origins.last().unwrap(), extent - 128);
        }
    }

    #[test]
    fn test_generate_anchors_count() {
        // 16x16 grid x 2 anchors + 8x8 grid x 6 anchors = 512 + 384 = 896
        assert_eq!(generate_anchors().len(), NUM_ANCHORS);
    }

    #[test]
    fn test_anchors_in_unit_range() {
        for a in generate_anchors() {
            assert!(a[0] > 0.0 && a[0] < 1.0);
            assert!(a[1] > 0.0 && a[1] < 1.0);
        }
    }

    #[test]
    fn test_sigmoid() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
        assert!((sigmoid(10.0) - 1.0).abs() < 0.001);
        assert!(sigmoid(-10.0) < 0.001);
    }

    #[test]
    fn test_preprocess_shape_and_range() {
        let tile = GrayImage::from_pixel(INPUT_SIZE, INPUT_SIZE, image::Luma([255]));
        let tensor = preprocess(&tile);
        assert_eq!(tensor.shape(), &[1, 3, 128, 128]);
        assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < 1e-6);
        assert!((tensor[[0, 2, 127, 127]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_preprocess_replicates_gray_channel() {
        let mut tile = GrayImage::from_pixel(INPUT_SIZE, INPUT_SIZE, image::Luma([0]));
        tile.put_pixel(3, 5, image::Luma([102]));
        let tensor = preprocess(&tile);
        let expected = 102.0 / 255.0;
        for c in 0..3 {
            assert!((tensor[[0, c, 5, 3]] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_decode_skips_low_confidence() {
        let anchors = generate_anchors();
        let reg = vec![0.0f32; NUM_ANCHORS * 16];
        let scores = vec![-10.0f32; NUM_ANCHORS]; // sigmoid ~ 0
        let dets = decode_candidates(&reg, &scores, &anchors, 0.5);
        assert!(dets.is_empty());
    }

    #[test]
    fn test_decode_emits_box_for_confident_anchor() {
        let anchors = generate_anchors();
        // Anchor at cell (8,8) of the 16x16 grid sits near the tile center,
        // so a 32x32 box decoded there is not clipped by the tile border.
        let idx = (8 * 16 + 8) * 2;
        let mut reg = vec![0.0f32; NUM_ANCHORS * 16];
        reg[idx * 16 + 2] = 32.0;
        reg[idx * 16 + 3] = 32.0;
        let mut scores = vec![-10.0f32; NUM_ANCHORS];
        scores[idx] = 10.0; // sigmoid ~ 1
        let dets = decode_candidates(&reg, &scores, &anchors, 0.5);
        assert_eq!(dets.len(), 1);
        let d = dets[0];
        assert!((d.x2 - d.x1 - 32.0).abs() < 1.0);
        assert!((d.y2 - d.y1 - 32.0).abs() < 1.0);
    }

    #[test]
    fn test_to_frame_coords_applies_origin_and_scale() {
        let det = RawDet {
            x1: 10.0,
            y1: 20.0,
            x2: 42.0,
            y2: 52.0,
        };
        let b = det.to_frame_coords(64, 0, 2.0);
        assert_eq!(b, FaceBox::new(148, 40, 64, 64));
    }
}
