//! SCRFD face detector via ONNX Runtime.
//!
//! Runs the keypoint-free SCRFD variant (6 output tensors: scores and
//! box offsets for strides 8/16/32) on RGB images, with letterbox
//! preprocessing and NMS post-processing.

use crate::types::FaceBox;
use image::{imageops, RgbImage};
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

const INPUT_SIZE: u32 = 640;
const PIXEL_MEAN: f32 = 127.5;
const PIXEL_STD: f32 = 128.0;
const CONFIDENCE_THRESHOLD: f32 = 0.5;
const NMS_THRESHOLD: f32 = 0.4;
const STRIDES: [u32; 3] = [8, 16, 32];
const ANCHORS_PER_CELL: u32 = 2;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("detection model not found: {0}")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Scale and padding applied by the letterbox resize, kept so decoded
/// boxes can be mapped back to source-image coordinates.
struct Letterbox {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
}

/// Candidate detection in source-image coordinates, pre-NMS.
#[derive(Clone)]
struct Candidate {
    top: f32,
    right: f32,
    bottom: f32,
    left: f32,
    score: f32,
}

/// SCRFD-based face detector.
pub struct FaceDetector {
    session: Session,
}

impl FaceDetector {
    /// Load the SCRFD ONNX model from the given path.
    pub fn load(model_path: &Path) -> Result<Self, DetectorError> {
        if !model_path.exists() {
            return Err(DetectorError::ModelNotFound(
                model_path.display().to_string(),
            ));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        let num_outputs = session.outputs().len();
        tracing::info!(path = %model_path.display(), outputs = num_outputs, "loaded detection model");

        // 3 strides × (score, bbox); outputs are taken positionally:
        // [0-2] = scores 8/16/32, [3-5] = bboxes 8/16/32.
        if num_outputs < 6 {
            return Err(DetectorError::InferenceFailed(format!(
                "SCRFD model requires 6 outputs (3 strides x score/bbox), got {num_outputs}"
            )));
        }

        Ok(Self { session })
    }

    /// Detect faces in an RGB image.
    ///
    /// Returns boxes clamped to the image bounds, sorted by descending
    /// detector confidence. An image with no faces yields an empty vec.
    pub fn detect(&mut self, image: &RgbImage) -> Result<Vec<FaceBox>, DetectorError> {
        let (input, letterbox) = preprocess(image);

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let mut candidates = Vec::new();
        for (i, &stride) in STRIDES.iter().enumerate() {
            let (_, scores) = outputs[i]
                .try_extract_tensor::<f32>()
                .map_err(|e| DetectorError::InferenceFailed(format!("scores stride {stride}: {e}")))?;
            let (_, boxes) = outputs[i + 3]
                .try_extract_tensor::<f32>()
                .map_err(|e| DetectorError::InferenceFailed(format!("boxes stride {stride}: {e}")))?;

            decode_stride(scores, boxes, stride, &letterbox, &mut candidates);
        }

        let kept = nms(candidates, NMS_THRESHOLD);

        let (width, height) = image.dimensions();
        let mut result: Vec<FaceBox> = kept.iter().map(|c| clamp_to_image(c, width, height)).collect();
        result.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(result)
    }
}

/// Letterbox-resize an RGB image into a normalized NCHW tensor.
fn preprocess(image: &RgbImage) -> (Array4<f32>, Letterbox) {
    let (width, height) = image.dimensions();
    let scale = (INPUT_SIZE as f32 / width as f32).min(INPUT_SIZE as f32 / height as f32);
    let new_w = ((width as f32 * scale).round() as u32).max(1);
    let new_h = ((height as f32 * scale).round() as u32).max(1);
    let pad_x = (INPUT_SIZE - new_w) as f32 / 2.0;
    let pad_y = (INPUT_SIZE - new_h) as f32 / 2.0;

    let resized = imageops::resize(image, new_w, new_h, imageops::FilterType::Triangle);

    let size = INPUT_SIZE as usize;
    // Pad value of PIXEL_MEAN normalizes to 0.0.
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));

    let x_off = pad_x.floor() as u32;
    let y_off = pad_y.floor() as u32;
    for (x, y, pixel) in resized.enumerate_pixels() {
        let tx = (x + x_off) as usize;
        let ty = (y + y_off) as usize;
        for c in 0..3 {
            tensor[[0, c, ty, tx]] = (pixel.0[c] as f32 - PIXEL_MEAN) / PIXEL_STD;
        }
    }

    (tensor, Letterbox { scale, pad_x, pad_y })
}

/// Decode one stride level into source-image candidates.
fn decode_stride(
    scores: &[f32],
    boxes: &[f32],
    stride: u32,
    letterbox: &Letterbox,
    out: &mut Vec<Candidate>,
) {
    let grid = (INPUT_SIZE / stride) as usize;
    let num_anchors = grid * grid * ANCHORS_PER_CELL as usize;

    for idx in 0..num_anchors {
        let score = scores.get(idx).copied().unwrap_or(0.0);
        if score <= CONFIDENCE_THRESHOLD {
            continue;
        }

        let cell = idx / ANCHORS_PER_CELL as usize;
        let anchor_cx = ((cell % grid) * stride as usize) as f32;
        let anchor_cy = ((cell / grid) * stride as usize) as f32;

        // Box offsets are [left, top, right, bottom] distances from the
        // anchor center, in stride units.
        let off = idx * 4;
        if off + 3 >= boxes.len() {
            continue;
        }
        let x1 = anchor_cx - boxes[off] * stride as f32;
        let y1 = anchor_cy - boxes[off + 1] * stride as f32;
        let x2 = anchor_cx + boxes[off + 2] * stride as f32;
        let y2 = anchor_cy + boxes[off + 3] * stride as f32;

        out.push(Candidate {
            left: (x1 - letterbox.pad_x) / letterbox.scale,
            top: (y1 - letterbox.pad_y) / letterbox.scale,
            right: (x2 - letterbox.pad_x) / letterbox.scale,
            bottom: (y2 - letterbox.pad_y) / letterbox.scale,
            score,
        });
    }
}

/// Non-Maximum Suppression over score-sorted candidates.
fn nms(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<Candidate> = Vec::new();
    for c in candidates {
        if keep.iter().all(|k| iou(k, &c) <= iou_threshold) {
            keep.push(c);
        }
    }
    keep
}

fn iou(a: &Candidate, b: &Candidate) -> f32 {
    let x1 = a.left.max(b.left);
    let y1 = a.top.max(b.top);
    let x2 = a.right.min(b.right);
    let y2 = a.bottom.min(b.bottom);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let area_a = (a.right - a.left) * (a.bottom - a.top);
    let area_b = (b.right - b.left) * (b.bottom - b.top);
    let union = area_a + area_b - inter;

    if union > 0.0 {
        inter / union
    } else {
        0.0
    }
}

fn clamp_to_image(c: &Candidate, width: u32, height: u32) -> FaceBox {
    let clamp = |v: f32, max: u32| -> u32 { (v.max(0.0).round() as u32).min(max) };
    FaceBox {
        top: clamp(c.top, height),
        right: clamp(c.right, width),
        bottom: clamp(c.bottom, height),
        left: clamp(c.left, width),
        confidence: c.score,
    }
}
