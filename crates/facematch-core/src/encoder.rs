//! Face encoding extraction via ONNX Runtime.
//!
//! Crops a detected face with margin, resizes to the 112x112 recognition
//! input and runs an ArcFace-style model to obtain a 512-dimensional
//! L2-normalized encoding.

use crate::types::{Encoding, FaceBox};
use image::{imageops, RgbImage};
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

const INPUT_SIZE: u32 = 112;
const PIXEL_MEAN: f32 = 127.5;
// Symmetric normalization, unlike the detector's 128.0.
const PIXEL_STD: f32 = 127.5;
const ENCODING_DIM: usize = 512;
/// Extra context around the detector box, as a fraction of box size.
const CROP_MARGIN: f32 = 0.25;

#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("recognition model not found: {0}")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("face box is empty")]
    EmptyFaceBox,
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Crop rectangle in source-image coordinates.
#[derive(Debug, PartialEq, Eq)]
struct CropRegion {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

/// ArcFace-style face encoder.
pub struct FaceEncoder {
    session: Session,
}

impl FaceEncoder {
    /// Load the recognition ONNX model from the given path.
    pub fn load(model_path: &Path) -> Result<Self, EncoderError> {
        if !model_path.exists() {
            return Err(EncoderError::ModelNotFound(
                model_path.display().to_string(),
            ));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        tracing::info!(path = %model_path.display(), "loaded recognition model");

        Ok(Self { session })
    }

    /// Extract an encoding for one detected face.
    pub fn encode(&mut self, image: &RgbImage, face: &FaceBox) -> Result<Encoding, EncoderError> {
        let (width, height) = image.dimensions();
        let region = crop_region(face, width, height).ok_or(EncoderError::EmptyFaceBox)?;

        let crop = imageops::crop_imm(image, region.x, region.y, region.width, region.height).to_image();
        let resized = imageops::resize(&crop, INPUT_SIZE, INPUT_SIZE, imageops::FilterType::Triangle);

        let input = preprocess(&resized);
        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (_, raw) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| EncoderError::InferenceFailed(format!("encoding extraction: {e}")))?;

        if raw.len() != ENCODING_DIM {
            return Err(EncoderError::InferenceFailed(format!(
                "expected {ENCODING_DIM}-dim encoding, got {}",
                raw.len()
            )));
        }

        Ok(Encoding { values: l2_normalize(raw) })
    }
}

/// Expand the face box by [`CROP_MARGIN`] on every side, clamped to the
/// image. `None` when the box has no area.
fn crop_region(face: &FaceBox, image_width: u32, image_height: u32) -> Option<CropRegion> {
    let w = face.width() as f32;
    let h = face.height() as f32;
    if w <= 0.0 || h <= 0.0 {
        return None;
    }

    let x1 = (face.left as f32 - w * CROP_MARGIN).max(0.0) as u32;
    let y1 = (face.top as f32 - h * CROP_MARGIN).max(0.0) as u32;
    let x2 = ((face.right as f32 + w * CROP_MARGIN) as u32).min(image_width);
    let y2 = ((face.bottom as f32 + h * CROP_MARGIN) as u32).min(image_height);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    Some(CropRegion {
        x: x1,
        y: y1,
        width: x2 - x1,
        height: y2 - y1,
    })
}

/// Normalize a 112x112 RGB crop into a NCHW float tensor.
fn preprocess(crop: &RgbImage) -> Array4<f32> {
    let size = INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
    for (x, y, pixel) in crop.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = (pixel.0[c] as f32 - PIXEL_MEAN) / PIXEL_STD;
        }
    }
    tensor
}

fn l2_normalize(raw: &[f32]) -> Vec<f32> {
    let norm: f32 = raw.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        raw.iter().map(|x| x / norm).collect()
    } else {
        raw.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(top: u32, right: u32, bottom: u32, left: u32) -> FaceBox {
        FaceBox { top, right, bottom, left, confidence: 0.9 }
    }

    #[test]
    fn test_crop_region_adds_margin() {
        let region = crop_region(&face(100, 300, 300, 100), 640, 480).unwrap();
        // 200px box with 25% margin: 50px on each side.
        assert_eq!(region, CropRegion { x: 50, y: 50, width: 300, height: 300 });
    }

    #[test]
    fn test_crop_region_clamps_to_image() {
        let region = crop_region(&face(0, 640, 480, 0), 640, 480).unwrap();
        assert_eq!(region, CropRegion { x: 0, y: 0, width: 640, height: 480 });
    }

    #[test]
    fn test_crop_region_empty_box() {
        assert!(crop_region(&face(50, 50, 50, 50), 640, 480).is_none());
    }

    #[test]
    fn test_preprocess_shape() {
        let crop = RgbImage::from_pixel(INPUT_SIZE, INPUT_SIZE, image::Rgb([0, 128, 255]));
        let tensor = preprocess(&crop);
        assert_eq!(tensor.shape(), &[1, 3, 112, 112]);
    }

    #[test]
    fn test_preprocess_symmetric_normalization() {
        let crop = RgbImage::from_pixel(INPUT_SIZE, INPUT_SIZE, image::Rgb([0, 128, 255]));
        let tensor = preprocess(&crop);
        assert!((tensor[[0, 0, 0, 0]] + 1.0).abs() < 1e-6);
        assert!((tensor[[0, 1, 0, 0]] - (128.0 - 127.5) / 127.5).abs() < 1e-6);
        assert!((tensor[[0, 2, 0, 0]] - 1.0).abs() < 1e-2);
    }

    #[test]
    fn test_l2_normalize_unit_length() {
        let values = l2_normalize(&[3.0, 4.0]);
        let norm: f32 = values.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
        assert!((values[0] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        assert_eq!(l2_normalize(&[0.0, 0.0]), vec![0.0, 0.0]);
    }
}
