//! Face engine: detection plus encoding behind one seam.

use crate::detector::{DetectorError, FaceDetector};
use crate::encoder::{EncoderError, FaceEncoder};
use crate::types::DetectedFace;
use image::RgbImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("encoder error: {0}")]
    Encoder(#[from] EncoderError),
}

/// Produces located, encoded faces from an image.
///
/// The pipeline only talks to this trait, so tests can substitute a
/// stub that returns canned faces without any model files.
pub trait FaceEngine {
    fn faces(&mut self, image: &RgbImage) -> Result<Vec<DetectedFace>, EngineError>;
}

/// ONNX-backed engine: SCRFD detection, ArcFace-style encoding.
pub struct OnnxEngine {
    detector: FaceDetector,
    encoder: FaceEncoder,
}

impl OnnxEngine {
    pub fn load(detector_model: &Path, encoder_model: &Path) -> Result<Self, EngineError> {
        Ok(Self {
            detector: FaceDetector::load(detector_model)?,
            encoder: FaceEncoder::load(encoder_model)?,
        })
    }
}

impl FaceEngine for OnnxEngine {
    fn faces(&mut self, image: &RgbImage) -> Result<Vec<DetectedFace>, EngineError> {
        let boxes = self.detector.detect(image)?;
        tracing::debug!(count = boxes.len(), "faces detected");

        let mut faces = Vec::with_capacity(boxes.len());
        for location in boxes {
            let encoding = self.encoder.encode(image, &location)?;
            faces.push(DetectedFace { location, encoding });
        }
        Ok(faces)
    }
}
