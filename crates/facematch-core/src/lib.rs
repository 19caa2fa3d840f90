//! facematch-core — Face detection, embedding extraction and identity matching.
//!
//! Uses SCRFD for face detection and an ArcFace-style embedder for face
//! encodings, both running via ONNX Runtime for CPU inference. Matching
//! is Euclidean nearest-identity against a small set of known faces.

pub mod confidence;
pub mod corpus;
pub mod detector;
pub mod encoder;
pub mod engine;
pub mod types;

pub use confidence::{distance_to_confidence, MATCH_THRESHOLD};
pub use corpus::discover_jpgs;
pub use engine::{EngineError, FaceEngine, OnnxEngine};
pub use types::{DetectedFace, Encoding, FaceBox, KnownIdentity, MatchOutcome, Matcher, NearestMatcher};
