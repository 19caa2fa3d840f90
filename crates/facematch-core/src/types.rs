use serde::{Deserialize, Serialize};

use crate::confidence::distance_to_confidence;

/// Bounding box for a detected face, in pixel coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceBox {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
    pub confidence: f32,
}

impl FaceBox {
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }
}

/// Face encoding vector (512-dimensional, L2-normalized).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encoding {
    pub values: Vec<f32>,
}

impl Encoding {
    /// Euclidean distance between two encodings.
    pub fn distance(&self, other: &Encoding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

/// A face found in an unknown image. Ephemeral, lives for one image.
#[derive(Debug, Clone)]
pub struct DetectedFace {
    pub location: FaceBox,
    pub encoding: Encoding,
}

/// One of the reference people. Built once at startup, immutable after.
#[derive(Debug, Clone)]
pub struct KnownIdentity {
    /// Display name, derived from the reference image's file name.
    pub name: String,
    pub encoding: Encoding,
}

/// Result of matching one detected face against the known identities.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// Name of the matched identity; `None` means "Unknown".
    pub name: Option<String>,
    /// Euclidean distance to the nearest known identity.
    pub distance: f32,
    /// Similarity fraction for the matched identity; only present on a match.
    pub confidence: Option<f32>,
    /// Per-identity distances, index-aligned with the known list.
    pub distances: Vec<f32>,
}

/// Strategy for matching a probe encoding against the known identities.
pub trait Matcher {
    fn best_match(&self, known: &[KnownIdentity], probe: &Encoding) -> MatchOutcome;
}

/// Euclidean nearest-identity matcher.
///
/// A known identity counts as a match when its distance is at or below
/// the threshold. The nearest identity is picked by an ascending scan
/// with a strict `<` comparison, so on an exact tie the earlier index
/// wins.
pub struct NearestMatcher {
    pub threshold: f32,
}

impl NearestMatcher {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }
}

impl Matcher for NearestMatcher {
    fn best_match(&self, known: &[KnownIdentity], probe: &Encoding) -> MatchOutcome {
        let distances: Vec<f32> = known.iter().map(|k| k.encoding.distance(probe)).collect();

        let Some(best_idx) = argmin(&distances) else {
            return MatchOutcome {
                name: None,
                distance: f32::INFINITY,
                confidence: None,
                distances,
            };
        };

        let best_distance = distances[best_idx];
        if best_distance <= self.threshold {
            MatchOutcome {
                name: Some(known[best_idx].name.clone()),
                distance: best_distance,
                confidence: Some(distance_to_confidence(best_distance, self.threshold)),
                distances,
            }
        } else {
            MatchOutcome {
                name: None,
                distance: best_distance,
                confidence: None,
                distances,
            }
        }
    }
}

/// Index of the smallest value; ascending scan, strict `<`, first
/// minimal index wins on ties. `None` for an empty slice.
pub fn argmin(values: &[f32]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            None => best = Some(i),
            Some(j) if v < values[j] => best = Some(i),
            Some(_) => {}
        }
    }
    best
}
