use std::path::PathBuf;

/// Engine configuration, loaded from environment variables.
pub struct Config {
    /// Directory containing the ONNX model files.
    pub model_dir: PathBuf,
    /// Euclidean distance threshold for a positive match. Also feeds
    /// the similarity transform, so the two can never disagree.
    pub match_threshold: f32,
}

impl Config {
    /// Load configuration from `FACEMATCH_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let model_dir = std::env::var("FACEMATCH_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("models"));

        Self {
            model_dir,
            match_threshold: env_f32(
                "FACEMATCH_MATCH_THRESHOLD",
                facematch_core::MATCH_THRESHOLD,
            ),
        }
    }

    /// Path to the SCRFD detection model.
    pub fn detector_model_path(&self) -> PathBuf {
        self.model_dir.join("det_500m.onnx")
    }

    /// Path to the face recognition model.
    pub fn encoder_model_path(&self) -> PathBuf {
        self.model_dir.join("w600k_r50.onnx")
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
