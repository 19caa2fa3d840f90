//! Distance-to-similarity transform.
//!
//! Remaps a Euclidean face distance onto a user-facing similarity
//! fraction. The two branches meet at the threshold (both yield 0.5)
//! and the sub-threshold branch applies a nonlinear boost so strong
//! matches read close to 1.0 instead of the raw linear value.

/// Maximum encoding distance at which two faces count as the same
/// person. The transform below is calibrated against this value; the
/// matcher must use the same threshold.
pub const MATCH_THRESHOLD: f32 = 0.6;

/// Convert a face distance into a similarity fraction.
///
/// Intended to read as a value in [0, 1] but not hard-clamped; callers
/// must tolerate slight excursions for distance ≈ 0 or very large
/// distances. Pure function of its two arguments.
pub fn distance_to_confidence(distance: f32, threshold: f32) -> f32 {
    if distance > threshold {
        let range = 1.0 - threshold;
        (1.0 - distance) / (range * 2.0)
    } else {
        let linear = 1.0 - distance / (threshold * 2.0);
        // linear >= 0.5 on this branch; the max(0.0) keeps f32 rounding
        // at the boundary from feeding powf a negative base.
        linear + (1.0 - linear) * ((linear - 0.5) * 2.0).max(0.0).powf(0.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branches_agree_at_threshold() {
        // Continuity at the boundary: both formulas must yield 0.5.
        let t = MATCH_THRESHOLD;
        let below = distance_to_confidence(t, t);
        let above = (1.0 - t) / ((1.0 - t) * 2.0);
        assert!((below - 0.5).abs() < 1e-6, "below branch: {below}");
        assert!((above - 0.5).abs() < 1e-6, "above branch: {above}");
    }

    #[test]
    fn test_zero_distance_is_full_confidence() {
        let c = distance_to_confidence(0.0, MATCH_THRESHOLD);
        assert!((c - 1.0).abs() < 1e-6, "got {c}");
    }

    #[test]
    fn test_distance_one_at_default_threshold() {
        // First branch: (1 - 1) / (2 * 0.4) = 0
        let c = distance_to_confidence(1.0, MATCH_THRESHOLD);
        assert!(c.abs() < 1e-6, "got {c}");
    }

    #[test]
    fn test_large_distance_goes_negative() {
        // Not clamped: distances past 1.0 map below zero.
        assert!(distance_to_confidence(1.5, MATCH_THRESHOLD) < 0.0);
    }

    #[test]
    fn test_strong_match_boosted_above_linear() {
        // At d = 0.2 the raw linear value is 1 - 0.2/1.2 ≈ 0.833; the
        // boost must push the reported similarity well above that.
        let c = distance_to_confidence(0.2, MATCH_THRESHOLD);
        let linear = 1.0 - 0.2 / (MATCH_THRESHOLD * 2.0);
        assert!(c > linear, "{c} not above linear {linear}");
        assert!(c < 1.0 + 1e-6);
    }

    #[test]
    fn test_monotonically_decreasing() {
        let samples = [0.0, 0.1, 0.3, 0.5, 0.6, 0.7, 0.9, 1.2];
        for w in samples.windows(2) {
            let a = distance_to_confidence(w[0], MATCH_THRESHOLD);
            let b = distance_to_confidence(w[1], MATCH_THRESHOLD);
            assert!(a > b, "conf({}) = {a} <= conf({}) = {b}", w[0], w[1]);
        }
    }

    #[test]
    fn test_never_nan() {
        for i in 0..200 {
            let d = i as f32 * 0.01;
            assert!(!distance_to_confidence(d, MATCH_THRESHOLD).is_nan(), "NaN at {d}");
        }
    }
}
