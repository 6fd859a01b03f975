use serde::{Deserialize, Serialize};

/// Distances at or above this are never accepted.
pub const DEFAULT_FACE_THRESHOLD: f64 = 0.4;

/// What the face service reported for one comparison.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceMatch {
    pub matched: bool,
    /// Absent when the service could not score the sample.
    #[serde(default)]
    pub distance: Option<f64>,
}

/// Our own acceptance rule, applied on top of the service's verdict.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BiometricPolicy {
    threshold: f64,
}

impl BiometricPolicy {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Fail closed: a missing, unscored or negative result never passes.
    pub fn admits(&self, result: &FaceMatch) -> bool {
        match result.distance {
            Some(distance) => result.matched && (0.0..self.threshold).contains(&distance),
            None => false,
        }
    }
}

impl Default for BiometricPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_FACE_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(matched: bool, distance: Option<f64>) -> FaceMatch {
        FaceMatch { matched, distance }
    }

    #[test]
    fn below_threshold_passes() {
        let policy = BiometricPolicy::default();
        assert!(policy.admits(&result(true, Some(0.1))));
        assert!(policy.admits(&result(true, Some(0.0))));
        assert!(policy.admits(&result(true, Some(0.399_999))));
    }

    #[test]
    fn threshold_is_exclusive() {
        let policy = BiometricPolicy::default();
        assert!(!policy.admits(&result(true, Some(0.4))));
        assert!(!policy.admits(&result(true, Some(0.75))));
    }

    #[test]
    fn missing_distance_fails_closed() {
        let policy = BiometricPolicy::default();
        assert!(!policy.admits(&result(true, None)));
        assert!(!policy.admits(&result(false, None)));
    }

    #[test]
    fn service_verdict_still_counts() {
        let policy = BiometricPolicy::default();
        assert!(!policy.admits(&result(false, Some(0.1))));
    }

    #[test]
    fn nan_is_rejected() {
        let policy = BiometricPolicy::default();
        assert!(!policy.admits(&result(true, Some(f64::NAN))));
    }

    #[test]
    fn negative_distance_is_rejected() {
        let policy = BiometricPolicy::default();
        assert!(!policy.admits(&result(true, Some(-5.0))));
        assert!(!policy.admits(&result(true, Some(-0.01))));
        assert!(!policy.admits(&result(true, Some(f64::NEG_INFINITY))));
    }

    #[test]
    fn configured_threshold() {
        let strict = BiometricPolicy::new(0.2);
        assert!(!strict.admits(&result(true, Some(0.3))));
        assert!(strict.admits(&result(true, Some(0.19))));
    }
}
