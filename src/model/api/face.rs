use serde::{Deserialize, Serialize};

use crate::biometric::FaceMatch;

/// A face sample captured by the client, base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceCheckRequest {
    pub sample: String,
}

/// The service's verdict, plus whether our own policy accepts it.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceCheckResponse {
    pub matched: bool,
    pub distance: Option<f64>,
    pub accepted: bool,
}

impl FaceCheckResponse {
    pub fn new(result: FaceMatch, accepted: bool) -> Self {
        Self {
            matched: result.matched,
            distance: result.distance,
            accepted,
        }
    }
}
