use std::time::Duration;

use data_encoding::BASE64;
use serde::Serialize;
use thiserror::Error;

use super::FaceMatch;
use crate::model::{db::voter::Voter, mongodb::ApiId};

#[derive(Debug, Error)]
pub enum FaceError {
    #[error("No face verification service is configured")]
    Unavailable,
    #[error("Captured sample is not valid base64")]
    BadSample,
    #[error("Face service request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// The external face-comparison service.
#[rocket::async_trait]
pub trait FaceVerifier: Send + Sync {
    /// Compare a base64 sample against the voter's registered template.
    async fn verify(&self, voter: &Voter, sample_b64: &str) -> Result<FaceMatch, FaceError>;
}

/// Used when no face service is configured. Every verification fails.
#[derive(Debug, Copy, Clone, Default)]
pub struct UnavailableFaceVerifier;

#[rocket::async_trait]
impl FaceVerifier for UnavailableFaceVerifier {
    async fn verify(&self, _voter: &Voter, _sample_b64: &str) -> Result<FaceMatch, FaceError> {
        Err(FaceError::Unavailable)
    }
}

#[derive(Serialize)]
struct CompareRequest<'a> {
    voter_id: ApiId,
    template_ref: Option<&'a str>,
    sample: &'a str,
}

/// Talks JSON to a face service over HTTP.
pub struct HttpFaceVerifier {
    client: reqwest::Client,
    url: String,
}

impl HttpFaceVerifier {
    pub fn new(url: String, request_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self { client, url })
    }
}

#[rocket::async_trait]
impl FaceVerifier for HttpFaceVerifier {
    async fn verify(&self, voter: &Voter, sample_b64: &str) -> Result<FaceMatch, FaceError> {
        // Don't ship garbage to the service.
        BASE64
            .decode(sample_b64.as_bytes())
            .map_err(|_| FaceError::BadSample)?;

        let request = CompareRequest {
            voter_id: voter.id.into(),
            template_ref: voter.face_template_ref.as_deref(),
            sample: sample_b64,
        };
        let result = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(result)
    }
}
