use std::time::Duration;

use log::{debug, warn};
use rocket::tokio::time::timeout;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::hash::VoteHash;

#[derive(Debug, Error)]
pub enum NotaryError {
    #[error("No notary service is configured")]
    Disabled,
    #[error("Notary request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Notary returned an empty reference")]
    EmptyReference,
}

/// An external service that records vote hashes for later independent checking.
///
/// Delivery is never guaranteed; callers must treat every failure as advisory.
#[rocket::async_trait]
pub trait Notary: Send + Sync {
    async fn notarize(&self, hash: &VoteHash) -> Result<String, NotaryError>;
}

/// Used when no notary is configured.
#[derive(Debug, Copy, Clone, Default)]
pub struct DisabledNotary;

#[rocket::async_trait]
impl Notary for DisabledNotary {
    async fn notarize(&self, _hash: &VoteHash) -> Result<String, NotaryError> {
        Err(NotaryError::Disabled)
    }
}

#[derive(Serialize)]
struct NotarizeRequest {
    hash: VoteHash,
}

#[derive(Deserialize)]
struct NotarizeResponse {
    tx_ref: String,
}

/// Posts `{"hash": ...}` to a notary endpoint, expecting `{"tx_ref": ...}` back.
pub struct HttpNotary {
    client: reqwest::Client,
    url: String,
}

impl HttpNotary {
    pub fn new(url: String, request_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self { client, url })
    }
}

#[rocket::async_trait]
impl Notary for HttpNotary {
    async fn notarize(&self, hash: &VoteHash) -> Result<String, NotaryError> {
        let response: NotarizeResponse = self
            .client
            .post(&self.url)
            .json(&NotarizeRequest { hash: *hash })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if response.tx_ref.is_empty() {
            return Err(NotaryError::EmptyReference);
        }
        Ok(response.tx_ref)
    }
}

/// What became of the notarisation attempt for a vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotarizationInfo {
    Recorded { reference: String },
    /// No notary is configured.
    Skipped,
    /// The notary failed or timed out; the vote stands regardless.
    Unavailable,
}

impl NotarizationInfo {
    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::Recorded { reference } => Some(reference),
            Self::Skipped | Self::Unavailable => None,
        }
    }
}

/// Ask the notary to record `hash`, giving up after `limit`.
pub async fn notarize_within(notary: &dyn Notary, hash: &VoteHash, limit: Duration) -> NotarizationInfo {
    match timeout(limit, notary.notarize(hash)).await {
        Ok(Ok(reference)) => {
            debug!("Notarised vote {hash} as {reference}");
            NotarizationInfo::Recorded { reference }
        }
        Ok(Err(NotaryError::Disabled)) => NotarizationInfo::Skipped,
        Ok(Err(e)) => {
            warn!("Notarisation of vote {hash} failed: {e}");
            NotarizationInfo::Unavailable
        }
        Err(_) => {
            warn!("Notarisation of vote {hash} timed out after {limit:?}");
            NotarizationInfo::Unavailable
        }
    }
}
