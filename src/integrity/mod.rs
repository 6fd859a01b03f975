//! Sealing, hashing, notarisation and auditing of cast votes.

mod audit;
mod hash;
mod notary;
mod seal;

pub use audit::audit_votes;
pub use hash::{truncate_to_millis, VoteHash, HASH_LEN};
pub use notary::{notarize_within, DisabledNotary, HttpNotary, NotarizationInfo, Notary, NotaryError};
pub use seal::{IntegrityFailure, SealedPayload, VoteSealer, KEY_LEN, NONCE_LEN, TAG_LEN};

#[cfg(test)]
pub use notary::fakes;

use rocket::serde::json::serde_json;
use serde::{Deserialize, Serialize};

use crate::model::common::{CandidateId, ElectionId, VoterId};
use crate::model::db::vote::VoteCore;

/// The plaintext that gets sealed for each vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteContent {
    pub election_id: ElectionId,
    pub candidate_id: CandidateId,
    pub voter_id: VoterId,
    pub cast_at_millis: i64,
}

impl VoteContent {
    pub fn to_bytes(&self) -> Result<Vec<u8>, IntegrityFailure> {
        serde_json::to_vec(self).map_err(|_| IntegrityFailure::Content)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IntegrityFailure> {
        serde_json::from_slice(bytes).map_err(|_| IntegrityFailure::Content)
    }

    /// Does this content describe the given stored vote?
    pub fn matches(&self, vote: &VoteCore) -> bool {
        self.election_id == vote.election_id
            && self.candidate_id == vote.candidate_id
            && self.voter_id == vote.voter_id
            && self.cast_at_millis == vote.cast_at.timestamp_millis()
    }
}
