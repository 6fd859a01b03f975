use serde::{Deserialize, Serialize};

use crate::biometric::FaceMatch;
use crate::integrity::{NotarizationInfo, VoteHash};
use crate::model::{
    api::receipt::VoteReceipt,
    common::{CandidateId, Rejection, VoterId},
};

/// A request to cast one vote. The election comes from the route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastRequest {
    pub voter_id: VoterId,
    pub candidate_id: CandidateId,
    /// The session's face result, filled in from its face token. Never read
    /// from the request body.
    #[serde(skip)]
    pub biometric: Option<FaceMatch>,
    /// A reference the client already obtained from the notary.
    #[serde(default)]
    pub notarization_ref: Option<String>,
}

/// The answer to every cast request, whether accepted or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_hash: Option<VoteHash>,
    pub notarization: NotarizationInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
    /// Human-readable reason, present iff rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CastResponse {
    pub fn accepted(receipt: &VoteReceipt) -> Self {
        Self {
            success: true,
            vote_hash: Some(receipt.vote_hash),
            notarization: receipt.notarization.clone(),
            rejection: None,
            message: None,
        }
    }

    pub fn rejected(rejection: Rejection) -> Self {
        Self {
            success: false,
            vote_hash: None,
            notarization: NotarizationInfo::Skipped,
            rejection: Some(rejection),
            message: Some(rejection.to_string()),
        }
    }
}

#[cfg(test)]
pub mod examples {
    use super::*;
    use crate::model::db::candidate::Candidate;

    impl CastRequest {
        /// A request that passes the biometric policy comfortably.
        pub fn example(voter_id: VoterId) -> Self {
            Self {
                voter_id,
                candidate_id: Candidate::example().id,
                biometric: Some(FaceMatch {
                    matched: true,
                    distance: Some(0.1),
                }),
                notarization_ref: None,
            }
        }
    }
}
