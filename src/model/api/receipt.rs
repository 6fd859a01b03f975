use chrono::{serde::ts_milliseconds, DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::integrity::{NotarizationInfo, VoteHash};
use crate::model::{
    common::{CandidateId, ElectionId, VoterId},
    db::vote::Vote,
    mongodb::ApiId,
};

/// Returned to the voter when their vote is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub vote_id: ApiId,
    pub election_id: ElectionId,
    pub vote_hash: VoteHash,
    pub notarization: NotarizationInfo,
    #[serde(with = "ts_milliseconds")]
    pub cast_at: DateTime<Utc>,
}

/// What anyone may learn about a vote from its hash: that it was cast, when,
/// and where it was notarised. Never the voter or the choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicReceipt {
    pub election_id: ElectionId,
    pub vote_hash: VoteHash,
    #[serde(with = "ts_milliseconds")]
    pub cast_at: DateTime<Utc>,
    pub notarization_ref: Option<String>,
}

impl From<Vote> for PublicReceipt {
    fn from(vote: Vote) -> Self {
        Self {
            election_id: vote.election_id,
            vote_hash: vote.vote_hash,
            cast_at: vote.cast_at,
            notarization_ref: vote.vote.notarization_ref,
        }
    }
}

/// A voter's (or auditor's) claim about a vote, checkable without the sealing key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteClaim {
    pub election_id: ElectionId,
    pub candidate_id: CandidateId,
    pub voter_id: VoterId,
    /// Milliseconds since the Unix epoch.
    pub cast_at: i64,
    pub vote_hash: VoteHash,
}

impl VoteClaim {
    /// Does the claimed hash recompute from the claimed fields?
    pub fn verify(&self) -> bool {
        match Utc.timestamp_millis_opt(self.cast_at).single() {
            Some(cast_at) => {
                VoteHash::compute(self.election_id, self.candidate_id, &self.voter_id, cast_at)
                    == self.vote_hash
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json;

    use super::*;

    fn claim() -> VoteClaim {
        VoteClaim {
            election_id: 1,
            candidate_id: 10,
            voter_id: "64b7f1e2a9c3d4e5f6a7b8c9".parse().unwrap(),
            cast_at: 1_714_651_200_000,
            vote_hash: "84f855fef06b7387d40f8bf880aaad1db62935c946a16cb5f2b415a7ab0e841f"
                .parse()
                .unwrap(),
        }
    }

    #[test]
    fn genuine_claim_verifies() {
        assert!(claim().verify());
    }

    #[test]
    fn altered_claim_fails() {
        let mut altered = claim();
        altered.candidate_id = 11;
        assert!(!altered.verify());

        let mut late = claim();
        late.cast_at += 1;
        assert!(!late.verify());
    }

    #[test]
    fn claims_read_plain_json() {
        let json = r#"{
            "election_id": 1,
            "candidate_id": 10,
            "voter_id": "64b7f1e2a9c3d4e5f6a7b8c9",
            "cast_at": 1714651200000,
            "vote_hash": "84f855fef06b7387d40f8bf880aaad1db62935c946a16cb5f2b415a7ab0e841f"
        }"#;
        let parsed: VoteClaim = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, claim());
    }
}
