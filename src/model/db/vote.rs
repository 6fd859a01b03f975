use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::integrity::{SealedPayload, VoteHash};
use crate::model::{
    common::{CandidateId, ElectionId, VoterId},
    mongodb::Id,
};

/// Core vote data, as stored in the database.
///
/// There is at most one of these per (voter, election); the ledger's unique
/// index enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCore {
    pub voter_id: VoterId,
    pub election_id: ElectionId,
    pub candidate_id: CandidateId,
    /// The encrypted vote body.
    pub sealed: SealedPayload,
    /// Public proof-of-cast, recomputable from the fields above and `cast_at`.
    pub vote_hash: VoteHash,
    #[serde(default)]
    pub notarization_ref: Option<String>,
    /// Millisecond precision, matching what BSON stores.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub cast_at: DateTime<Utc>,
}

/// A vote without an ID.
pub type NewVote = VoteCore;

/// A vote from the database, with its unique ID.
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub vote: VoteCore,
}

impl Vote {
    /// Assign a fresh ID to a new vote.
    pub fn new(vote: NewVote) -> Self {
        Self { id: Id::new(), vote }
    }
}

impl Deref for Vote {
    type Target = VoteCore;

    fn deref(&self) -> &Self::Target {
        &self.vote
    }
}
