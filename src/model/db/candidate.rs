use serde::{Deserialize, Serialize};

use crate::model::common::{CandidateId, ElectionId};

/// A candidate standing in exactly one election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: CandidateId,
    /// Foreign Key election ID.
    pub election_id: ElectionId,
    pub name: String,
}

impl Candidate {
    pub fn belongs_to(&self, election_id: ElectionId) -> bool {
        self.election_id == election_id
    }
}
