use serde::{Deserialize, Serialize};

use crate::integrity::VoteHash;
use crate::model::{common::ElectionId, mongodb::ApiId};

/// The outcome of checking one stored vote.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditVerdict {
    /// Unsealed, content matches the record, hash recomputes.
    Intact,
    /// The sealed payload failed to decrypt or authenticate.
    SealBroken,
    /// The payload opened but describes a different vote.
    ContentMismatch,
    /// The stored hash does not recompute from the record.
    HashMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub vote_id: ApiId,
    pub vote_hash: VoteHash,
    pub verdict: AuditVerdict,
}

/// Per-record audit results for an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub election_id: ElectionId,
    pub total: usize,
    pub intact: usize,
    pub entries: Vec<AuditEntry>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.intact == self.total
    }

    pub fn failures(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.verdict != AuditVerdict::Intact)
    }
}
