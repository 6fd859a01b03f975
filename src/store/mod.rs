//! Storage seams for identity, eligibility and the vote ledger.
//!
//! Each seam is a trait so the orchestrator can run against MongoDB in
//! production and an in-process store elsewhere.

use std::sync::Arc;

use log::debug;

use crate::error::{Error, Result};
use crate::integrity::VoteHash;
use crate::model::{
    api::eligibility::{EligibilityRow, ImportCounts},
    common::{CandidateId, ElectionId, ElectionStatus, Email, VoterId},
    db::{
        candidate::Candidate, election::Election, eligibility::EligibilityList, vote::Vote,
        voter::Voter,
    },
};

pub mod memory;
pub mod mongo;
pub mod seed;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Voters, elections and candidates.
#[rocket::async_trait]
pub trait Registry: Send + Sync {
    async fn voter(&self, voter_id: &VoterId) -> Result<Option<Voter>>;

    /// Fails with a not-found error if the voter does not exist.
    async fn is_voter_authorized(&self, voter_id: &VoterId) -> Result<bool> {
        self.voter(voter_id)
            .await?
            .map(|voter| voter.authorized)
            .ok_or_else(|| Error::not_found(format!("Voter {voter_id}")))
    }

    async fn election(&self, election_id: ElectionId) -> Result<Option<Election>>;

    async fn candidate(&self, candidate_id: CandidateId) -> Result<Option<Candidate>>;

    /// Overwrite the cached status of an election.
    async fn refresh_status(&self, election_id: ElectionId, status: ElectionStatus) -> Result<()>;

    /// Flag the voter's eligibility records for this election as consumed. Idempotent.
    ///
    /// An administrative repair entry point, e.g. for votes restored from an
    /// export. Casting never calls it: [`VoteLedger::append`] consumes the
    /// records inside its own transaction.
    async fn mark_voted(&self, voter_id: &VoterId, election_id: ElectionId) -> Result<()>;
}

/// One independently maintained eligibility list.
#[rocket::async_trait]
pub trait EligibilitySource: Send + Sync {
    fn list(&self) -> EligibilityList;

    /// Does this list hold an active record for the (already normalised) email?
    async fn is_eligible(&self, election_id: ElectionId, email: &Email) -> Result<bool>;

    /// Insert or update rows, keyed by (election, email).
    async fn import(&self, election_id: ElectionId, rows: &[EligibilityRow]) -> Result<ImportCounts>;

    /// Flag this list's records for (election, email) as consumed. Idempotent.
    ///
    /// Repair only, like [`Registry::mark_voted`].
    async fn mark_voted(&self, election_id: ElectionId, email: &Email) -> Result<()>;
}

/// The configured eligibility lists, consulted in order.
///
/// A voter is eligible if *any* list says so.
#[derive(Clone, Default)]
pub struct Eligibility {
    sources: Vec<Arc<dyn EligibilitySource>>,
}

impl Eligibility {
    pub fn new(sources: Vec<Arc<dyn EligibilitySource>>) -> Self {
        Self { sources }
    }

    pub fn lists(&self) -> Vec<EligibilityList> {
        self.sources.iter().map(|source| source.list()).collect()
    }

    pub fn source(&self, list: EligibilityList) -> Option<&dyn EligibilitySource> {
        self.sources
            .iter()
            .find(|source| source.list() == list)
            .map(|source| source.as_ref())
    }

    pub async fn is_eligible(&self, election_id: ElectionId, email: &Email) -> Result<bool> {
        for source in &self.sources {
            if source.is_eligible(election_id, email).await? {
                debug!("{email} is eligible for election {election_id} via the {} list", source.list());
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Repair only, like [`Registry::mark_voted`].
    pub async fn mark_voted(&self, election_id: ElectionId, email: &Email) -> Result<()> {
        for source in &self.sources {
            source.mark_voted(election_id, email).await?;
        }
        Ok(())
    }
}

/// The append-only store of cast votes.
#[rocket::async_trait]
pub trait VoteLedger: Send + Sync {
    async fn has_voted(&self, voter_id: &VoterId, election_id: ElectionId) -> Result<bool>;

    /// Atomically re-check the candidate, insert the vote, and mark every
    /// eligibility record for (election, email) as voted.
    ///
    /// Returns [`Error::StorageConflict`] if a vote for this (voter, election)
    /// already exists, however many callers race.
    async fn append(&self, vote: &Vote, voter_email: &Email) -> Result<()>;

    async fn votes(&self, election_id: ElectionId) -> Result<Vec<Vote>>;

    async fn find_by_hash(&self, vote_hash: &VoteHash) -> Result<Option<Vote>>;
}
