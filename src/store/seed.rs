//! Initial data for a [`MemoryStore`], read from a JSON file at ignite.
//!
//! Nothing else creates voters, elections or candidates, so a memory
//! deployment without a seed has nobody to vote.

use std::fmt::{Display, Formatter};
use std::path::Path;

use chrono::{DateTime, Utc};
use rocket::serde::json::serde_json;
use serde::Deserialize;
use thiserror::Error;

use super::{EligibilitySource, MemoryStore};
use crate::model::{
    api::eligibility::EligibilityRow,
    common::{CandidateId, ElectionId, VoterId},
    db::{
        candidate::Candidate,
        election::{Election, ElectionCore},
        eligibility::EligibilityList,
        voter::{Voter, VoterCore},
    },
};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Cannot read seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed seed file: {0}")]
    Format(#[from] serde_json::Error),
    #[error("Election {0} ends before it starts")]
    InvalidWindow(ElectionId),
    #[error("{0} refers to unknown election {1}")]
    UnknownElection(String, ElectionId),
    #[error(transparent)]
    Store(#[from] crate::error::Error),
}

#[derive(Debug, Deserialize)]
pub struct Seed {
    #[serde(default)]
    elections: Vec<SeedElection>,
    #[serde(default)]
    candidates: Vec<SeedCandidate>,
    #[serde(default)]
    voters: Vec<SeedVoter>,
    #[serde(default)]
    eligibility: Vec<SeedList>,
}

#[derive(Debug, Deserialize)]
struct SeedElection {
    id: ElectionId,
    title: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct SeedCandidate {
    id: CandidateId,
    election_id: ElectionId,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SeedVoter {
    id: VoterId,
    #[serde(flatten)]
    voter: VoterCore,
}

#[derive(Debug, Deserialize)]
struct SeedList {
    list: EligibilityList,
    election_id: ElectionId,
    rows: Vec<EligibilityRow>,
}

/// How much a seed loaded.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SeedCounts {
    pub elections: usize,
    pub candidates: usize,
    pub voters: usize,
    pub eligibility_rows: usize,
}

impl Display for SeedCounts {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} elections, {} candidates, {} voters, {} eligibility rows",
            self.elections, self.candidates, self.voters, self.eligibility_rows
        )
    }
}

impl Seed {
    pub async fn read(path: &Path) -> Result<Self, SeedError> {
        let raw = rocket::tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl MemoryStore {
    /// Load a seed. Candidates and eligibility rows must name a seeded election.
    pub async fn load_seed(&self, seed: Seed) -> Result<SeedCounts, SeedError> {
        let mut counts = SeedCounts::default();
        let mut known = Vec::with_capacity(seed.elections.len());

        for election in seed.elections {
            let core = ElectionCore::new(election.title, election.start_time, election.end_time)
                .ok_or(SeedError::InvalidWindow(election.id))?;
            known.push(election.id);
            self.insert_election(Election::new(election.id, core)).await;
            counts.elections += 1;
        }

        for candidate in seed.candidates {
            if !known.contains(&candidate.election_id) {
                return Err(SeedError::UnknownElection(
                    format!("Candidate {}", candidate.id),
                    candidate.election_id,
                ));
            }
            self.insert_candidate(Candidate {
                id: candidate.id,
                election_id: candidate.election_id,
                name: candidate.name,
            })
            .await;
            counts.candidates += 1;
        }

        for voter in seed.voters {
            self.insert_voter(Voter::new(voter.id, voter.voter)).await;
            counts.voters += 1;
        }

        for list in seed.eligibility {
            if !known.contains(&list.election_id) {
                return Err(SeedError::UnknownElection(
                    format!("The {} list", list.list),
                    list.election_id,
                ));
            }
            let imported = self.list(list.list).import(list.election_id, &list.rows).await?;
            counts.eligibility_rows += imported.inserted + imported.updated;
        }

        Ok(counts)
    }
}
