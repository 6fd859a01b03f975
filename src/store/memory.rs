//! An in-process backend. All state sits behind one mutex, so every
//! operation, `append` included, is atomic.

use std::collections::HashMap;
use std::sync::Arc;

use rocket::tokio::sync::Mutex;

use super::{Eligibility, EligibilitySource, Registry, VoteLedger};
use crate::error::{Error, Result};
use crate::integrity::VoteHash;
use crate::model::{
    api::eligibility::{EligibilityRow, ImportCounts},
    common::{CandidateId, ElectionId, ElectionStatus, Email, Rejection, VoterId},
    db::{
        candidate::Candidate,
        election::Election,
        eligibility::{EligibilityList, EligibilityRecord},
        vote::Vote,
        voter::Voter,
    },
};

// Untyped records: the list is the map key.
type Record = EligibilityRecord<()>;

#[derive(Default)]
struct State {
    voters: HashMap<VoterId, Voter>,
    elections: HashMap<ElectionId, Election>,
    candidates: HashMap<CandidateId, Candidate>,
    lists: HashMap<EligibilityList, Vec<Record>>,
    votes: Vec<Vote>,
}

impl State {
    fn mark_voted(&mut self, election_id: ElectionId, email: &Email) {
        for record in self.lists.values_mut().flatten() {
            if record.election_id == election_id && &record.email == email {
                record.has_voted = true;
            }
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub async fn insert_voter(&self, voter: Voter) {
        self.state.lock().await.voters.insert(voter.id, voter);
    }

    pub async fn insert_election(&self, election: Election) {
        self.state.lock().await.elections.insert(election.id, election);
    }

    pub async fn insert_candidate(&self, candidate: Candidate) {
        self.state.lock().await.candidates.insert(candidate.id, candidate);
    }

    /// A handle on one eligibility list in this store.
    pub fn list(&self, list: EligibilityList) -> MemoryList {
        MemoryList {
            store: self.clone(),
            list,
        }
    }

    /// The given lists of this store, consulted in order.
    pub fn eligibility(&self, lists: &[EligibilityList]) -> Eligibility {
        Eligibility::new(
            lists
                .iter()
                .map(|&list| Arc::new(self.list(list)) as Arc<dyn EligibilitySource>)
                .collect(),
        )
    }

    /// A snapshot of one list's records for an election.
    pub async fn records(&self, list: EligibilityList, election_id: ElectionId) -> Vec<Record> {
        self.state
            .lock()
            .await
            .lists
            .get(&list)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| record.election_id == election_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[rocket::async_trait]
impl Registry for MemoryStore {
    async fn voter(&self, voter_id: &VoterId) -> Result<Option<Voter>> {
        Ok(self.state.lock().await.voters.get(voter_id).cloned())
    }

    async fn election(&self, election_id: ElectionId) -> Result<Option<Election>> {
        Ok(self.state.lock().await.elections.get(&election_id).cloned())
    }

    async fn candidate(&self, candidate_id: CandidateId) -> Result<Option<Candidate>> {
        Ok(self.state.lock().await.candidates.get(&candidate_id).cloned())
    }

    async fn refresh_status(&self, election_id: ElectionId, status: ElectionStatus) -> Result<()> {
        let mut state = self.state.lock().await;
        let election = state
            .elections
            .get_mut(&election_id)
            .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;
        election.status = status;
        Ok(())
    }

    async fn mark_voted(&self, voter_id: &VoterId, election_id: ElectionId) -> Result<()> {
        let mut state = self.state.lock().await;
        let email = state
            .voters
            .get(voter_id)
            .map(|voter| voter.email.clone())
            .ok_or_else(|| Error::not_found(format!("Voter {voter_id}")))?;
        state.mark_voted(election_id, &email);
        Ok(())
    }
}

#[rocket::async_trait]
impl VoteLedger for MemoryStore {
    async fn has_voted(&self, voter_id: &VoterId, election_id: ElectionId) -> Result<bool> {
        Ok(self
            .state
            .lock()
            .await
            .votes
            .iter()
            .any(|vote| &vote.voter_id == voter_id && vote.election_id == election_id))
    }

    async fn append(&self, vote: &Vote, voter_email: &Email) -> Result<()> {
        let mut state = self.state.lock().await;

        // Same uniqueness rules as the MongoDB indexes.
        let duplicate = state.votes.iter().any(|existing| {
            (existing.voter_id == vote.voter_id && existing.election_id == vote.election_id)
                || existing.vote_hash == vote.vote_hash
        });
        if duplicate {
            return Err(Error::StorageConflict);
        }

        let candidate_ok = state
            .candidates
            .get(&vote.candidate_id)
            .map_or(false, |candidate| candidate.belongs_to(vote.election_id));
        if !candidate_ok {
            return Err(Rejection::CandidateMismatch.into());
        }

        state.votes.push(vote.clone());
        state.mark_voted(vote.election_id, voter_email);
        Ok(())
    }

    async fn votes(&self, election_id: ElectionId) -> Result<Vec<Vote>> {
        Ok(self
            .state
            .lock()
            .await
            .votes
            .iter()
            .filter(|vote| vote.election_id == election_id)
            .cloned()
            .collect())
    }

    async fn find_by_hash(&self, vote_hash: &VoteHash) -> Result<Option<Vote>> {
        Ok(self
            .state
            .lock()
            .await
            .votes
            .iter()
            .find(|vote| &vote.vote_hash == vote_hash)
            .cloned())
    }
}

/// One eligibility list inside a [`MemoryStore`].
#[derive(Clone)]
pub struct MemoryList {
    store: MemoryStore,
    list: EligibilityList,
}

#[rocket::async_trait]
impl EligibilitySource for MemoryList {
    fn list(&self) -> EligibilityList {
        self.list
    }

    async fn is_eligible(&self, election_id: ElectionId, email: &Email) -> Result<bool> {
        let state = self.store.state.lock().await;
        Ok(state
            .lists
            .get(&self.list)
            .map_or(false, |records| {
                records.iter().any(|record| record.grants(election_id, email))
            }))
    }

    async fn import(&self, election_id: ElectionId, rows: &[EligibilityRow]) -> Result<ImportCounts> {
        let mut state = self.store.state.lock().await;
        let records = state.lists.entry(self.list).or_default();
        let mut counts = ImportCounts::default();

        for row in rows {
            if row.email.is_empty() {
                counts.skipped += 1;
                continue;
            }
            let existing = records
                .iter_mut()
                .find(|record| record.election_id == election_id && record.email == row.email);
            match existing {
                Some(record) => {
                    record.name = row.name.clone();
                    record.active = row.active;
                    counts.updated += 1;
                }
                None => {
                    records.push(Record::new(
                        election_id,
                        row.name.clone(),
                        row.email.clone(),
                        row.active,
                    ));
                    counts.inserted += 1;
                }
            }
        }
        Ok(counts)
    }

    async fn mark_voted(&self, election_id: ElectionId, email: &Email) -> Result<()> {
        let mut state = self.store.state.lock().await;
        if let Some(records) = state.lists.get_mut(&self.list) {
            records
                .iter_mut()
                .filter(|record| record.election_id == election_id && &record.email == email)
                .for_each(|record| record.has_voted = true);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::integrity::{SealedPayload, VoteHash, NONCE_LEN, TAG_LEN};
    use crate::model::{
        db::{
            election::examples::{ACTIVE_ID, UPCOMING_ID},
            vote::VoteCore,
            voter::VoterCore,
        },
        mongodb::Id,
    };

    fn vote(voter_id: VoterId, election_id: ElectionId, candidate_id: CandidateId) -> Vote {
        let cast_at = Utc::now();
        Vote::new(VoteCore {
            voter_id,
            election_id,
            candidate_id,
            sealed: SealedPayload {
                ciphertext: vec![1, 2, 3],
                iv: vec![0; NONCE_LEN],
                auth_tag: vec![0; TAG_LEN],
            },
            vote_hash: VoteHash::compute(election_id, candidate_id, &voter_id, cast_at),
            notarization_ref: None,
            cast_at,
        })
    }

    async fn store() -> MemoryStore {
        let store = MemoryStore::default();
        store.insert_election(Election::active_example()).await;
        store.insert_election(Election::upcoming_example()).await;
        store.insert_candidate(Candidate::example()).await;
        store.insert_candidate(Candidate::other_election_example()).await;
        store
    }

    fn row(email: &str) -> EligibilityRow {
        EligibilityRow {
            name: "Ada".to_string(),
            email: Email::normalize(email),
            active: true,
        }
    }

    #[rocket::async_test]
    async fn append_is_unique_per_voter_and_election() {
        let store = store().await;
        let voter = Id::new();
        let email = Email::normalize("ada@x.org");

        store.append(&vote(voter, ACTIVE_ID, 10), &email).await.unwrap();
        assert!(store.has_voted(&voter, ACTIVE_ID).await.unwrap());
        assert!(!store.has_voted(&voter, UPCOMING_ID).await.unwrap());

        let again = store.append(&vote(voter, ACTIVE_ID, 10), &email).await;
        assert!(matches!(again, Err(Error::StorageConflict)));
        assert_eq!(store.votes(ACTIVE_ID).await.unwrap().len(), 1);

        // A different election is fine.
        store.append(&vote(voter, UPCOMING_ID, 20), &email).await.unwrap();
    }

    #[rocket::async_test]
    async fn append_revalidates_candidate() {
        let store = store().await;
        let result = store
            .append(&vote(Id::new(), ACTIVE_ID, 20), &Email::normalize("ada@x.org"))
            .await;
        assert!(matches!(
            result,
            Err(Error::Rejected(Rejection::CandidateMismatch))
        ));
        assert!(store.votes(ACTIVE_ID).await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn append_consumes_every_list() {
        let store = store().await;
        let email = Email::normalize("ada@x.org");
        for list in [EligibilityList::Current, EligibilityList::LegacyImport] {
            store.list(list).import(ACTIVE_ID, &[row("ada@x.org")]).await.unwrap();
        }

        store.append(&vote(Id::new(), ACTIVE_ID, 10), &email).await.unwrap();

        for list in [EligibilityList::Current, EligibilityList::LegacyImport] {
            let records = store.records(list, ACTIVE_ID).await;
            assert!(records.iter().all(|record| record.has_voted), "{list}");
        }
    }

    #[rocket::async_test]
    async fn import_upserts() {
        let store = store().await;
        let list = store.list(EligibilityList::Current);

        let counts = list
            .import(ACTIVE_ID, &[row("ada@x.org"), row("bob@x.org"), row("  ")])
            .await
            .unwrap();
        assert_eq!(
            counts,
            ImportCounts {
                inserted: 2,
                updated: 0,
                skipped: 1
            }
        );

        let mut deactivate = row(" ADA@x.org");
        deactivate.active = false;
        let counts = list.import(ACTIVE_ID, &[deactivate]).await.unwrap();
        assert_eq!(counts.updated, 1);
        assert!(!list
            .is_eligible(ACTIVE_ID, &Email::normalize("ada@x.org"))
            .await
            .unwrap());
        assert_eq!(store.records(EligibilityList::Current, ACTIVE_ID).await.len(), 2);
    }

    #[rocket::async_test]
    async fn registry_lookups() {
        let store = store().await;
        let voter = Voter::new(Id::new(), VoterCore::example());
        store.insert_voter(voter.clone()).await;

        assert!(store.is_voter_authorized(&voter.id).await.unwrap());
        assert!(matches!(
            store.is_voter_authorized(&Id::new()).await,
            Err(Error::Status(status, _)) if status == rocket::http::Status::NotFound
        ));

        store
            .refresh_status(UPCOMING_ID, ElectionStatus::Completed)
            .await
            .unwrap();
        let election = store.election(UPCOMING_ID).await.unwrap().unwrap();
        assert_eq!(election.status, ElectionStatus::Completed);
    }

    #[rocket::async_test]
    async fn mark_voted_is_idempotent() {
        let store = store().await;
        let voter = Voter::new(Id::new(), VoterCore::example());
        store.insert_voter(voter.clone()).await;
        store
            .list(EligibilityList::LegacyWhitelist)
            .import(ACTIVE_ID, &[row(&voter.email)])
            .await
            .unwrap();

        store.mark_voted(&voter.id, ACTIVE_ID).await.unwrap();
        store.mark_voted(&voter.id, ACTIVE_ID).await.unwrap();

        let records = store.records(EligibilityList::LegacyWhitelist, ACTIVE_ID).await;
        assert_eq!(records.len(), 1);
        assert!(records[0].has_voted);
    }
}
