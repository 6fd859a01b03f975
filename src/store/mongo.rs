//! The production backend.
//!
//! Double votes are refused by the unique (voter_id, election_id) index on
//! the votes collection; see [`ensure_indexes_exist`](crate::model::mongodb::ensure_indexes_exist).

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use mongodb::{
    bson::{doc, Document},
    error::Error as DbError,
    options::UpdateOptions,
    Client, ClientSession, Database,
};
use rocket::{futures::TryStreamExt, tokio::time::sleep};

use super::{Eligibility, EligibilitySource, Registry, VoteLedger};
use crate::error::{Error, Result};
use crate::integrity::VoteHash;
use crate::model::{
    api::eligibility::{EligibilityRow, ImportCounts},
    common::{CandidateId, ElectionId, ElectionStatus, Email, Rejection, VoterId},
    db::{
        candidate::Candidate,
        election::Election,
        eligibility::{
            CurrentList, EligibilityList, EligibilityRecord, LegacyImportList,
            LegacyWhitelistList, ListKind,
        },
        vote::Vote,
        voter::Voter,
    },
    mongodb::{
        is_duplicate_key_error, is_transient_transaction_error, is_unknown_commit_result, Coll,
    },
};

/// How many times a vote transaction is attempted before giving up.
const MAX_TRANSACTION_ATTEMPTS: u32 = 8;
/// How many times a commit with an unknown outcome is retried.
const MAX_COMMIT_ATTEMPTS: u32 = 5;
/// Grows linearly with each transaction attempt.
const RETRY_BACKOFF: Duration = Duration::from_millis(20);

#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    pub fn new(client: Client, db: Database) -> Self {
        Self { client, db }
    }

    pub fn list<L: ListKind>(&self) -> MongoList<L> {
        MongoList {
            db: self.db.clone(),
            list: PhantomData,
        }
    }

    /// The given eligibility lists, in order.
    pub fn eligibility(&self, lists: &[EligibilityList]) -> Eligibility {
        let sources = lists
            .iter()
            .map(|list| -> Arc<dyn EligibilitySource> {
                match list {
                    EligibilityList::Current => Arc::new(self.list::<CurrentList>()),
                    EligibilityList::LegacyImport => Arc::new(self.list::<LegacyImportList>()),
                    EligibilityList::LegacyWhitelist => {
                        Arc::new(self.list::<LegacyWhitelistList>())
                    }
                }
            })
            .collect();
        Eligibility::new(sources)
    }

    /// Run the vote transaction once. `Ok(false)` means the candidate check failed.
    async fn append_once(
        &self,
        session: &mut ClientSession,
        vote: &Vote,
        voter_email: &Email,
    ) -> std::result::Result<bool, DbError> {
        // Re-validate the candidate inside the transaction.
        let candidate_filter = doc! {
            "_id": vote.candidate_id,
            "election_id": vote.election_id,
        };
        let candidate = Coll::<Candidate>::from_db(&self.db)
            .find_one_with_session(candidate_filter, None, session)
            .await?;
        if candidate.is_none() {
            return Ok(false);
        }

        // The unique index turns a lost race into a duplicate key error here.
        Coll::<Vote>::from_db(&self.db)
            .insert_one_with_session(vote, None, session)
            .await?;

        // Consume the eligibility records in every list, configured or not.
        let filter = doc! {
            "election_id": vote.election_id,
            "email": voter_email,
        };
        consume::<CurrentList>(&self.db, filter.clone(), session).await?;
        consume::<LegacyImportList>(&self.db, filter.clone(), session).await?;
        consume::<LegacyWhitelistList>(&self.db, filter, session).await?;

        Ok(true)
    }
}

fn voted_update() -> Document {
    doc! { "$set": { "has_voted": true } }
}

async fn consume<L: ListKind>(
    db: &Database,
    filter: Document,
    session: &mut ClientSession,
) -> std::result::Result<(), DbError> {
    Coll::<EligibilityRecord<L>>::from_db(db)
        .update_many_with_session(filter, voted_update(), None, session)
        .await?;
    Ok(())
}

/// Commit, retrying while the server cannot tell us whether the commit happened.
async fn commit(session: &mut ClientSession) -> std::result::Result<(), DbError> {
    let mut attempt = 1;
    loop {
        match session.commit_transaction().await {
            Err(e) if is_unknown_commit_result(&e) && attempt < MAX_COMMIT_ATTEMPTS => {
                warn!("Vote commit outcome unknown, retrying ({attempt}): {e}");
                attempt += 1;
            }
            result => return result,
        }
    }
}

#[rocket::async_trait]
impl Registry for MongoStore {
    async fn voter(&self, voter_id: &VoterId) -> Result<Option<Voter>> {
        Ok(Coll::<Voter>::from_db(&self.db)
            .find_one(voter_id.as_doc(), None)
            .await?)
    }

    async fn election(&self, election_id: ElectionId) -> Result<Option<Election>> {
        Ok(Coll::<Election>::from_db(&self.db)
            .find_one(doc! { "_id": election_id }, None)
            .await?)
    }

    async fn candidate(&self, candidate_id: CandidateId) -> Result<Option<Candidate>> {
        Ok(Coll::<Candidate>::from_db(&self.db)
            .find_one(doc! { "_id": candidate_id }, None)
            .await?)
    }

    async fn refresh_status(&self, election_id: ElectionId, status: ElectionStatus) -> Result<()> {
        let update = doc! { "$set": { "status": status } };
        let result = Coll::<Election>::from_db(&self.db)
            .update_one(doc! { "_id": election_id }, update, None)
            .await?;
        if result.matched_count == 0 {
            return Err(Error::not_found(format!("Election {election_id}")));
        }
        Ok(())
    }

    async fn mark_voted(&self, voter_id: &VoterId, election_id: ElectionId) -> Result<()> {
        let voter = self
            .voter(voter_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Voter {voter_id}")))?;
        self.eligibility(&EligibilityList::ALL)
            .mark_voted(election_id, &voter.email)
            .await
    }
}

#[rocket::async_trait]
impl VoteLedger for MongoStore {
    async fn has_voted(&self, voter_id: &VoterId, election_id: ElectionId) -> Result<bool> {
        let filter = doc! {
            "voter_id": *voter_id,
            "election_id": election_id,
        };
        let count = Coll::<Vote>::from_db(&self.db)
            .count_documents(filter, None)
            .await?;
        Ok(count > 0)
    }

    async fn append(&self, vote: &Vote, voter_email: &Email) -> Result<()> {
        let mut session = self.client.start_session(None).await?;
        let mut attempt = 1;
        loop {
            session.start_transaction(None).await?;
            let result = match self.append_once(&mut session, vote, voter_email).await {
                Ok(true) => commit(&mut session).await,
                Ok(false) => {
                    session.abort_transaction().await?;
                    return Err(Rejection::CandidateMismatch.into());
                }
                Err(e) => {
                    // The server may already have aborted it.
                    if let Err(abort_err) = session.abort_transaction().await {
                        debug!("Abort after failed vote transaction: {abort_err}");
                    }
                    Err(e)
                }
            };

            match result {
                Ok(()) => return Ok(()),
                Err(e) if is_duplicate_key_error(&e) => return Err(Error::StorageConflict),
                Err(e) if is_transient_transaction_error(&e) && attempt < MAX_TRANSACTION_ATTEMPTS => {
                    warn!("Transient vote transaction failure, retrying ({attempt}): {e}");
                    sleep(RETRY_BACKOFF * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn votes(&self, election_id: ElectionId) -> Result<Vec<Vote>> {
        let votes: Vec<Vote> = Coll::<Vote>::from_db(&self.db)
            .find(doc! { "election_id": election_id }, None)
            .await?
            .try_collect()
            .await?;
        Ok(votes)
    }

    async fn find_by_hash(&self, vote_hash: &VoteHash) -> Result<Option<Vote>> {
        Ok(Coll::<Vote>::from_db(&self.db)
            .find_one(doc! { "vote_hash": *vote_hash }, None)
            .await?)
    }
}

/// One eligibility list, stored in its own collection.
pub struct MongoList<L> {
    db: Database,
    list: PhantomData<L>,
}

#[rocket::async_trait]
impl<L: ListKind> EligibilitySource for MongoList<L> {
    fn list(&self) -> EligibilityList {
        L::LIST
    }

    async fn is_eligible(&self, election_id: ElectionId, email: &Email) -> Result<bool> {
        let filter = doc! {
            "election_id": election_id,
            "email": email,
            "active": true,
        };
        let record = Coll::<EligibilityRecord<L>>::from_db(&self.db)
            .find_one(filter, None)
            .await?;
        Ok(record.is_some())
    }

    async fn import(&self, election_id: ElectionId, rows: &[EligibilityRow]) -> Result<ImportCounts> {
        let records = Coll::<EligibilityRecord<L>>::from_db(&self.db);
        let upsert = UpdateOptions::builder().upsert(true).build();
        let mut counts = ImportCounts::default();

        for row in rows {
            if row.email.is_empty() {
                counts.skipped += 1;
                continue;
            }
            let filter = doc! {
                "election_id": election_id,
                "email": &row.email,
            };
            let update = doc! {
                "$set": {
                    "name": row.name.as_str(),
                    "active": row.active,
                },
                "$setOnInsert": {
                    "has_registered": false,
                    "has_voted": false,
                },
            };
            let result = records.update_one(filter, update, upsert.clone()).await?;
            if result.upserted_id.is_some() {
                counts.inserted += 1;
            } else {
                counts.updated += 1;
            }
        }

        debug!(
            "Imported {} rows into the {} list for election {election_id}",
            rows.len(),
            L::LIST
        );
        Ok(counts)
    }

    async fn mark_voted(&self, election_id: ElectionId, email: &Email) -> Result<()> {
        let filter = doc! {
            "election_id": election_id,
            "email": email,
        };
        Coll::<EligibilityRecord<L>>::from_db(&self.db)
            .update_many(filter, voted_update(), None)
            .await?;
        Ok(())
    }
}
