use std::ops::Deref;

use log::debug;
use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};

use crate::model::db::{
    candidate::Candidate,
    election::Election,
    eligibility::{
        CurrentList, EligibilityRecord, ListKind, LegacyImportList, LegacyWhitelistList,
    },
    vote::Vote,
    voter::Voter,
};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl MongoCollection for Voter {
    const NAME: &'static str = "voters";
}

impl MongoCollection for Election {
    const NAME: &'static str = "elections";
}

impl MongoCollection for Candidate {
    const NAME: &'static str = "candidates";
}

impl MongoCollection for Vote {
    const NAME: &'static str = "votes";
}

// Each eligibility list lives in its own collection.
impl<L: ListKind> MongoCollection for EligibilityRecord<L> {
    const NAME: &'static str = L::COLLECTION;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // Votes: the (voter, election) index is the authoritative double-vote guard.
    let one_vote_per_election = IndexModel::builder()
        .keys(doc! {"voter_id": 1, "election_id": 1})
        .options(unique.clone())
        .build();
    let by_hash = IndexModel::builder()
        .keys(doc! {"vote_hash": 1})
        .options(unique.clone())
        .build();
    Coll::<Vote>::from_db(db)
        .create_indexes([one_vote_per_election, by_hash], None)
        .await?;

    // Voters.
    let voter_index = IndexModel::builder()
        .keys(doc! {"email": 1})
        .options(unique.clone())
        .build();
    Coll::<Voter>::from_db(db)
        .create_index(voter_index, None)
        .await?;

    // Candidates are always looked up together with their election.
    let candidate_index = IndexModel::builder()
        .keys(doc! {"_id": 1, "election_id": 1})
        .build();
    Coll::<Candidate>::from_db(db)
        .create_index(candidate_index, None)
        .await?;

    // Eligibility lists.
    ensure_eligibility_index::<CurrentList>(db, &unique).await?;
    ensure_eligibility_index::<LegacyImportList>(db, &unique).await?;
    ensure_eligibility_index::<LegacyWhitelistList>(db, &unique).await?;

    Ok(())
}

async fn ensure_eligibility_index<L: ListKind>(
    db: &Database,
    unique: &IndexOptions,
) -> Result<(), DbError> {
    let index = IndexModel::builder()
        .keys(doc! {"election_id": 1, "email": 1})
        .options(unique.clone())
        .build();
    Coll::<EligibilityRecord<L>>::from_db(db)
        .create_index(index, None)
        .await?;
    Ok(())
}
