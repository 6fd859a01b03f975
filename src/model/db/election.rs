use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::common::{classify, ElectionId, ElectionStatus};

/// Core election data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionCore {
    /// Election title.
    pub title: String,
    /// Voting opens at this instant (inclusive).
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub start_time: DateTime<Utc>,
    /// Voting closes at this instant (inclusive).
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub end_time: DateTime<Utc>,
    /// Cached projection of the voting window. Advisory only: never gate on it.
    pub status: ElectionStatus,
}

impl ElectionCore {
    /// Create a new election. Fails iff the window ends before it starts.
    pub fn new(title: String, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Option<Self> {
        if start_time > end_time {
            return None;
        }
        Some(Self {
            title,
            start_time,
            end_time,
            status: classify(Utc::now(), start_time, end_time),
        })
    }

    /// The authoritative status at the given instant.
    pub fn status_at(&self, now: DateTime<Utc>) -> ElectionStatus {
        classify(now, self.start_time, self.end_time)
    }
}

/// An election from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    #[serde(rename = "_id")]
    pub id: ElectionId,
    #[serde(flatten)]
    pub election: ElectionCore,
}

impl Election {
    pub fn new(id: ElectionId, election: ElectionCore) -> Self {
        Self { id, election }
    }
}

impl Deref for Election {
    type Target = ElectionCore;

    fn deref(&self) -> &Self::Target {
        &self.election
    }
}

impl DerefMut for Election {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.election
    }
}
