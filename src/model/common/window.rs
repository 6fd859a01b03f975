use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use mongodb::bson::Bson;
use serde::{Deserialize, Serialize};

/// Where an election currently sits relative to its voting window.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElectionStatus {
    /// Voting has not opened yet.
    Upcoming,
    /// Voting is open.
    Active,
    /// Voting has closed.
    Completed,
}

impl Display for ElectionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Upcoming => "upcoming",
            Self::Active => "active",
            Self::Completed => "completed",
        };
        write!(f, "{name}")
    }
}

impl From<ElectionStatus> for Bson {
    fn from(status: ElectionStatus) -> Self {
        Bson::String(status.to_string())
    }
}

/// Classify `now` against the voting window `[start, end]`.
///
/// Both ends of the window are inclusive. This is the only authority on
/// whether an election is open; any stored status is just a cached copy.
pub fn classify(now: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> ElectionStatus {
    if now < start {
        ElectionStatus::Upcoming
    } else if now <= end {
        ElectionStatus::Active
    } else {
        ElectionStatus::Completed
    }
}

/// Why an election refused a vote on time grounds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowRejection {
    NotStarted,
    Ended,
}

impl Display for WindowRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "Voting for this election has not started yet"),
            Self::Ended => write!(f, "Voting for this election has already ended"),
        }
    }
}

impl WindowRejection {
    /// The rejection matching a non-active status, if any.
    pub fn for_status(status: ElectionStatus) -> Option<Self> {
        match status {
            ElectionStatus::Upcoming => Some(Self::NotStarted),
            ElectionStatus::Active => None,
            ElectionStatus::Completed => Some(Self::Ended),
        }
    }
}
