//! Types shared by the database, API, and pipeline layers.

mod email;
mod rejection;
mod window;

pub use email::Email;
pub use rejection::Rejection;
pub use window::{classify, ElectionStatus, WindowRejection};

use crate::model::mongodb::Id;

/// Voters are identified by database object IDs.
pub type VoterId = Id;
/// Our election IDs are integers.
pub type ElectionId = u32;
/// Our candidate IDs are integers, unique across all elections.
pub type CandidateId = u32;
