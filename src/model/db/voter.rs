use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::common::{Email, VoterId};

/// Core voter data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterCore {
    /// Display name.
    pub name: String,
    /// Normalised email, the key used by every eligibility list.
    pub email: Email,
    /// Set by an administrator (or the auto-authorization policy at registration).
    pub authorized: bool,
    /// Reference to the face template captured at registration, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_template_ref: Option<String>,
}

/// A voter without an ID.
pub type NewVoter = VoterCore;

/// A voter from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: VoterId,
    #[serde(flatten)]
    pub voter: VoterCore,
}

impl Voter {
    pub fn new(id: VoterId, voter: VoterCore) -> Self {
        Self { id, voter }
    }
}

impl Deref for Voter {
    type Target = VoterCore;

    fn deref(&self) -> &Self::Target {
        &self.voter
    }
}

impl DerefMut for Voter {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.voter
    }
}
