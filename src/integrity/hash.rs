use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use mongodb::bson::Bson;
use rocket::request::FromParam;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::model::common::{CandidateId, ElectionId, VoterId};

pub const HASH_LEN: usize = 32;

/// Truncate a timestamp to the millisecond precision our storage keeps.
///
/// Hashes are computed over the truncated value so they can be recomputed
/// from a stored vote.
pub fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(3)
}

/// SHA-256 proof-of-cast over a vote's four public fields.
///
/// Anyone holding the fields can recompute it; the sealing key is not involved.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VoteHash([u8; HASH_LEN]);

impl VoteHash {
    pub fn compute(
        election_id: ElectionId,
        candidate_id: CandidateId,
        voter_id: &VoterId,
        cast_at: DateTime<Utc>,
    ) -> Self {
        let material = format!(
            "{election_id}:{candidate_id}:{voter_id}:{}",
            truncate_to_millis(cast_at).timestamp_millis()
        );
        let digest = Sha256::digest(material.as_bytes());
        let mut bytes = [0; HASH_LEN];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        HEXLOWER.encode(&self.0)
    }
}

impl Display for VoteHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Debug for VoteHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "VoteHash({self})")
    }
}

impl FromStr for VoteHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = HEXLOWER_PERMISSIVE
            .decode(s.as_bytes())
            .map_err(|e| format!("Invalid vote hash: {e}"))?;
        let bytes: [u8; HASH_LEN] = bytes
            .try_into()
            .map_err(|_| format!("Vote hash must be {HASH_LEN} bytes"))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for VoteHash {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VoteHash> for String {
    fn from(hash: VoteHash) -> Self {
        hash.to_hex()
    }
}

impl From<VoteHash> for Bson {
    fn from(hash: VoteHash) -> Self {
        Bson::String(hash.to_hex())
    }
}

impl<'a> FromParam<'a> for VoteHash {
    type Error = String;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        param.parse()
    }
}
