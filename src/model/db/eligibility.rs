use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use std::str::FromStr;

use rocket::form::{self, prelude::ErrorKind, FromFormField, ValueField};
use serde::{Deserialize, Serialize};

use crate::model::common::{ElectionId, Email};

/// The independently maintained eligibility lists.
///
/// Older deployments accumulated several lists; a voter is eligible if any
/// configured list says so. Which lists are consulted is configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityList {
    /// The list maintained by the current import tooling.
    Current,
    /// Rows loaded by the original bulk importer.
    LegacyImport,
    /// The hand-maintained per-election whitelist.
    LegacyWhitelist,
}

impl EligibilityList {
    pub const ALL: [EligibilityList; 3] = [Self::Current, Self::LegacyImport, Self::LegacyWhitelist];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::LegacyImport => "legacy_import",
            Self::LegacyWhitelist => "legacy_whitelist",
        }
    }
}

impl Display for EligibilityList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EligibilityList {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|list| list.as_str() == s)
            .ok_or_else(|| format!("Unknown eligibility list '{s}'"))
    }
}

#[rocket::async_trait]
impl<'r> FromFormField<'r> for EligibilityList {
    fn from_value(field: ValueField<'r>) -> form::Result<'r, Self> {
        field
            .value
            .parse()
            .map_err(|msg: String| ErrorKind::Validation(msg.into()).into())
    }
}

/// Compile-time marker for one eligibility list, fixing its collection.
pub trait ListKind: Send + Sync + Unpin + 'static {
    const LIST: EligibilityList;
    const COLLECTION: &'static str;
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CurrentList;

impl ListKind for CurrentList {
    const LIST: EligibilityList = EligibilityList::Current;
    const COLLECTION: &'static str = "eligibility";
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct LegacyImportList;

impl ListKind for LegacyImportList {
    const LIST: EligibilityList = EligibilityList::LegacyImport;
    const COLLECTION: &'static str = "eligible_voters";
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct LegacyWhitelistList;

impl ListKind for LegacyWhitelistList {
    const LIST: EligibilityList = EligibilityList::LegacyWhitelist;
    const COLLECTION: &'static str = "election_voters";
}

/// One row of an eligibility list: this email may vote in this election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct EligibilityRecord<L> {
    /// Foreign Key election ID.
    pub election_id: ElectionId,
    pub name: String,
    /// Normalised at write time so reads can use plain equality.
    pub email: Email,
    /// Inactive rows grant nothing.
    pub active: bool,
    #[serde(default)]
    pub has_registered: bool,
    /// Consumed inside the vote-cast transaction.
    #[serde(default)]
    pub has_voted: bool,
    #[serde(skip)]
    list: PhantomData<L>,
}

impl<L> EligibilityRecord<L> {
    pub fn new(election_id: ElectionId, name: String, email: Email, active: bool) -> Self {
        Self {
            election_id,
            name,
            email,
            active,
            has_registered: false,
            has_voted: false,
            list: PhantomData,
        }
    }

    /// Does this row grant eligibility for the given election and email?
    pub fn grants(&self, election_id: ElectionId, email: &Email) -> bool {
        self.active && self.election_id == election_id && &self.email == email
    }
}
