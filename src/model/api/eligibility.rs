use serde::{Deserialize, Serialize};

use crate::model::{common::Email, db::eligibility::EligibilityList};

/// One row of an eligibility import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityRow {
    pub name: String,
    /// Normalised on deserialisation.
    pub email: Email,
    #[serde(default = "active_by_default")]
    pub active: bool,
}

fn active_by_default() -> bool {
    true
}

/// What an import did to one list.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImportCounts {
    pub inserted: usize,
    pub updated: usize,
    /// Rows with a blank email.
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub list: EligibilityList,
    pub received: usize,
    #[serde(flatten)]
    pub counts: ImportCounts,
}
