//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in an DB-friendly way, e.g.:
//!
//! - IDs and datetimes are serialised in MongoDB's own format.
//! - Emails are stored normalised.

pub mod candidate;
pub mod election;
pub mod eligibility;
pub mod vote;
pub mod voter;
