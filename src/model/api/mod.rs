//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - IDs are serialised as hex strings.
//! - Datetimes are serialised as millisecond timestamps.

pub mod audit;
pub mod auth;
pub mod cast;
pub mod eligibility;
pub mod face;
pub mod receipt;
