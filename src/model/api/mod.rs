//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - IDs are serialised as hex strings.
//! - Datetimes are serialised as RFC 3339 strings.

pub mod admin;
pub mod auth;
pub mod id;
pub mod pagination;
pub mod question;
pub mod report;
pub mod respondent;
pub mod response_sheet;
pub mod submission;
