//! AIMS import validation and coverage engine.
//!
//! Pure logic over an already-parsed import batch:
//!
//! - [`validation`]: six issue rules, severity buckets and aggregation.
//! - [`coverage`]: element coverage against the [`checklist`] registry.
//! - [`summary`] and [`decision`]: the merged summary and the accept/reject gate.
//! - [`engine`]: the one-call entry point used by the API.
//!
//! No I/O happens here. Code lists arrive as a [`lookup::LookupState`]
//! resolved by the caller.

pub mod acceptance;
pub mod checklist;
pub mod coverage;
pub mod decision;
pub mod engine;
pub mod error;
pub mod import_log;
pub mod lookup;
pub mod records;
pub mod report;
pub mod summary;
pub mod transaction_type;
pub mod types;
pub mod validation;

pub use decision::Decision;
pub use engine::{summarize_with_created, validate_batch, ValidationContext, ValidationOutcome};
pub use error::CoreError;
pub use records::{ImportBatch, ImportRecord};
