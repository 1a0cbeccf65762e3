//! Import validation: issue taxonomy, rule evaluation and aggregation.
//!
//! All pure logic. Callers hand in a parsed batch and a resolved code-list
//! lookup; nothing here performs I/O.

pub mod aggregator;
pub mod evaluator;
pub mod rules;
