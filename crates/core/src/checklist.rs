//! Canonical element checklists per results-framework level.
//!
//! These lists are the only source of coverage denominators. Totals are
//! derived from the list lengths, so the coverage calculator and anything
//! displaying a denominator (the checklist endpoint) cannot drift apart.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Element names
// ---------------------------------------------------------------------------

pub const EL_TITLE: &str = "title";
pub const EL_DESCRIPTION: &str = "description";
pub const EL_DOCUMENT_LINK: &str = "document-link";
pub const EL_REFERENCE: &str = "reference";
pub const EL_AGGREGATION_STATUS: &str = "aggregation-status";
pub const EL_MEASURE: &str = "measure";
pub const EL_ASCENDING: &str = "ascending";
pub const EL_VALUE: &str = "value";
pub const EL_YEAR: &str = "year";
pub const EL_ISO_DATE: &str = "iso-date";
pub const EL_COMMENT: &str = "comment";
pub const EL_LOCATION: &str = "location";
pub const EL_DIMENSION: &str = "dimension";
pub const EL_PERIOD_START: &str = "period-start";
pub const EL_PERIOD_END: &str = "period-end";
pub const EL_TARGET_VALUE: &str = "target-value";
pub const EL_TARGET_COMMENT: &str = "target-comment";
pub const EL_TARGET_LOCATION: &str = "target-location";
pub const EL_TARGET_DIMENSION: &str = "target-dimension";
pub const EL_TARGET_DOCUMENT_LINK: &str = "target-document-link";
pub const EL_ACTUAL_VALUE: &str = "actual-value";
pub const EL_ACTUAL_COMMENT: &str = "actual-comment";
pub const EL_ACTUAL_LOCATION: &str = "actual-location";
pub const EL_ACTUAL_DIMENSION: &str = "actual-dimension";
pub const EL_ACTUAL_DOCUMENT_LINK: &str = "actual-document-link";

// ---------------------------------------------------------------------------
// Levels
// ---------------------------------------------------------------------------

/// A level of the results framework that coverage is measured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityLevel {
    Result,
    Indicator,
    Baseline,
    Period,
}

impl EntityLevel {
    pub const ALL: [EntityLevel; 4] = [Self::Result, Self::Indicator, Self::Baseline, Self::Period];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Result => "result",
            Self::Indicator => "indicator",
            Self::Baseline => "baseline",
            Self::Period => "period",
        }
    }
}

impl fmt::Display for EntityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Checklists
// ---------------------------------------------------------------------------

/// One canonical element of a level's checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ElementSpec {
    pub name: &'static str,
    pub required: bool,
}

const fn optional(name: &'static str) -> ElementSpec {
    ElementSpec {
        name,
        required: false,
    }
}

const fn required(name: &'static str) -> ElementSpec {
    ElementSpec {
        name,
        required: true,
    }
}

pub const RESULT_ELEMENTS: &[ElementSpec] = &[
    required(EL_TITLE),
    optional(EL_DESCRIPTION),
    optional(EL_DOCUMENT_LINK),
    optional(EL_REFERENCE),
    optional(EL_AGGREGATION_STATUS),
];

pub const INDICATOR_ELEMENTS: &[ElementSpec] = &[
    required(EL_TITLE),
    optional(EL_DESCRIPTION),
    optional(EL_MEASURE),
    optional(EL_ASCENDING),
    optional(EL_AGGREGATION_STATUS),
    optional(EL_REFERENCE),
    optional(EL_DOCUMENT_LINK),
];

pub const BASELINE_ELEMENTS: &[ElementSpec] = &[
    optional(EL_VALUE),
    optional(EL_YEAR),
    optional(EL_ISO_DATE),
    optional(EL_COMMENT),
    optional(EL_LOCATION),
    optional(EL_DIMENSION),
    optional(EL_DOCUMENT_LINK),
];

/// Period start/end are counted once per period; the remaining ten are the
/// five value elements for each of target and actual.
pub const PERIOD_ELEMENTS: &[ElementSpec] = &[
    optional(EL_PERIOD_START),
    optional(EL_PERIOD_END),
    optional(EL_TARGET_VALUE),
    optional(EL_TARGET_COMMENT),
    optional(EL_TARGET_LOCATION),
    optional(EL_TARGET_DIMENSION),
    optional(EL_TARGET_DOCUMENT_LINK),
    optional(EL_ACTUAL_VALUE),
    optional(EL_ACTUAL_COMMENT),
    optional(EL_ACTUAL_LOCATION),
    optional(EL_ACTUAL_DIMENSION),
    optional(EL_ACTUAL_DOCUMENT_LINK),
];

/// Canonical elements for a level.
pub fn elements_for(level: EntityLevel) -> &'static [ElementSpec] {
    match level {
        EntityLevel::Result => RESULT_ELEMENTS,
        EntityLevel::Indicator => INDICATOR_ELEMENTS,
        EntityLevel::Baseline => BASELINE_ELEMENTS,
        EntityLevel::Period => PERIOD_ELEMENTS,
    }
}

/// Coverage denominator for a level.
pub fn total_for(level: EntityLevel) -> u32 {
    elements_for(level).len() as u32
}

/// Whether `name` is one of the level's canonical elements.
pub fn is_canonical(level: EntityLevel, name: &str) -> bool {
    elements_for(level).iter().any(|e| e.name == name)
}

/// Serializable view of one level's checklist.
#[derive(Debug, Clone, Serialize)]
pub struct LevelChecklist {
    pub level: EntityLevel,
    pub total: u32,
    pub elements: &'static [ElementSpec],
}

/// All checklists in level order.
pub fn registry() -> Vec<LevelChecklist> {
    EntityLevel::ALL
        .iter()
        .map(|&level| LevelChecklist {
            level,
            total: total_for(level),
            elements: elements_for(level),
        })
        .collect()
}
