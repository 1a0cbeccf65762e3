//! Code-list lookup capability consumed by the `unmapped_code` rules.
//!
//! The engine never owns code-list data. Callers resolve a snapshot once per
//! batch and pass it in as a [`LookupState`]; when no snapshot can be had the
//! state is [`LookupState::Unavailable`] and code checks are skipped.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The code lists consulted by the rule set, named as in the IATI standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CodeList {
    Currency,
    TransactionType,
    Sector,
    ResultType,
    ResultVocabulary,
    IndicatorMeasure,
    IndicatorVocabulary,
    DocumentCategory,
    FileFormat,
}

impl CodeList {
    pub const ALL: [CodeList; 9] = [
        Self::Currency,
        Self::TransactionType,
        Self::Sector,
        Self::ResultType,
        Self::ResultVocabulary,
        Self::IndicatorMeasure,
        Self::IndicatorVocabulary,
        Self::DocumentCategory,
        Self::FileFormat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Currency => "Currency",
            Self::TransactionType => "TransactionType",
            Self::Sector => "Sector",
            Self::ResultType => "ResultType",
            Self::ResultVocabulary => "ResultVocabulary",
            Self::IndicatorMeasure => "IndicatorMeasure",
            Self::IndicatorVocabulary => "IndicatorVocabulary",
            Self::DocumentCategory => "DocumentCategory",
            Self::FileFormat => "FileFormat",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str() == name)
    }
}

impl fmt::Display for CodeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// "Is this value known" over named code lists.
pub trait CodeListLookup: Send + Sync {
    /// Whether this lookup can answer for `code_list` at all.
    fn provides(&self, _code_list: CodeList) -> bool {
        true
    }

    fn is_known(&self, code_list: CodeList, value: &str) -> bool;
}

/// Outcome of checking one coded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Known,
    Unknown,
    /// The list could not be consulted; the value is neither accepted nor flagged.
    Skipped,
}

/// Lookup availability for one batch, resolved before validation starts.
#[derive(Clone)]
pub enum LookupState {
    Available(Arc<dyn CodeListLookup>),
    Unavailable { reason: String },
}

impl LookupState {
    pub fn available(lookup: impl CodeListLookup + 'static) -> Self {
        Self::Available(Arc::new(lookup))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Available when a snapshot was loaded, otherwise unavailable.
    pub fn from_snapshot(snapshot: Option<Arc<CodeListSnapshot>>) -> Self {
        match snapshot {
            Some(s) => {
                let lookup: Arc<dyn CodeListLookup> = s;
                Self::Available(lookup)
            }
            None => Self::unavailable("no code-list snapshot configured"),
        }
    }

    pub fn check(&self, code_list: CodeList, value: &str) -> LookupOutcome {
        match self {
            Self::Available(lookup) if lookup.provides(code_list) => {
                if lookup.is_known(code_list, value.trim()) {
                    LookupOutcome::Known
                } else {
                    LookupOutcome::Unknown
                }
            }
            _ => LookupOutcome::Skipped,
        }
    }

    /// Why `code_list` cannot be consulted, or `None` when it can.
    pub fn unavailable_reason(&self, code_list: CodeList) -> Option<String> {
        match self {
            Self::Available(lookup) if lookup.provides(code_list) => None,
            Self::Available(_) => Some(format!("code list '{code_list}' is not in the snapshot")),
            Self::Unavailable { reason } => Some(reason.clone()),
        }
    }
}

impl fmt::Debug for LookupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available(_) => f.write_str("LookupState::Available"),
            Self::Unavailable { reason } => f
                .debug_struct("LookupState::Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// In-memory copy of the code lists, matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct CodeListSnapshot {
    lists: HashMap<CodeList, HashSet<String>>,
}

fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}

impl CodeListSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a whole list (replacing any previous one).
    pub fn with_list<I, S>(mut self, code_list: CodeList, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.lists.insert(
            code_list,
            codes.into_iter().map(|c| normalize(c.as_ref())).collect(),
        );
        self
    }

    /// Parse a snapshot from `{"Currency": ["USD", ...], ...}`.
    ///
    /// Unknown list names are skipped with a warning; malformed JSON is an error.
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let raw: HashMap<String, Vec<String>> = serde_json::from_str(json)
            .map_err(|e| CoreError::CodeList(format!("invalid code-list JSON: {e}")))?;

        let mut snapshot = Self::new();
        for (name, codes) in raw {
            match CodeList::from_name(&name) {
                Some(list) => snapshot = snapshot.with_list(list, codes),
                None => tracing::warn!(code_list = %name, "Ignoring unknown code list"),
            }
        }
        Ok(snapshot)
    }

    pub fn list_count(&self) -> usize {
        self.lists.len()
    }

    pub fn code_count(&self) -> usize {
        self.lists.values().map(HashSet::len).sum()
    }
}

impl CodeListLookup for CodeListSnapshot {
    fn provides(&self, code_list: CodeList) -> bool {
        self.lists.contains_key(&code_list)
    }

    fn is_known(&self, code_list: CodeList, value: &str) -> bool {
        self.lists
            .get(&code_list)
            .is_some_and(|codes| codes.contains(&normalize(value)))
    }
}
