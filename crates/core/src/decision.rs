//! Accept / reject gate over an import summary.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::summary::ImportSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accept,
    AcceptWithWarnings,
    Reject,
}

impl Decision {
    /// Any error rejects the batch; otherwise warnings downgrade acceptance.
    pub fn evaluate(summary: &ImportSummary) -> Self {
        if !summary.errors.is_empty() {
            Self::Reject
        } else if !summary.warnings.is_empty() {
            Self::AcceptWithWarnings
        } else {
            Self::Accept
        }
    }

    /// Whether the caller may go on to write the batch.
    pub fn may_persist(&self) -> bool {
        !matches!(self, Self::Reject)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::AcceptWithWarnings => "accept_with_warnings",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
