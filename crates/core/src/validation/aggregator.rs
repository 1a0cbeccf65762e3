//! Groups raw findings into severity buckets of per-type issues.

use std::collections::BTreeMap;

use serde::Serialize;

use super::rules::{IssueDetail, IssueType, RawFinding, ValidationIssue, ValidationSeverity};

/// Aggregated issues, split by severity.
///
/// Each bucket holds at most one [`ValidationIssue`] per [`IssueType`], in
/// [`IssueType::ALL`] order, and never an issue with zero details.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IssueBuckets {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl IssueBuckets {
    pub fn error_count(&self) -> u32 {
        self.errors.iter().map(ValidationIssue::count).sum()
    }

    pub fn warning_count(&self) -> u32 {
        self.warnings.iter().map(ValidationIssue::count).sum()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Every issue, errors first.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.errors.iter().chain(self.warnings.iter())
    }

    /// Detail count for one type, zero when it never fired.
    pub fn count_of(&self, issue_type: IssueType) -> u32 {
        self.iter()
            .find(|i| i.issue_type() == issue_type)
            .map_or(0, ValidationIssue::count)
    }
}

/// Aggregate findings into buckets.
///
/// Details keep record order: findings are stably sorted by originating
/// record, with batch-level findings after all record findings. Within a
/// record the evaluator's order is preserved.
pub fn aggregate(mut findings: Vec<RawFinding>) -> IssueBuckets {
    findings.sort_by_key(|f| f.record_index.unwrap_or(usize::MAX));

    let mut grouped: BTreeMap<IssueType, Vec<IssueDetail>> = BTreeMap::new();
    for finding in findings {
        grouped
            .entry(finding.issue_type)
            .or_default()
            .push(finding.into_detail());
    }

    let mut buckets = IssueBuckets::default();
    for issue_type in IssueType::ALL {
        let Some(details) = grouped.remove(&issue_type) else {
            continue;
        };
        let issue = ValidationIssue::from_details(issue_type, details);
        match issue_type.severity() {
            ValidationSeverity::Error => buckets.errors.push(issue),
            ValidationSeverity::Warning => buckets.warnings.push(issue),
        }
    }
    buckets
}
