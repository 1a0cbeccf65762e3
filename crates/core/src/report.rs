//! Flattened import report in the shape the import UI renders.

use serde::Serialize;

use crate::coverage::CoverageSet;
use crate::summary::ImportSummary;
use crate::validation::rules::{IssueDetail, ValidationIssue};

/// One line of the report: a single issue detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportMessage {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
}

impl ReportMessage {
    fn from_detail(detail: &IssueDetail) -> Self {
        let context = match (&detail.activity_id, detail.transaction_index) {
            (Some(activity), Some(tx)) => Some(format!("Activity {activity}, transaction {}", tx + 1)),
            (Some(activity), None) => Some(format!("Activity {activity}")),
            (None, Some(tx)) => Some(format!("Transaction {}", tx + 1)),
            (None, None) => None,
        };
        Self {
            message: detail.message.clone(),
            context,
            element: detail.field.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub total_created: u32,
    pub errors: Vec<ReportMessage>,
    pub warnings: Vec<ReportMessage>,
    pub result_coverage: u8,
    pub indicator_coverage: u8,
    pub baseline_coverage: u8,
    pub period_coverage: u8,
    pub overall_coverage: u8,
    pub result_elements_found: Vec<&'static str>,
    pub indicator_elements_found: Vec<&'static str>,
    pub baseline_elements_found: Vec<&'static str>,
    pub period_elements_found: Vec<&'static str>,
}

fn messages(issues: &[ValidationIssue]) -> Vec<ReportMessage> {
    issues
        .iter()
        .flat_map(|issue| issue.details().iter().map(ReportMessage::from_detail))
        .collect()
}

impl From<&ImportSummary> for ImportReport {
    fn from(summary: &ImportSummary) -> Self {
        let coverage = summary.coverage_report();
        let found = |set: &CoverageSet| -> Vec<&'static str> { set.iter().copied().collect() };
        Self {
            total_created: summary.total_created,
            errors: messages(&summary.errors),
            warnings: messages(&summary.warnings),
            result_coverage: coverage.result,
            indicator_coverage: coverage.indicator,
            baseline_coverage: coverage.baseline,
            period_coverage: coverage.period,
            overall_coverage: coverage.overall,
            result_elements_found: found(&summary.coverage.result),
            indicator_elements_found: found(&summary.coverage.indicator),
            baseline_elements_found: found(&summary.coverage.baseline),
            period_elements_found: found(&summary.coverage.period),
        }
    }
}
