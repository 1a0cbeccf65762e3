//! Batch validation entry points.
//!
//! One pass per batch: evaluate every rule over every record, aggregate,
//! walk the accepted tree for coverage and created counts, then gate.

use std::collections::BTreeSet;

use rayon::prelude::*;

use crate::acceptance::AcceptedBatch;
use crate::coverage::CoverageSets;
use crate::decision::Decision;
use crate::error::CoreError;
use crate::import_log::ImportLog;
use crate::lookup::{CodeList, LookupState};
use crate::records::ImportBatch;
use crate::report::ImportReport;
use crate::summary::{CreatedCounts, ImportSummary};
use crate::types::RecordIndex;
use crate::validation::aggregator::aggregate;
use crate::validation::evaluator::{code_lists_used, evaluate_record, RuleContext};
use crate::validation::rules::{IssueType, RawFinding, ValidationSeverity};

/// Batches with at least this many records evaluate rules in parallel.
pub const PARALLEL_THRESHOLD: usize = 256;

/// How rule evaluation is scheduled across records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Parallel at or above [`PARALLEL_THRESHOLD`] records.
    #[default]
    Auto,
    Sequential,
    Parallel,
}

/// Inputs resolved by the caller once per batch.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    pub lookup: LookupState,
    /// Activity identifiers that already exist outside the batch.
    pub known_activity_ids: BTreeSet<String>,
}

impl ValidationContext {
    pub fn new(lookup: LookupState) -> Self {
        Self {
            lookup,
            known_activity_ids: BTreeSet::new(),
        }
    }

    pub fn with_known_activities<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_activity_ids.extend(ids.into_iter().map(Into::into));
        self
    }
}

/// Everything produced by one validation run.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub summary: ImportSummary,
    pub decision: Decision,
    pub report: ImportReport,
    pub log: ImportLog,
}

/// Validate a batch, counting created entities from the acceptance walk.
pub fn validate_batch(batch: &ImportBatch, ctx: &ValidationContext) -> ValidationOutcome {
    validate_batch_with(batch, ctx, ExecutionMode::Auto)
}

pub fn validate_batch_with(
    batch: &ImportBatch,
    ctx: &ValidationContext,
    mode: ExecutionMode,
) -> ValidationOutcome {
    let accepted = accepted_entities(batch, ctx);
    let created = CreatedCounts::from_accepted(&accepted);
    run(batch, ctx, mode, &accepted, created)
}

/// Validate a batch using the counts the caller actually persisted.
///
/// Fails when any supplied counter exceeds what the batch could have created.
pub fn summarize_with_created(
    batch: &ImportBatch,
    ctx: &ValidationContext,
    created: CreatedCounts,
) -> Result<ValidationOutcome, CoreError> {
    let accepted = accepted_entities(batch, ctx);
    created.reconcile(&CreatedCounts::from_accepted(&accepted))?;
    Ok(run(batch, ctx, ExecutionMode::Auto, &accepted, created))
}

fn accepted_entities<'a>(batch: &'a ImportBatch, ctx: &ValidationContext) -> AcceptedBatch<'a> {
    let rules = RuleContext::new(batch, &ctx.lookup, &ctx.known_activity_ids);
    AcceptedBatch::walk(batch, &rules)
}

fn run(
    batch: &ImportBatch,
    ctx: &ValidationContext,
    mode: ExecutionMode,
    accepted: &AcceptedBatch<'_>,
    created: CreatedCounts,
) -> ValidationOutcome {
    let findings = collect_findings(batch, ctx, mode);
    let failed = failed_records(&findings);
    tracing::debug!(findings = findings.len(), failed_records = failed.len(), "Rules evaluated");

    let buckets = aggregate(findings);
    let coverage = CoverageSets::collect(accepted);
    let summary = ImportSummary::build(created, buckets, coverage);
    let decision = Decision::evaluate(&summary);
    let report = ImportReport::from(&summary);
    let log = ImportLog::new(batch, &summary, decision, &failed);

    tracing::info!(
        import_id = %log.import_id,
        records = batch.records.len(),
        errors = summary.error_count(),
        warnings = summary.warning_count(),
        total_created = summary.total_created,
        overall_coverage = report.overall_coverage,
        decision = %decision,
        "Validated import batch"
    );

    ValidationOutcome {
        summary,
        decision,
        report,
        log,
    }
}

/// All findings for a batch, in record order, with batch-level findings last.
pub fn collect_findings(
    batch: &ImportBatch,
    ctx: &ValidationContext,
    mode: ExecutionMode,
) -> Vec<RawFinding> {
    let rules = RuleContext::new(batch, &ctx.lookup, &ctx.known_activity_ids);
    let parallel = match mode {
        ExecutionMode::Auto => batch.records.len() >= PARALLEL_THRESHOLD,
        ExecutionMode::Sequential => false,
        ExecutionMode::Parallel => true,
    };

    let mut findings: Vec<RawFinding> = if parallel {
        tracing::debug!(records = batch.records.len(), "Evaluating rules in parallel");
        let mut per_record: Vec<(RecordIndex, Vec<RawFinding>)> = batch
            .records
            .par_iter()
            .enumerate()
            .map(|(idx, record)| (idx, evaluate_record(idx, record, &rules)))
            .collect();
        per_record.sort_by_key(|(idx, _)| *idx);
        per_record.into_iter().flat_map(|(_, f)| f).collect()
    } else {
        batch
            .records
            .iter()
            .enumerate()
            .flat_map(|(idx, record)| evaluate_record(idx, record, &rules))
            .collect()
    };

    findings.extend(degraded_lookup_findings(batch, &ctx.lookup));
    findings
}

/// One batch-level `unmapped_code` warning per needed code list that cannot
/// be consulted.
fn degraded_lookup_findings(batch: &ImportBatch, lookup: &LookupState) -> Vec<RawFinding> {
    let needed: BTreeSet<CodeList> = batch
        .records
        .iter()
        .enumerate()
        .flat_map(|(idx, record)| code_lists_used(idx, record))
        .collect();

    needed
        .into_iter()
        .filter_map(|list| {
            let reason = lookup.unavailable_reason(list)?;
            tracing::warn!(code_list = %list, %reason, "Code list unavailable, skipping code checks");
            Some(RawFinding::batch_level(
                IssueType::UnmappedCode,
                format!("{list} codes were not checked: {reason}"),
            ))
        })
        .collect()
}

fn failed_records(findings: &[RawFinding]) -> BTreeSet<RecordIndex> {
    findings
        .iter()
        .filter(|f| f.severity() == ValidationSeverity::Error)
        .filter_map(|f| f.record_index)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::CodeListSnapshot;
    use crate::records::{
        ActivityRecord, FieldValue, ImportRecord, IndicatorRecord, OrganisationRef, ResultRecord,
        TransactionRecord,
    };
    use assert_matches::assert_matches;

    fn transaction(currency: Option<&str>) -> TransactionRecord {
        TransactionRecord {
            transaction_type: Some("3".into()),
            value: Some(FieldValue::Number(250.0)),
            currency: currency.map(str::to_string),
            transaction_date: Some("2024-05-01".into()),
            receiver_org: Some(OrganisationRef {
                reference: None,
                name: Some("Water Trust".into()),
            }),
            ..Default::default()
        }
    }

    fn batch(currency: Option<&str>) -> ImportBatch {
        ImportBatch {
            file_name: Some("activities.xml".into()),
            records: vec![ImportRecord::Activity(ActivityRecord {
                iati_identifier: Some("XM-1".into()),
                title: Some("Water".into()),
                transactions: vec![transaction(currency)],
                results: vec![ResultRecord {
                    title: Some("Wells".into()),
                    indicators: vec![IndicatorRecord {
                        title: Some("Wells dug".into()),
                        ..Default::default()
                    }],
                    ..Default::default()
                }],
                ..Default::default()
            })],
        }
    }

    fn ctx() -> ValidationContext {
        ValidationContext::new(LookupState::available(
            CodeListSnapshot::new()
                .with_list(CodeList::Currency, ["USD"])
                .with_list(CodeList::TransactionType, ["3"]),
        ))
    }

    #[test]
    fn clean_batch_is_accepted() {
        let outcome = validate_batch(&batch(Some("USD")), &ctx());
        assert_eq!(outcome.decision, Decision::Accept);
        assert_eq!(outcome.summary.created.results, 1);
        assert_eq!(outcome.summary.created.indicators, 1);
        assert_eq!(outcome.summary.total_created, 2);
        assert_eq!(outcome.log.failed_rows, 0);
        assert_eq!(outcome.log.file_name, "activities.xml");
    }

    #[test]
    fn missing_currency_rejects_and_fails_the_row() {
        let outcome = validate_batch(&batch(None), &ctx());
        assert_eq!(outcome.decision, Decision::Reject);
        assert_eq!(outcome.summary.errors.len(), 1);
        assert_eq!(outcome.summary.errors[0].issue_type(), IssueType::MissingCurrency);
        assert_eq!(outcome.log.failed_rows, 1);
        assert_eq!(outcome.log.successful_rows, 0);
    }

    #[test]
    fn degraded_lookup_warns_once_per_list() {
        let mut b = batch(Some("USD"));
        b.records.push(b.records[0].clone());
        let ctx = ValidationContext::new(LookupState::unavailable("code-list service down"))
            .with_known_activities(["XM-1"]);
        let outcome = validate_batch(&b, &ctx);

        assert_eq!(outcome.decision, Decision::AcceptWithWarnings);
        assert_eq!(outcome.summary.warnings.len(), 1);
        let details = outcome.summary.warnings[0].details();
        assert_eq!(details.len(), 2);
        assert!(details[0].message.starts_with("Currency codes were not checked"));
        assert!(details[1].message.starts_with("TransactionType codes were not checked"));
    }

    #[test]
    fn parallel_matches_sequential() {
        let mut b = batch(None);
        for i in 0..40 {
            let mut record = b.records[0].clone();
            if let ImportRecord::Activity(a) = &mut record {
                a.iati_identifier = Some(format!("XM-{i}"));
                a.transactions[0].currency = (i % 3 == 0).then(|| "USD".to_string());
            }
            b.records.push(record);
        }
        let seq = collect_findings(&b, &ctx(), ExecutionMode::Sequential);
        let par = collect_findings(&b, &ctx(), ExecutionMode::Parallel);
        assert_eq!(seq, par);
    }

    #[test]
    fn supplied_counts_are_reconciled() {
        let b = batch(Some("USD"));
        let ok = summarize_with_created(
            &b,
            &ctx(),
            CreatedCounts {
                results: 1,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(ok.summary.total_created, 1);
        assert_eq!(ok.report.total_created, 1);

        let err = summarize_with_created(
            &b,
            &ctx(),
            CreatedCounts {
                periods: 1,
                ..Default::default()
            },
        );
        assert_matches!(err, Err(CoreError::Validation(_)));
    }
}
