//! Property tests for the engine's batch-independent invariants.

use aims_core::coverage::CoverageReport;
use aims_core::engine::{collect_findings, validate_batch_with, ExecutionMode};
use aims_core::lookup::{CodeList, CodeListSnapshot, LookupState};
use aims_core::records::{
    ActivityRecord, BaselineRecord, Dimension, DocumentLink, FieldValue, ImportBatch, ImportRecord,
    IndicatorRecord, Location, OrganisationRef, PeriodRecord, PeriodValueRecord, ResultRecord,
    ResultsRecord, TransactionRecord,
};
use aims_core::validation::rules::ValidationSeverity;
use aims_core::{validate_batch, Decision, ValidationContext};
use proptest::option;
use proptest::prelude::*;
use proptest::sample::select;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

const IDS: &[&str] = &["XM-1", "XM-2", "GB-1-203", " "];
const TITLES: &[&str] = &["Water", "Schools built", "", "  "];
const TYPES: &[&str] = &["1", "2", "3", "4", "disbursement", "incoming_funds", "99"];
const CURRENCIES: &[&str] = &["USD", "EUR", "XXX", ""];
const DATES: &[&str] = &["2024-01-31", "2024-02-30", "31/01/2024", "2024-01-31T12:00:00"];
const CODES: &[&str] = &["1", "2", "A01", "application/pdf", "bogus"];

fn text(pool: &'static [&'static str]) -> impl Strategy<Value = Option<String>> {
    option::of(select(pool).prop_map(str::to_string))
}

fn field_value() -> impl Strategy<Value = Option<FieldValue>> {
    option::of(prop_oneof![
        (-500.0f64..5000.0).prop_map(FieldValue::Number),
        select(&["12", "abc", " ", "-3"][..]).prop_map(|s| FieldValue::Text(s.to_string())),
    ])
}

fn organisation() -> impl Strategy<Value = Option<OrganisationRef>> {
    option::of((text(IDS), text(TITLES)).prop_map(|(reference, name)| OrganisationRef { reference, name }))
}

fn transaction() -> impl Strategy<Value = TransactionRecord> {
    (
        text(TYPES),
        field_value(),
        text(CURRENCIES),
        text(DATES),
        organisation(),
        organisation(),
        text(IDS),
    )
        .prop_map(
            |(transaction_type, value, currency, transaction_date, provider_org, receiver_org, activity_id)| {
                TransactionRecord {
                    transaction_type,
                    value,
                    currency,
                    transaction_date,
                    provider_org,
                    receiver_org,
                    activity_id,
                    ..Default::default()
                }
            },
        )
}

fn documents() -> impl Strategy<Value = Vec<DocumentLink>> {
    prop::collection::vec(
        (text(CODES), text(CODES), text(DATES)).prop_map(|(format, category_code, document_date)| DocumentLink {
            format,
            category_code,
            document_date,
            ..Default::default()
        }),
        0..2,
    )
}

fn period_value() -> impl Strategy<Value = Option<PeriodValueRecord>> {
    option::of((field_value(), text(TITLES), documents(), 0usize..2).prop_map(
        |(value, comment, document_links, locations)| PeriodValueRecord {
            value,
            comment,
            document_links,
            locations: vec![Location::default(); locations],
            ..Default::default()
        },
    ))
}

fn period() -> impl Strategy<Value = PeriodRecord> {
    (text(DATES), text(DATES), period_value(), period_value()).prop_map(
        |(period_start, period_end, target, actual)| PeriodRecord {
            period_start,
            period_end,
            target,
            actual,
        },
    )
}

fn baseline() -> impl Strategy<Value = Option<BaselineRecord>> {
    option::of((field_value(), text(DATES), text(TITLES), documents()).prop_map(
        |(value, iso_date, comment, document_links)| BaselineRecord {
            value,
            iso_date,
            comment,
            document_links,
            ..Default::default()
        },
    ))
}

fn indicator() -> impl Strategy<Value = IndicatorRecord> {
    (
        text(TITLES),
        text(CODES),
        any::<Option<bool>>(),
        baseline(),
        prop::collection::vec(period(), 0..3),
    )
        .prop_map(|(title, measure, ascending, baseline, periods)| IndicatorRecord {
            title,
            measure,
            ascending,
            baseline,
            periods,
            ..Default::default()
        })
}

fn result() -> impl Strategy<Value = ResultRecord> {
    (
        text(TITLES),
        text(TITLES),
        text(CODES),
        documents(),
        prop::collection::vec(indicator(), 0..3),
    )
        .prop_map(|(title, description, result_type, document_links, indicators)| ResultRecord {
            title,
            description,
            result_type,
            document_links,
            indicators,
            ..Default::default()
        })
}

fn record() -> impl Strategy<Value = ImportRecord> {
    prop_oneof![
        (
            text(IDS),
            text(TITLES),
            prop::collection::vec(transaction(), 0..4),
            prop::collection::vec(result(), 0..3),
        )
            .prop_map(|(iati_identifier, title, transactions, results)| {
                ImportRecord::Activity(ActivityRecord {
                    iati_identifier,
                    title,
                    transactions,
                    results,
                    ..Default::default()
                })
            }),
        (text(IDS), prop::collection::vec(result(), 0..3))
            .prop_map(|(activity_id, results)| ImportRecord::Results(ResultsRecord { activity_id, results })),
        transaction().prop_map(ImportRecord::Transaction),
    ]
}

fn batch() -> impl Strategy<Value = ImportBatch> {
    prop::collection::vec(record(), 0..6).prop_map(|records| ImportBatch {
        file_name: None,
        records,
    })
}

fn lookup() -> impl Strategy<Value = LookupState> {
    prop_oneof![
        Just(LookupState::available(
            CodeListSnapshot::new()
                .with_list(CodeList::Currency, ["USD", "EUR"])
                .with_list(CodeList::TransactionType, ["1", "2", "3", "4"])
                .with_list(CodeList::ResultType, ["1", "2"]),
        )),
        Just(LookupState::unavailable("offline")),
    ]
}

fn percentages(r: &CoverageReport) -> [u8; 5] {
    [r.result, r.indicator, r.baseline, r.period, r.overall]
}

/// Populate one more optional element on every result, indicator, baseline
/// and period.
fn enrich(batch: &mut ImportBatch) {
    for record in &mut batch.records {
        let results = match record {
            ImportRecord::Activity(a) => &mut a.results,
            ImportRecord::Results(r) => &mut r.results,
            ImportRecord::Transaction(_) => continue,
        };
        for result in results {
            result.aggregation_status = Some(true);
            for indicator in &mut result.indicators {
                indicator.ascending = Some(true);
                if let Some(b) = &mut indicator.baseline {
                    b.locations.push(Location::default());
                }
                for period in &mut indicator.periods {
                    period
                        .target
                        .get_or_insert_with(PeriodValueRecord::default)
                        .dimensions
                        .push(Dimension::default());
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn issue_count_matches_details(b in batch(), lookup in lookup()) {
        let outcome = validate_batch(&b, &ValidationContext::new(lookup));
        for issue in outcome.summary.issues() {
            prop_assert_eq!(issue.count() as usize, issue.details().len());
            prop_assert!(issue.count() > 0);
        }
        let details: u32 = outcome.summary.issues().map(|i| i.count()).sum();
        prop_assert_eq!(
            (outcome.report.errors.len() + outcome.report.warnings.len()) as u32,
            details
        );
    }

    #[test]
    fn severity_is_fixed_per_type(b in batch(), lookup in lookup()) {
        let outcome = validate_batch(&b, &ValidationContext::new(lookup));
        for issue in &outcome.summary.errors {
            prop_assert_eq!(issue.severity(), ValidationSeverity::Error);
            prop_assert_eq!(issue.issue_type().severity(), ValidationSeverity::Error);
        }
        for issue in &outcome.summary.warnings {
            prop_assert_eq!(issue.severity(), ValidationSeverity::Warning);
            prop_assert_eq!(issue.issue_type().severity(), ValidationSeverity::Warning);
        }
    }

    #[test]
    fn coverage_stays_within_bounds(b in batch()) {
        let outcome = validate_batch(&b, &ValidationContext::new(LookupState::unavailable("offline")));
        for pct in percentages(&outcome.summary.coverage_report()) {
            prop_assert!(pct <= 100);
        }
    }

    #[test]
    fn gate_is_idempotent(b in batch(), lookup in lookup()) {
        let outcome = validate_batch(&b, &ValidationContext::new(lookup));
        let again = Decision::evaluate(&outcome.summary);
        prop_assert_eq!(again, outcome.decision);
        prop_assert_eq!(Decision::evaluate(&outcome.summary), again);
        prop_assert_eq!(outcome.decision == Decision::Reject, !outcome.summary.errors.is_empty());
    }

    #[test]
    fn unresolved_results_contribute_nothing(b in batch()) {
        let ctx = ValidationContext::new(LookupState::unavailable("offline"));
        let activity_ids: Vec<String> = b
            .records
            .iter()
            .filter_map(|r| match r {
                ImportRecord::Activity(a) => a.iati_identifier.as_deref().map(|s| s.trim().to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect();
        let mut resolved = b.clone();
        resolved.records.retain(|r| match r {
            ImportRecord::Results(r) => r
                .activity_id
                .as_deref()
                .is_some_and(|id| activity_ids.iter().any(|known| known == id.trim())),
            _ => true,
        });

        let all = validate_batch(&b, &ctx).summary;
        let kept = validate_batch(&resolved, &ctx).summary;
        prop_assert_eq!(all.created, kept.created);
        prop_assert_eq!(all.coverage, kept.coverage);
    }

    #[test]
    fn more_elements_never_lower_coverage(b in batch()) {
        let ctx = ValidationContext::new(LookupState::unavailable("offline"));
        let before = validate_batch(&b, &ctx).summary.coverage_report();
        let mut enriched = b.clone();
        enrich(&mut enriched);
        let after = validate_batch(&enriched, &ctx).summary.coverage_report();
        for (x, y) in percentages(&before).into_iter().zip(percentages(&after)) {
            prop_assert!(y >= x, "coverage dropped from {} to {}", x, y);
        }
    }

    #[test]
    fn parallel_and_sequential_agree(b in batch(), lookup in lookup()) {
        let ctx = ValidationContext::new(lookup).with_known_activities(["GB-1-203"]);
        prop_assert_eq!(
            collect_findings(&b, &ctx, ExecutionMode::Sequential),
            collect_findings(&b, &ctx, ExecutionMode::Parallel)
        );
        let seq = validate_batch_with(&b, &ctx, ExecutionMode::Sequential);
        let par = validate_batch_with(&b, &ctx, ExecutionMode::Parallel);
        prop_assert_eq!(seq.summary, par.summary);
        prop_assert_eq!(seq.decision, par.decision);
    }

    #[test]
    fn rows_are_either_successful_or_failed(b in batch(), lookup in lookup()) {
        let outcome = validate_batch(&b, &ValidationContext::new(lookup));
        prop_assert_eq!(outcome.log.total_rows as usize, b.records.len());
        prop_assert_eq!(outcome.log.successful_rows + outcome.log.failed_rows, outcome.log.total_rows);
        // Every error is attached to a record, so errors and failed rows go together.
        prop_assert_eq!(outcome.log.failed_rows == 0, outcome.summary.errors.is_empty());
    }
}
