//! Which parsed entities would be persisted.
//!
//! An entity is accepted when it passes its own required-field checks and
//! every ancestor was accepted. Coverage and created counts only ever look at
//! accepted entities. The required-field predicates are the same ones the
//! `missing_required` rule reports against, and a results subtree needs an
//! activity that resolves the same way `missing_activity` checks it.

use crate::records::{
    text, BaselineRecord, ImportBatch, ImportRecord, IndicatorRecord, PeriodRecord, ResultRecord,
};
use crate::validation::evaluator::RuleContext;

/// Borrowing view over the accepted part of a batch's results framework.
#[derive(Debug, Default)]
pub struct AcceptedBatch<'a> {
    pub results: Vec<AcceptedResult<'a>>,
}

#[derive(Debug)]
pub struct AcceptedResult<'a> {
    pub record: &'a ResultRecord,
    pub indicators: Vec<AcceptedIndicator<'a>>,
}

/// An accepted indicator. Its baseline and periods have no required fields of
/// their own, so they are accepted along with it.
#[derive(Debug)]
pub struct AcceptedIndicator<'a> {
    pub record: &'a IndicatorRecord,
}

impl<'a> AcceptedIndicator<'a> {
    pub fn baseline(&self) -> Option<&'a BaselineRecord> {
        self.record.baseline.as_ref()
    }

    pub fn periods(&self) -> &'a [PeriodRecord] {
        &self.record.periods
    }
}

/// Whether a root record itself would be persisted.
pub fn root_accepted(record: &ImportRecord, rules: &RuleContext<'_>) -> bool {
    if !record.missing_root_fields().is_empty() {
        return false;
    }
    match record {
        ImportRecord::Results(r) => text(&r.activity_id).is_some_and(|id| rules.resolves(id)),
        ImportRecord::Activity(_) | ImportRecord::Transaction(_) => true,
    }
}

impl<'a> AcceptedBatch<'a> {
    pub fn walk(batch: &'a ImportBatch, rules: &RuleContext<'_>) -> Self {
        let results = batch
            .records
            .iter()
            .filter(|r| root_accepted(r, rules))
            .flat_map(|r| r.results())
            .filter(|r| r.missing_required_fields().is_empty())
            .map(|record| AcceptedResult {
                record,
                indicators: record
                    .indicators
                    .iter()
                    .filter(|i| i.missing_required_fields().is_empty())
                    .map(|record| AcceptedIndicator { record })
                    .collect(),
            })
            .collect();
        Self { results }
    }

    pub fn indicators(&self) -> impl Iterator<Item = &AcceptedIndicator<'a>> {
        self.results.iter().flat_map(|r| r.indicators.iter())
    }

    pub fn baselines(&self) -> impl Iterator<Item = &'a BaselineRecord> + '_ {
        self.indicators().filter_map(AcceptedIndicator::baseline)
    }

    pub fn periods(&self) -> impl Iterator<Item = &'a PeriodRecord> + '_ {
        self.indicators().flat_map(AcceptedIndicator::periods)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::lookup::LookupState;
    use crate::records::{ActivityRecord, ResultsRecord, TransactionRecord};

    fn walk<'a>(batch: &'a ImportBatch, known: &[&str]) -> AcceptedBatch<'a> {
        let lookup = LookupState::unavailable("not needed");
        let known: BTreeSet<String> = known.iter().map(|s| s.to_string()).collect();
        AcceptedBatch::walk(batch, &RuleContext::new(batch, &lookup, &known))
    }

    fn titled_result(indicators: Vec<IndicatorRecord>) -> ResultRecord {
        ResultRecord {
            title: Some("Result".into()),
            indicators,
            ..Default::default()
        }
    }

    fn titled_indicator() -> IndicatorRecord {
        IndicatorRecord {
            title: Some("Indicator".into()),
            baseline: Some(BaselineRecord::default()),
            periods: vec![PeriodRecord::default(), PeriodRecord::default()],
            ..Default::default()
        }
    }

    #[test]
    fn accepted_tree_follows_ancestors() {
        let batch = ImportBatch {
            file_name: None,
            records: vec![
                ImportRecord::Activity(ActivityRecord {
                    iati_identifier: Some("XM-1".into()),
                    title: Some("Water".into()),
                    results: vec![
                        titled_result(vec![titled_indicator(), IndicatorRecord::default()]),
                        ResultRecord {
                            indicators: vec![titled_indicator()],
                            ..Default::default()
                        },
                    ],
                    ..Default::default()
                }),
                // Untitled activity: nothing below it is accepted.
                ImportRecord::Activity(ActivityRecord {
                    iati_identifier: Some("XM-2".into()),
                    results: vec![titled_result(vec![titled_indicator()])],
                    ..Default::default()
                }),
                ImportRecord::Results(ResultsRecord {
                    activity_id: Some("XM-1".into()),
                    results: vec![titled_result(vec![])],
                }),
            ],
        };

        let accepted = walk(&batch, &[]);
        assert_eq!(accepted.results.len(), 2);
        assert_eq!(accepted.indicators().count(), 1);
        assert_eq!(accepted.baselines().count(), 1);
        assert_eq!(accepted.periods().count(), 2);
    }

    #[test]
    fn transactions_and_orphaned_results_are_not_containers() {
        let batch = ImportBatch {
            file_name: None,
            records: vec![
                ImportRecord::Transaction(TransactionRecord::default()),
                ImportRecord::Results(ResultsRecord {
                    activity_id: None,
                    results: vec![titled_result(vec![titled_indicator()])],
                }),
            ],
        };
        assert!(walk(&batch, &[]).results.is_empty());
    }

    #[test]
    fn results_for_unresolved_activity_are_not_accepted() {
        let batch = ImportBatch {
            file_name: None,
            records: vec![ImportRecord::Results(ResultsRecord {
                activity_id: Some("NOPE".into()),
                results: vec![titled_result(vec![titled_indicator()])],
            })],
        };
        assert!(walk(&batch, &[]).results.is_empty());

        let accepted = walk(&batch, &["NOPE"]);
        assert_eq!(accepted.results.len(), 1);
        assert_eq!(accepted.indicators().count(), 1);
    }
}
