//! Element coverage of the accepted results framework.
//!
//! Each level keeps the set of canonical element names that appeared at least
//! once on an accepted entity. Percentages divide by the checklist totals and
//! use exact integer round-half-up.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::acceptance::AcceptedBatch;
use crate::checklist::{self, EntityLevel};
use crate::checklist::{
    EL_ACTUAL_COMMENT, EL_ACTUAL_DIMENSION, EL_ACTUAL_DOCUMENT_LINK, EL_ACTUAL_LOCATION,
    EL_ACTUAL_VALUE, EL_AGGREGATION_STATUS, EL_ASCENDING, EL_COMMENT, EL_DESCRIPTION,
    EL_DIMENSION, EL_DOCUMENT_LINK, EL_ISO_DATE, EL_LOCATION, EL_MEASURE, EL_PERIOD_END,
    EL_PERIOD_START, EL_REFERENCE, EL_TARGET_COMMENT, EL_TARGET_DIMENSION,
    EL_TARGET_DOCUMENT_LINK, EL_TARGET_LOCATION, EL_TARGET_VALUE, EL_TITLE, EL_VALUE, EL_YEAR,
};
use crate::records::{has_text, PeriodValueRecord};

/// Canonical element names found at one level.
pub type CoverageSet = BTreeSet<&'static str>;

/// Found elements for all four levels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoverageSets {
    pub result: CoverageSet,
    pub indicator: CoverageSet,
    pub baseline: CoverageSet,
    pub period: CoverageSet,
}

impl CoverageSets {
    pub fn get(&self, level: EntityLevel) -> &CoverageSet {
        match level {
            EntityLevel::Result => &self.result,
            EntityLevel::Indicator => &self.indicator,
            EntityLevel::Baseline => &self.baseline,
            EntityLevel::Period => &self.period,
        }
    }

    fn mark(&mut self, level: EntityLevel, element: &'static str, populated: bool) {
        debug_assert!(checklist::is_canonical(level, element), "{element} is not a {level} element");
        if !populated {
            return;
        }
        let set = match level {
            EntityLevel::Result => &mut self.result,
            EntityLevel::Indicator => &mut self.indicator,
            EntityLevel::Baseline => &mut self.baseline,
            EntityLevel::Period => &mut self.period,
        };
        set.insert(element);
    }

    /// Collect found elements from every accepted entity.
    pub fn collect(accepted: &AcceptedBatch<'_>) -> Self {
        use EntityLevel::*;

        let mut sets = Self::default();
        for result in &accepted.results {
            let r = result.record;
            sets.mark(Result, EL_TITLE, has_text(&r.title));
            sets.mark(Result, EL_DESCRIPTION, has_text(&r.description));
            sets.mark(Result, EL_DOCUMENT_LINK, !r.document_links.is_empty());
            sets.mark(Result, EL_REFERENCE, !r.references.is_empty());
            sets.mark(Result, EL_AGGREGATION_STATUS, r.aggregation_status.is_some());
        }

        for indicator in accepted.indicators() {
            let i = indicator.record;
            sets.mark(Indicator, EL_TITLE, has_text(&i.title));
            sets.mark(Indicator, EL_DESCRIPTION, has_text(&i.description));
            sets.mark(Indicator, EL_MEASURE, has_text(&i.measure));
            sets.mark(Indicator, EL_ASCENDING, i.ascending.is_some());
            sets.mark(Indicator, EL_AGGREGATION_STATUS, i.aggregation_status.is_some());
            sets.mark(Indicator, EL_REFERENCE, !i.references.is_empty());
            sets.mark(Indicator, EL_DOCUMENT_LINK, !i.document_links.is_empty());
        }

        for b in accepted.baselines() {
            sets.mark(Baseline, EL_VALUE, b.has_value());
            sets.mark(Baseline, EL_YEAR, b.has_year());
            sets.mark(Baseline, EL_ISO_DATE, has_text(&b.iso_date));
            sets.mark(Baseline, EL_COMMENT, has_text(&b.comment));
            sets.mark(Baseline, EL_LOCATION, !b.locations.is_empty());
            sets.mark(Baseline, EL_DIMENSION, !b.dimensions.is_empty());
            sets.mark(Baseline, EL_DOCUMENT_LINK, !b.document_links.is_empty());
        }

        for p in accepted.periods() {
            sets.mark(Period, EL_PERIOD_START, has_text(&p.period_start));
            sets.mark(Period, EL_PERIOD_END, has_text(&p.period_end));
            if let Some(target) = &p.target {
                sets.mark_period_value(target, TARGET_ELEMENTS);
            }
            if let Some(actual) = &p.actual {
                sets.mark_period_value(actual, ACTUAL_ELEMENTS);
            }
        }

        sets
    }

    fn mark_period_value(&mut self, v: &PeriodValueRecord, names: [&'static str; 5]) {
        let [value, comment, location, dimension, document_link] = names;
        self.mark(EntityLevel::Period, value, v.has_value());
        self.mark(EntityLevel::Period, comment, has_text(&v.comment));
        self.mark(EntityLevel::Period, location, !v.locations.is_empty());
        self.mark(EntityLevel::Period, dimension, !v.dimensions.is_empty());
        self.mark(EntityLevel::Period, document_link, !v.document_links.is_empty());
    }

    pub fn report(&self) -> CoverageReport {
        let pct = |level| percentage(self.get(level).len(), checklist::total_for(level));
        let result = pct(EntityLevel::Result);
        let indicator = pct(EntityLevel::Indicator);
        let baseline = pct(EntityLevel::Baseline);
        let period = pct(EntityLevel::Period);
        CoverageReport {
            result,
            indicator,
            baseline,
            period,
            overall: overall(&[result, indicator, baseline, period]),
        }
    }
}

const TARGET_ELEMENTS: [&str; 5] = [
    EL_TARGET_VALUE,
    EL_TARGET_COMMENT,
    EL_TARGET_LOCATION,
    EL_TARGET_DIMENSION,
    EL_TARGET_DOCUMENT_LINK,
];

const ACTUAL_ELEMENTS: [&str; 5] = [
    EL_ACTUAL_VALUE,
    EL_ACTUAL_COMMENT,
    EL_ACTUAL_LOCATION,
    EL_ACTUAL_DIMENSION,
    EL_ACTUAL_DOCUMENT_LINK,
];

/// Per-level and overall coverage percentages, each in `0..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    pub result: u8,
    pub indicator: u8,
    pub baseline: u8,
    pub period: u8,
    pub overall: u8,
}

/// `round(found / total * 100)`, half up, clamped to 100.
pub fn percentage(found: usize, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let found = found as u64;
    let total = u64::from(total);
    let rounded = (200 * found + total) / (2 * total);
    rounded.min(100) as u8
}

/// Round-half-up mean of already rounded level percentages.
pub fn overall(levels: &[u8]) -> u8 {
    if levels.is_empty() {
        return 0;
    }
    let sum: u64 = levels.iter().map(|&p| u64::from(p)).sum();
    let n = levels.len() as u64;
    ((2 * sum + n) / (2 * n)).min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{
        ActivityRecord, BaselineRecord, FieldValue, ImportBatch, ImportRecord, IndicatorRecord,
        Location, PeriodRecord, ResultRecord,
    };
    use crate::lookup::LookupState;
    use crate::validation::evaluator::RuleContext;

    fn walk(batch: &ImportBatch) -> AcceptedBatch<'_> {
        let lookup = LookupState::unavailable("unused");
        let known = std::collections::BTreeSet::new();
        AcceptedBatch::walk(batch, &RuleContext::new(batch, &lookup, &known))
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(1, 7), 14); // 14.28
        assert_eq!(percentage(1, 8), 13); // 12.5
        assert_eq!(percentage(3, 12), 25);
        assert_eq!(percentage(5, 5), 100);
        assert_eq!(percentage(0, 5), 0);
    }

    #[test]
    fn percentage_is_clamped() {
        assert_eq!(percentage(9, 5), 100);
        assert_eq!(percentage(1, 0), 0);
    }

    #[test]
    fn overall_is_mean_of_rounded_levels() {
        // mean 50.5 rounds up
        assert_eq!(overall(&[100, 0, 1, 101]), 51);
        assert_eq!(overall(&[20, 29, 14, 25]), 22);
        assert_eq!(overall(&[]), 0);
    }

    #[test]
    fn collects_only_populated_elements() {
        let batch = ImportBatch {
            file_name: None,
            records: vec![ImportRecord::Activity(ActivityRecord {
                iati_identifier: Some("XM-1".into()),
                title: Some("Water".into()),
                results: vec![ResultRecord {
                    title: Some("More wells".into()),
                    description: Some("   ".into()),
                    indicators: vec![IndicatorRecord {
                        title: Some("Wells dug".into()),
                        ascending: Some(false),
                        baseline: Some(BaselineRecord {
                            value: Some(FieldValue::Number(0.0)),
                            locations: vec![Location::default()],
                            ..Default::default()
                        }),
                        periods: vec![PeriodRecord {
                            period_start: Some("2024-01-01".into()),
                            target: Some(PeriodValueRecord {
                                value: Some(FieldValue::Text("40".into())),
                                ..Default::default()
                            }),
                            ..Default::default()
                        }],
                        ..Default::default()
                    }],
                    ..Default::default()
                }],
                ..Default::default()
            })],
        };

        let accepted = walk(&batch);
        let sets = CoverageSets::collect(&accepted);
        assert_eq!(sets.result, BTreeSet::from([EL_TITLE]));
        assert_eq!(sets.indicator, BTreeSet::from([EL_TITLE, EL_ASCENDING]));
        assert_eq!(sets.baseline, BTreeSet::from([EL_VALUE, EL_LOCATION]));
        assert_eq!(sets.period, BTreeSet::from([EL_PERIOD_START, EL_TARGET_VALUE]));

        let report = sets.report();
        assert_eq!(report.result, 20);
        assert_eq!(report.indicator, 29);
        assert_eq!(report.baseline, 29);
        assert_eq!(report.period, 17);
        assert_eq!(report.overall, 24);
    }

    #[test]
    fn empty_batch_has_zero_coverage() {
        let batch = ImportBatch::default();
        let report = CoverageSets::collect(&walk(&batch)).report();
        assert_eq!(report, CoverageReport::default());
    }
}
