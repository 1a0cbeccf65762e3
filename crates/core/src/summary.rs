//! Import summary: created counts, issue buckets and coverage merged into the
//! one structure the decision gate and the UI read.

use serde::{Deserialize, Serialize};

use crate::acceptance::AcceptedBatch;
use crate::coverage::{CoverageReport, CoverageSets};
use crate::error::CoreError;
use crate::validation::aggregator::IssueBuckets;
use crate::validation::rules::ValidationIssue;

// ---------------------------------------------------------------------------
// Created counts
// ---------------------------------------------------------------------------

/// Entities created (or that would be created) by the import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreatedCounts {
    pub results: u32,
    pub indicators: u32,
    pub baselines: u32,
    pub periods: u32,
    pub baseline_locations: u32,
    pub baseline_dimensions: u32,
    pub baseline_documents: u32,
    pub baseline_references: u32,
    pub period_target_locations: u32,
    pub period_target_dimensions: u32,
    pub period_target_documents: u32,
    pub period_target_references: u32,
    pub period_actual_locations: u32,
    pub period_actual_dimensions: u32,
    pub period_actual_documents: u32,
    pub period_actual_references: u32,
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

impl CreatedCounts {
    /// Logical counts: every accepted entity and the sub-elements it carries.
    pub fn from_accepted(accepted: &AcceptedBatch<'_>) -> Self {
        let mut c = Self {
            results: count(accepted.results.len()),
            indicators: count(accepted.indicators().count()),
            ..Self::default()
        };

        for b in accepted.baselines() {
            c.baselines += 1;
            c.baseline_locations += count(b.locations.len());
            c.baseline_dimensions += count(b.dimensions.len());
            c.baseline_documents += count(b.document_links.len());
            c.baseline_references += count(b.references.len());
        }

        for p in accepted.periods() {
            c.periods += 1;
            if let Some(t) = &p.target {
                c.period_target_locations += count(t.locations.len());
                c.period_target_dimensions += count(t.dimensions.len());
                c.period_target_documents += count(t.document_links.len());
                c.period_target_references += count(t.references.len());
            }
            if let Some(a) = &p.actual {
                c.period_actual_locations += count(a.locations.len());
                c.period_actual_dimensions += count(a.dimensions.len());
                c.period_actual_documents += count(a.document_links.len());
                c.period_actual_references += count(a.references.len());
            }
        }
        c
    }

    /// Counter name / value pairs in declaration order.
    pub fn entries(&self) -> [(&'static str, u32); 16] {
        [
            ("results", self.results),
            ("indicators", self.indicators),
            ("baselines", self.baselines),
            ("periods", self.periods),
            ("baselineLocations", self.baseline_locations),
            ("baselineDimensions", self.baseline_dimensions),
            ("baselineDocuments", self.baseline_documents),
            ("baselineReferences", self.baseline_references),
            ("periodTargetLocations", self.period_target_locations),
            ("periodTargetDimensions", self.period_target_dimensions),
            ("periodTargetDocuments", self.period_target_documents),
            ("periodTargetReferences", self.period_target_references),
            ("periodActualLocations", self.period_actual_locations),
            ("periodActualDimensions", self.period_actual_dimensions),
            ("periodActualDocuments", self.period_actual_documents),
            ("periodActualReferences", self.period_actual_references),
        ]
    }

    pub fn total(&self) -> u32 {
        self.entries()
            .iter()
            .fold(0u32, |acc, (_, n)| acc.saturating_add(*n))
    }

    /// Check caller-supplied counts against what the batch could have created.
    ///
    /// A caller may have inserted fewer entities than were accepted (a write
    /// can fail), but never more.
    pub fn reconcile(&self, accepted: &CreatedCounts) -> Result<(), CoreError> {
        let over: Vec<String> = self
            .entries()
            .iter()
            .zip(accepted.entries())
            .filter(|((_, supplied), (_, max))| supplied > max)
            .map(|((name, supplied), (_, max))| format!("{name} ({supplied} > {max})"))
            .collect();

        if over.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(format!(
                "created counts exceed accepted entities: {}",
                over.join(", ")
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Everything known about one import run after validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub created: CreatedCounts,
    pub total_created: u32,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub coverage: CoverageSets,
}

impl ImportSummary {
    pub fn build(created: CreatedCounts, buckets: IssueBuckets, coverage: CoverageSets) -> Self {
        Self {
            total_created: created.total(),
            created,
            errors: buckets.errors,
            warnings: buckets.warnings,
            coverage,
        }
    }

    pub fn coverage_report(&self) -> CoverageReport {
        self.coverage.report()
    }

    pub fn error_count(&self) -> u32 {
        self.errors.iter().map(ValidationIssue::count).sum()
    }

    pub fn warning_count(&self) -> u32 {
        self.warnings.iter().map(ValidationIssue::count).sum()
    }

    /// Every issue, errors first.
    pub fn issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.errors.iter().chain(self.warnings.iter())
    }
}
