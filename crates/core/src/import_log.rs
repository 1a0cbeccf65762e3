//! Per-run import log entry.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use uuid::Uuid;

use crate::decision::Decision;
use crate::records::{text, ImportBatch, ImportRecord};
use crate::summary::ImportSummary;
use crate::types::{RecordIndex, Timestamp};
use crate::validation::rules::IssueType;

/// File name recorded when the upload did not carry one.
pub const UNKNOWN_FILE_NAME: &str = "Unknown";

/// What kind of rows the batch held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Activities,
    Results,
    Transactions,
    Mixed,
    Empty,
}

impl EntityType {
    pub fn of(batch: &ImportBatch) -> Self {
        let mut kinds = batch.records.iter().map(|r| match r {
            ImportRecord::Activity(_) => Self::Activities,
            ImportRecord::Results(_) => Self::Results,
            ImportRecord::Transaction(_) => Self::Transactions,
        });
        let Some(first) = kinds.next() else {
            return Self::Empty;
        };
        if kinds.all(|k| k == first) {
            first
        } else {
            Self::Mixed
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportLog {
    pub import_id: Uuid,
    pub entity_type: EntityType,
    pub file_name: String,
    pub total_rows: u32,
    pub successful_rows: u32,
    pub failed_rows: u32,
    pub decision: Decision,
    pub issue_counts: BTreeMap<IssueType, u32>,
    pub validated_at: Timestamp,
}

impl ImportLog {
    /// `failed` holds the records with at least one error-severity finding.
    pub fn new(
        batch: &ImportBatch,
        summary: &ImportSummary,
        decision: Decision,
        failed: &BTreeSet<RecordIndex>,
    ) -> Self {
        let total_rows = u32::try_from(batch.records.len()).unwrap_or(u32::MAX);
        let failed_rows = u32::try_from(failed.len())
            .unwrap_or(u32::MAX)
            .min(total_rows);
        Self {
            import_id: Uuid::now_v7(),
            entity_type: EntityType::of(batch),
            file_name: text(&batch.file_name)
                .unwrap_or(UNKNOWN_FILE_NAME)
                .to_string(),
            total_rows,
            successful_rows: total_rows - failed_rows,
            failed_rows,
            decision,
            issue_counts: summary
                .issues()
                .map(|i| (i.issue_type(), i.count()))
                .collect(),
            validated_at: chrono::Utc::now(),
        }
    }
}
