//! Handlers for the `/imports` resource.
//!
//! Validation runs on already-parsed batches. Nothing is persisted here: the
//! caller writes accepted entities itself and may report the counts back via
//! the summary endpoint.

use aims_core::checklist::{self, LevelChecklist};
use aims_core::engine::{self, ValidationContext, ValidationOutcome};
use aims_core::import_log::ImportLog;
use aims_core::records::{ImportBatch, ImportRecord};
use aims_core::report::ImportReport;
use aims_core::summary::{CreatedCounts, ImportSummary};
use aims_core::validation::rules::{IssueType, ValidationSeverity};
use aims_core::Decision;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ── Reference data ───────────────────────────────────────────────────

/// GET /api/v1/imports/checklist
///
/// The canonical element checklist for each results-framework level. These
/// are the coverage denominators.
pub async fn list_checklists() -> Json<DataResponse<Vec<LevelChecklist>>> {
    Json(DataResponse {
        data: checklist::registry(),
    })
}

#[derive(Debug, Serialize)]
pub struct IssueTypeInfo {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: ValidationSeverity,
}

/// GET /api/v1/imports/issue-types
pub async fn list_issue_types() -> Json<DataResponse<Vec<IssueTypeInfo>>> {
    let data = IssueType::ALL
        .into_iter()
        .map(|issue_type| IssueTypeInfo {
            issue_type,
            severity: issue_type.severity(),
        })
        .collect();
    Json(DataResponse { data })
}

// ── Validation ───────────────────────────────────────────────────────

/// Request body for the validation endpoint.
#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    #[serde(default)]
    pub file_name: Option<String>,
    pub records: Vec<ImportRecord>,
    /// Activities already stored by the caller; transactions and results may
    /// reference these as well as activities in the batch.
    #[serde(default)]
    pub known_activity_ids: Vec<String>,
}

/// Request body for the summary endpoint.
#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    #[serde(default)]
    pub file_name: Option<String>,
    pub records: Vec<ImportRecord>,
    #[serde(default)]
    pub known_activity_ids: Vec<String>,
    /// Entities the caller actually created.
    pub created: CreatedCounts,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub decision: Decision,
    pub may_persist: bool,
    pub summary: ImportSummary,
    pub report: ImportReport,
    pub log: ImportLog,
}

impl From<ValidationOutcome> for ImportResponse {
    fn from(outcome: ValidationOutcome) -> Self {
        Self {
            decision: outcome.decision,
            may_persist: outcome.decision.may_persist(),
            summary: outcome.summary,
            report: outcome.report,
            log: outcome.log,
        }
    }
}

/// Split a request into the batch and its validation context, enforcing the
/// configured batch size limit.
fn prepare(state: &AppState, body: ValidateRequest) -> AppResult<(ImportBatch, ValidationContext)> {
    let max = state.config.max_batch_records;
    if body.records.len() > max {
        return Err(AppError::BadRequest(format!(
            "batch has {} records, the limit is {max}",
            body.records.len()
        )));
    }

    let ctx = ValidationContext::new(state.lookup()).with_known_activities(body.known_activity_ids);
    let batch = ImportBatch {
        file_name: body.file_name,
        records: body.records,
    };
    Ok((batch, ctx))
}

/// Run CPU-bound validation off the async runtime.
async fn run_blocking<F>(job: F) -> AppResult<ValidationOutcome>
where
    F: FnOnce() -> AppResult<ValidationOutcome> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| AppError::InternalError(format!("validation task failed: {e}")))?
}

/// POST /api/v1/imports/validate
///
/// Validate a parsed batch and return the decision, summary, UI report and
/// import log. Created counts are the entities that would be created.
pub async fn validate(
    State(state): State<AppState>,
    payload: Result<Json<ValidateRequest>, JsonRejection>,
) -> AppResult<Json<DataResponse<ImportResponse>>> {
    let Json(body) = payload?;
    let (batch, ctx) = prepare(&state, body)?;
    tracing::debug!(records = batch.records.len(), "Validating import batch");

    let outcome = run_blocking(move || Ok(engine::validate_batch(&batch, &ctx))).await?;
    Ok(Json(DataResponse {
        data: outcome.into(),
    }))
}

/// POST /api/v1/imports/summary
///
/// Same as `validate`, but the summary reports the counts the caller
/// actually created. Returns 400 when any count exceeds what the batch could
/// have produced.
pub async fn summarize(
    State(state): State<AppState>,
    payload: Result<Json<SummaryRequest>, JsonRejection>,
) -> AppResult<Json<DataResponse<ImportResponse>>> {
    let Json(body) = payload?;
    let created = body.created;
    let request = ValidateRequest {
        file_name: body.file_name,
        records: body.records,
        known_activity_ids: body.known_activity_ids,
    };
    let (batch, ctx) = prepare(&state, request)?;

    let outcome = run_blocking(move || {
        engine::summarize_with_created(&batch, &ctx, created).map_err(AppError::from)
    })
    .await?;
    Ok(Json(DataResponse {
        data: outcome.into(),
    }))
}
