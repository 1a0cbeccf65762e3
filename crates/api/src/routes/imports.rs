//! Route definitions for the `/imports` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::imports;
use crate::state::AppState;

/// Routes mounted at `/imports`.
///
/// ```text
/// GET    /checklist     -> list_checklists
/// GET    /issue-types   -> list_issue_types
/// POST   /validate      -> validate
/// POST   /summary       -> summarize
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checklist", get(imports::list_checklists))
        .route("/issue-types", get(imports::list_issue_types))
        .route("/validate", post(imports::validate))
        .route("/summary", post(imports::summarize))
}
