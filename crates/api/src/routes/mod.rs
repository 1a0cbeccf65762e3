pub mod health;
pub mod imports;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /imports/checklist       canonical element checklists (GET)
/// /imports/issue-types     issue types and severities (GET)
/// /imports/validate        validate a parsed batch (POST)
/// /imports/summary         validate with caller-supplied created counts (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/imports", imports::router())
}
