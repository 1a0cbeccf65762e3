use std::path::Path;
use std::sync::Arc;

use aims_core::lookup::{CodeListSnapshot, LookupState};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Code lists loaded at startup; `None` when not configured or unreadable.
    pub code_lists: Option<Arc<CodeListSnapshot>>,
}

impl AppState {
    /// Build state from configuration, loading the code-list file if one is set.
    pub fn new(config: ServerConfig) -> Self {
        let code_lists = match &config.code_lists_path {
            Some(path) => load_code_lists(path).map(Arc::new),
            None => {
                tracing::warn!("CODE_LISTS_PATH not set, code checks will be skipped");
                None
            }
        };
        Self {
            config: Arc::new(config),
            code_lists,
        }
    }

    /// Lookup for one batch.
    pub fn lookup(&self) -> LookupState {
        LookupState::from_snapshot(self.code_lists.clone())
    }
}

fn load_code_lists(path: &Path) -> Option<CodeListSnapshot> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read code lists");
            return None;
        }
    };
    match CodeListSnapshot::from_json_str(&raw) {
        Ok(snapshot) => {
            tracing::info!(
                path = %path.display(),
                lists = snapshot.list_count(),
                codes = snapshot.code_count(),
                "Loaded code lists"
            );
            Some(snapshot)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to parse code lists");
            None
        }
    }
}
