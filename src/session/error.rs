use std::path::PathBuf;

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the session orchestrator.
///
/// Stale ids, corrupt documents and spawn failures are absorbed and never
/// show up here.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Project '{project_id}' not found")]
    ProjectNotFound { project_id: String },

    #[error("Invalid project directory '{path}': {source}")]
    InvalidProjectPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to start session event pump: {0}")]
    EventPump(#[source] std::io::Error),
}
