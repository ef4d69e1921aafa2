use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Operator errors
// ---------------------------------------------------------------------------

/// Errors produced while talking to collaborators or rendering configuration.
///
/// Unmet preconditions are not errors: they surface as a `UnitStatus` on the
/// reconcile outcome. What remains here is either transient (the collaborator
/// could not be reached, retry later) or fatal (a programming or settings
/// mistake that must not produce a half-written workload).
#[derive(Debug, thiserror::Error)]
pub enum OperatorError {
    /// The workload container, its supervisor, or the host runtime could not
    /// be reached. Always retried by re-delivering the triggering event.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The renderer or publisher was invoked with inputs that the readiness
    /// gates should have ruled out.
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// Operator settings failed validation.
    #[error("invalid settings: {0}")]
    Settings(String),

    /// A file the operator owns could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A host tool exited unsuccessfully.
    #[error("command `{command}` failed: {message}")]
    Command { command: String, message: String },
}

impl OperatorError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OperatorError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the failure should be handled by deferring the event rather
    /// than aborting the pass.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OperatorError::Unavailable(_) | OperatorError::Command { .. }
        )
    }
}

pub type Result<T, E = OperatorError> = std::result::Result<T, E>;
