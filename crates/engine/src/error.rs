//! Error taxonomy for library path handling, workflow binding and invocation.

use thiserror::Error;

/// Every failure is fatal to the current run; messages name the offending key, label or path.
#[derive(Debug, Error)]
pub enum GalaxyError {
    #[error("missing {variable}; set this in the environment or .env file")]
    MissingCredential { variable: String },

    #[error("missing \"{key}\" in the config")]
    MissingConfigKey { key: String },

    #[error("invalid config {path}: {reason}")]
    InvalidConfig { path: String, reason: String },

    #[error("found more than one library named \"{name}\"")]
    AmbiguousLibrary { name: String },

    #[error("library exists but is deleted: \"{name}\"")]
    DeletedLibraryConflict { name: String },

    #[error("multiple folders named {path} in library \"{library}\"")]
    AmbiguousFolder { library: String, path: String },

    #[error("multiple parent folders for name: {path}")]
    AmbiguousParentFolder { library: String, path: String },

    #[error("couldn't find parent folder named: {path}")]
    MissingParentFolder { library: String, path: String },

    #[error("couldn't find library folder \"{path}\"")]
    MissingFolder { path: String },

    #[error("can't find workflow named \"{name}\"")]
    WorkflowNotFound { name: String },

    #[error("found multiple workflows named \"{name}\"")]
    AmbiguousWorkflow { name: String },

    #[error("configuring workflow params, missing step with label {label}")]
    UnknownStepLabel { label: String },

    #[error("sub-workflow \"{workflow}\" has no step labeled {label}")]
    SubStepNotFound { workflow: String, label: String },

    #[error("params for sub-workflow step {step}/{label} must be a non-empty map")]
    InvalidSubStepParams { step: String, label: String },

    #[error("history lookup failed for \"{name}\": {reason}")]
    HistoryLookupFailure { name: String, reason: String },

    #[error("common input {label} not found in Galaxy at \"{path}\"")]
    MissingCommonInput { label: String, path: String },

    #[error("{name} is not a valid workflow. Please check the workflow name (expected one of: {allowed})")]
    UnknownWorkflow { name: String, allowed: String },

    #[error("sample \"{name}\" produced no datasets")]
    EmptySample { name: String },

    /// Transport or response failures from the Galaxy client.
    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}

pub type Result<T, E = GalaxyError> = std::result::Result<T, E>;

impl GalaxyError {
    pub fn missing_config_key(key: impl Into<String>) -> Self {
        Self::MissingConfigKey { key: key.into() }
    }

    pub fn history_lookup(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::HistoryLookupFailure {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
