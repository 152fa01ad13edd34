use std::path::PathBuf;

use glxy_types::StepParams;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value as JsonValue;

/// Configuration as written by the user, before required keys are checked.
///
/// Keys the tooling does not know are accepted and ignored; they are commonly
/// used as targets for `{key}` references.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawInputsConfig {
    #[serde(default)]
    pub galaxy_url: Option<String>,
    #[serde(default)]
    pub common_inputs: Option<IndexMap<String, String>>,
    #[serde(default)]
    pub workflow: Option<String>,
    #[serde(default)]
    pub library_folder: Option<String>,
    #[serde(default)]
    pub sample: Option<RawSampleConfig>,
    #[serde(default)]
    pub workflow_params: Option<IndexMap<String, StepParams>>,
    #[serde(default)]
    pub replacement_params: Option<IndexMap<String, JsonValue>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSampleConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub files: Option<Vec<PathBuf>>,
    #[serde(default)]
    pub filetype: Option<String>,
}

impl RawSampleConfig {
    pub(crate) fn is_empty(&self) -> bool {
        self.name.is_none() && self.files.is_none() && self.filetype.is_none()
    }
}

/// Validated configuration for one `collect_inputs` run.
#[derive(Debug, Clone, PartialEq)]
pub struct InputsConfig {
    pub galaxy_url: String,
    /// Input step label to library path.
    pub common_inputs: IndexMap<String, String>,
    pub workflow: String,
    /// Library path (`library/folder/...`) receiving the sample files.
    pub library_folder: String,
    pub sample: SampleConfig,
    pub workflow_params: IndexMap<String, StepParams>,
    pub replacement_params: IndexMap<String, JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleConfig {
    pub name: String,
    /// Paths on the Galaxy server's filesystem.
    pub files: Vec<PathBuf>,
    /// Galaxy datatype assigned on import (`fastqsanger`, `bam`, ...).
    pub filetype: String,
}
