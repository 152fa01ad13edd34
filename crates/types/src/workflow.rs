//! Workflow descriptions as exported by Galaxy and the invocation payload built from them.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::library::DatasetRef;

/// Step label that receives the uploaded sample dataset or collection.
pub const SAMPLE_INPUT_LABEL: &str = "INPUT";

/// Step `type` marking a nested workflow.
pub const SUBWORKFLOW_STEP_TYPE: &str = "subworkflow";

/// Parameters configured for one step, keyed by parameter name.
pub type StepParams = IndexMap<String, JsonValue>;

/// Entry of the workflow listing; only enough to pick one by name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkflowSummary {
    pub id: String,
    pub name: String,
}

/// Exported workflow definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowDescription {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Steps keyed by their step id as a string (`"0"`, `"1"`, ...).
    #[serde(default)]
    pub steps: IndexMap<String, WorkflowStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowStep {
    #[serde(deserialize_with = "deserialize_step_id")]
    pub id: String,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl WorkflowStep {
    pub fn is_subworkflow(&self) -> bool {
        self.kind.as_deref() == Some(SUBWORKFLOW_STEP_TYPE)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StepIdRepr {
    Number(u64),
    Text(String),
}

/// Galaxy exports step ids as integers; older exports and hand-written fixtures use strings.
fn deserialize_step_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match StepIdRepr::deserialize(deserializer)? {
        StepIdRepr::Number(number) => number.to_string(),
        StepIdRepr::Text(text) => text,
    })
}

/// Inputs, per-step parameters and replacement tokens for one invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InvocationPayload {
    /// Step uuid to dataset reference.
    pub inputs: IndexMap<String, DatasetRef>,
    /// Step id to parameters. Sub-workflow steps use `"<sub_step_id>|<param>"` keys.
    pub params: IndexMap<String, StepParams>,
    pub replacement_params: IndexMap<String, JsonValue>,
}

/// Request body for `POST /api/workflows/{id}/invocations`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InvocationRequest {
    pub history: String,
    pub inputs: IndexMap<String, DatasetRef>,
    pub parameters: IndexMap<String, StepParams>,
    pub replacement_params: IndexMap<String, JsonValue>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub no_add_to_history: bool,
}

impl InvocationRequest {
    pub fn new(payload: InvocationPayload, history_id: &str, import_inputs_to_history: bool) -> Self {
        Self {
            history: format!("hist_id={history_id}"),
            inputs: payload.inputs,
            parameters: payload.params,
            replacement_params: payload.replacement_params,
            no_add_to_history: !import_inputs_to_history,
        }
    }
}
