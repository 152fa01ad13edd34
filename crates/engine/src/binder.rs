//! Binding configuration onto a workflow's steps.
//!
//! Steps are matched by label. Common inputs bind library datasets to input
//! steps, the step labeled [`SAMPLE_INPUT_LABEL`] receives the sample dataset
//! or collection, and `workflow_params` become per-step parameter maps keyed
//! by step id.

use std::collections::HashMap;

use glxy_types::{DatasetRef, InvocationPayload, SAMPLE_INPUT_LABEL, StepParams, WorkflowDescription, WorkflowStep};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::error::{GalaxyError, Result};
use crate::remote::GalaxyApi;
use crate::workflows::get_workflow_description;

/// Index over one workflow description, ready to bind inputs and parameters.
#[derive(Debug)]
pub struct WorkflowBinder<'a> {
    description: &'a WorkflowDescription,
    steps_by_label: HashMap<&'a str, &'a WorkflowStep>,
}

impl<'a> WorkflowBinder<'a> {
    pub fn new(description: &'a WorkflowDescription) -> Self {
        let mut steps_by_label = HashMap::new();
        for step in description.steps.values() {
            // Later steps overwrite earlier ones carrying the same label.
            if let Some(label) = step.label.as_deref() {
                steps_by_label.insert(label, step);
            }
        }
        Self {
            description,
            steps_by_label,
        }
    }

    pub fn step(&self, label: &str) -> Option<&'a WorkflowStep> {
        self.steps_by_label.get(label).copied()
    }

    /// Map step uuids to the datasets feeding them.
    ///
    /// `common_inputs` maps step labels to library dataset ids.
    pub fn bind_inputs(&self, common_inputs: &IndexMap<String, String>, sample: &DatasetRef) -> IndexMap<String, DatasetRef> {
        let mut inputs = IndexMap::new();
        let mut sample_bound = false;
        for step in self.description.steps.values() {
            let Some(label) = step.label.as_deref() else {
                continue;
            };
            let key = step.uuid.clone().unwrap_or_else(|| step.id.clone());
            if let Some(library_id) = common_inputs.get(label) {
                inputs.insert(key.clone(), DatasetRef::library_dataset(library_id.clone()));
            }
            if label == SAMPLE_INPUT_LABEL {
                inputs.insert(key, sample.clone());
                sample_bound = true;
            }
        }
        if !sample_bound {
            debug!("workflow has no {} step; sample dataset left unbound", SAMPLE_INPUT_LABEL);
        }
        inputs
    }

    /// Turn label-keyed parameters into step-id-keyed parameters.
    ///
    /// Sub-workflow steps fetch the nested workflow by the step's name and key
    /// each value as `"<sub_step_id>|<param>"`. Only the first parameter given
    /// for each nested step is used.
    pub async fn bind_params(
        &self,
        api: &dyn GalaxyApi,
        workflow_params: &IndexMap<String, StepParams>,
    ) -> Result<IndexMap<String, StepParams>> {
        let mut params = IndexMap::new();
        for (step_label, step_params) in workflow_params {
            let step = self.step(step_label).ok_or_else(|| GalaxyError::UnknownStepLabel {
                label: step_label.clone(),
            })?;

            let bound = if step.is_subworkflow() {
                bind_subworkflow_params(api, step, step_label, step_params).await?
            } else {
                step_params.clone()
            };
            params.insert(step.id.clone(), bound);
        }
        Ok(params)
    }

    /// Build the full invocation payload.
    pub async fn bind(
        &self,
        api: &dyn GalaxyApi,
        common_inputs: &IndexMap<String, String>,
        sample: &DatasetRef,
        workflow_params: &IndexMap<String, StepParams>,
        replacement_params: &IndexMap<String, JsonValue>,
    ) -> Result<InvocationPayload> {
        let inputs = self.bind_inputs(common_inputs, sample);
        let params = self.bind_params(api, workflow_params).await?;
        for (key, value) in replacement_params {
            info!("Collecting replacement params: {} {}", key, value);
        }
        Ok(InvocationPayload {
            inputs,
            params,
            replacement_params: replacement_params.clone(),
        })
    }
}

async fn bind_subworkflow_params(
    api: &dyn GalaxyApi,
    step: &WorkflowStep,
    step_label: &str,
    step_params: &StepParams,
) -> Result<StepParams> {
    let sub_name = step.name.as_deref().unwrap_or_default();
    let sub_workflow = get_workflow_description(api, sub_name).await?;

    let mut bound = StepParams::new();
    for (sub_label, sub_params) in step_params {
        let sub_step = sub_workflow
            .description
            .steps
            .values()
            .find(|candidate| candidate.label.as_deref() == Some(sub_label.as_str()))
            .ok_or_else(|| GalaxyError::SubStepNotFound {
                workflow: sub_name.to_string(),
                label: sub_label.clone(),
            })?;

        let (param_key, param_value) = sub_params
            .as_object()
            .and_then(|map| map.iter().next())
            .ok_or_else(|| GalaxyError::InvalidSubStepParams {
                step: step_label.to_string(),
                label: sub_label.clone(),
            })?;
        bound.insert(format!("{}|{}", sub_step.id, param_key), param_value.clone());
    }
    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::InMemoryGalaxy;
    use glxy_types::DatasetSource;
    use serde_json::json;

    fn workflow(steps: JsonValue) -> WorkflowDescription {
        serde_json::from_value(json!({"uuid": "wf-uuid", "steps": steps})).unwrap()
    }

    fn params(value: JsonValue) -> IndexMap<String, StepParams> {
        serde_json::from_value(value).unwrap()
    }

    fn sample() -> DatasetRef {
        DatasetRef::new("hdca9", DatasetSource::Hdca)
    }

    #[test]
    fn inputs_bind_sample_and_common_datasets() {
        let description = workflow(json!({
            "0": {"id": 0, "uuid": "uA", "label": "INPUT"},
            "1": {"id": 1, "uuid": "uB", "label": "REF"},
            "2": {"id": 2, "uuid": "uC", "label": "align"}
        }));
        let binder = WorkflowBinder::new(&description);
        let common = IndexMap::from([("REF".to_string(), "42".to_string())]);

        let inputs = binder.bind_inputs(&common, &sample());

        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs["uB"], DatasetRef::library_dataset("42"));
        assert_eq!(inputs["uA"], sample());
    }

    #[test]
    fn workflow_without_input_step_ignores_sample() {
        let description = workflow(json!({"0": {"id": 0, "uuid": "uB", "label": "REF"}}));
        let binder = WorkflowBinder::new(&description);
        let inputs = binder.bind_inputs(&IndexMap::new(), &sample());
        assert!(inputs.is_empty());
    }

    #[test]
    fn duplicate_labels_keep_the_last_step() {
        let description = workflow(json!({
            "0": {"id": 0, "uuid": "u0", "label": "trim"},
            "1": {"id": 1, "uuid": "u1", "label": "trim"},
            "2": {"id": 2, "uuid": "u2"}
        }));
        let binder = WorkflowBinder::new(&description);
        assert_eq!(binder.step("trim").unwrap().id, "1");
    }

    #[tokio::test]
    async fn plain_step_params_are_copied() {
        let galaxy = InMemoryGalaxy::new();
        let description = workflow(json!({"3": {"id": 3, "uuid": "u3", "label": "trim", "type": "tool"}}));
        let binder = WorkflowBinder::new(&description);

        let bound = binder
            .bind_params(&galaxy, &params(json!({"trim": {"quality": 20, "adapter": "AGATC"}})))
            .await
            .unwrap();

        assert_eq!(json!(bound), json!({"3": {"quality": 20, "adapter": "AGATC"}}));
        assert_eq!(galaxy.call_count("workflows_by_name"), 0);
    }

    #[tokio::test]
    async fn subworkflow_params_are_keyed_by_nested_step_id() {
        let galaxy = InMemoryGalaxy::new();
        galaxy.add_workflow(
            "variant calling",
            workflow(json!({"7": {"id": 7, "uuid": "u7", "label": "x"}})),
        );
        let description = workflow(json!({
            "4": {"id": 4, "uuid": "u4", "label": "SUB", "name": "variant calling", "type": "subworkflow"}
        }));
        let binder = WorkflowBinder::new(&description);

        let bound = binder
            .bind_params(&galaxy, &params(json!({"SUB": {"x": {"threshold": 5, "ignored": 1}}})))
            .await
            .unwrap();

        assert_eq!(json!(bound), json!({"4": {"7|threshold": 5}}));
    }

    #[tokio::test]
    async fn unknown_labels_fail() {
        let galaxy = InMemoryGalaxy::new();
        let description = workflow(json!({"0": {"id": 0, "uuid": "u0", "label": "trim"}}));
        let binder = WorkflowBinder::new(&description);

        let err = binder
            .bind_params(&galaxy, &params(json!({"align": {"k": 1}})))
            .await
            .unwrap_err();
        assert!(matches!(err, GalaxyError::UnknownStepLabel { ref label } if label == "align"));
    }

    #[tokio::test]
    async fn subworkflow_errors_name_the_step() {
        let galaxy = InMemoryGalaxy::new();
        galaxy.add_workflow("nested", workflow(json!({"7": {"id": 7, "label": "x"}})));
        let description = workflow(json!({
            "4": {"id": 4, "label": "SUB", "name": "nested", "type": "subworkflow"}
        }));
        let binder = WorkflowBinder::new(&description);

        let err = binder
            .bind_params(&galaxy, &params(json!({"SUB": {"y": {"t": 1}}})))
            .await
            .unwrap_err();
        assert!(matches!(err, GalaxyError::SubStepNotFound { ref label, .. } if label == "y"));

        let err = binder
            .bind_params(&galaxy, &params(json!({"SUB": {"x": {}}})))
            .await
            .unwrap_err();
        assert!(matches!(err, GalaxyError::InvalidSubStepParams { .. }));

        let err = binder
            .bind_params(&galaxy, &params(json!({"SUB": {"x": 3}})))
            .await
            .unwrap_err();
        assert!(matches!(err, GalaxyError::InvalidSubStepParams { .. }));
    }

    #[tokio::test]
    async fn bind_carries_replacement_params() {
        let galaxy = InMemoryGalaxy::new();
        let description = workflow(json!({"0": {"id": 0, "uuid": "u0", "label": "INPUT"}}));
        let binder = WorkflowBinder::new(&description);
        let replacements = IndexMap::from([("sample".to_string(), json!("S1"))]);

        let payload = binder
            .bind(&galaxy, &IndexMap::new(), &sample(), &IndexMap::new(), &replacements)
            .await
            .unwrap();

        assert_eq!(payload.inputs["u0"], sample());
        assert!(payload.params.is_empty());
        assert_eq!(payload.replacement_params, replacements);
    }
}
