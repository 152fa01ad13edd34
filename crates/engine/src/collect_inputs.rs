//! End-to-end `collect_inputs` run: upload a sample, bind it to a workflow and invoke it.

use std::path::Path;

use glxy_api::{API_KEY_ENV, discover_api_key};
use glxy_types::InvocationRequest;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::info;

use crate::binder::WorkflowBinder;
use crate::config::{InputsConfig, load_raw_inputs_config};
use crate::error::{GalaxyError, Result};
use crate::history::{create_dataset_or_collection, get_or_create_history, history_name, random_suffix};
use crate::library_fs::get_path;
use crate::remote::{GalaxyApi, HttpGalaxyApi};
use crate::upload::upload_dataset;
use crate::workflows::get_workflow_description;

/// Load `config_path`, connect to the configured Galaxy and run [`collect_inputs`].
///
/// The API key comes from `GALAXY_API_KEY` in the environment or the nearest `.env` file.
pub async fn collect_inputs_from_file(config_path: &Path) -> Result<Value> {
    let (config, api_key) = prepare_run(config_path, discover_api_key())?;
    let api = HttpGalaxyApi::connect(&config.galaxy_url, &api_key)?;
    collect_inputs(&api, &config).await
}

/// Load the config and check the credential before validating required keys.
fn prepare_run(config_path: &Path, api_key: Option<String>) -> Result<(InputsConfig, String)> {
    let raw = load_raw_inputs_config(config_path)?;
    let api_key = api_key.ok_or_else(|| GalaxyError::MissingCredential {
        variable: API_KEY_ENV.to_string(),
    })?;
    Ok((raw.validate()?, api_key))
}

/// Upload the sample, populate a fresh history and invoke the workflow.
///
/// Returns Galaxy's invocation response.
pub async fn collect_inputs(api: &dyn GalaxyApi, config: &InputsConfig) -> Result<Value> {
    info!("Getting workflow description from Galaxy");
    let workflow = get_workflow_description(api, &config.workflow).await?;

    let sample = &config.sample;
    let history_name = history_name(&config.workflow, &sample.name, &random_suffix());
    info!("Creating history: {}", history_name);
    let history = get_or_create_history(api, &history_name).await?;

    info!("Uploading sample data");
    let mut library_dataset_ids = Vec::with_capacity(sample.files.len());
    for file in &sample.files {
        library_dataset_ids.push(upload_dataset(api, file, &sample.filetype, &config.library_folder).await?);
    }

    info!("Populating sample data in history");
    let sample_payload = create_dataset_or_collection(api, &sample.name, &history.id, &library_dataset_ids).await?;
    info!("Sample data: {} ({:?})", sample_payload.id, sample_payload.src);

    info!("Preparing to invoke workflow");
    let common_inputs = resolve_common_inputs(api, &config.common_inputs).await?;

    let binder = WorkflowBinder::new(&workflow.description);
    let payload = binder
        .bind(
            api,
            &common_inputs,
            &sample_payload,
            &config.workflow_params,
            &config.replacement_params,
        )
        .await?;

    info!("Invoking workflow");
    info!("Workflow params: {}", serde_json::to_string(&payload.params).unwrap_or_default());
    info!("Inputs: {}", serde_json::to_string(&payload.inputs).unwrap_or_default());
    let request = InvocationRequest::new(payload, &history.id, false);
    Ok(api.invoke_workflow(workflow.invocation_id(), &request).await?)
}

/// Resolve each common input's library path to a dataset id.
async fn resolve_common_inputs(api: &dyn GalaxyApi, common_inputs: &IndexMap<String, String>) -> Result<IndexMap<String, String>> {
    let mut resolved = IndexMap::with_capacity(common_inputs.len());
    for (label, path) in common_inputs {
        info!("Collecting common inputs from Galaxy: \"{}\" \"{}\"", label, path);
        let entity = get_path(api, path).await?.ok_or_else(|| GalaxyError::MissingCommonInput {
            label: label.clone(),
            path: path.clone(),
        })?;
        resolved.insert(label.clone(), entity.id().to_string());
    }
    Ok(resolved)
}
