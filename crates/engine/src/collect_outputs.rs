//! Copy a finished run's history back to a project directory.
//!
//! Results land in `<proj_dir>/<patient>/<workflow>/<YYYYMMDD>_<history_name>`
//! next to a `galaxy_history_metadata.json` snapshot of the history contents.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use glxy_api::{API_KEY_ENV, read_api_key_file};
use glxy_types::HistoryContent;
use glxy_util::underscore_spaces;
use tracing::{info, warn};

use crate::error::{GalaxyError, Result};
use crate::history::find_history;
use crate::remote::GalaxyApi;

/// Workflows whose outputs this tool knows how to lay out.
pub const KNOWN_WORKFLOWS: &[&str] = &[
    "cancer_exome",
    "tatlow_piccolo_kallisto",
    "cnvkit",
    "star_fusion",
    "truseq_rna_exome",
];

pub const DEFAULT_GALAXY_URL: &str = "https://galaxy.ohsu.edu/galaxy/";

/// Key file location relative to the home directory.
pub const DEFAULT_API_KEY_FILE: &str = ".galaxy/api_key";

pub const METADATA_FILE_NAME: &str = "galaxy_history_metadata.json";

/// What to collect and where to put it.
#[derive(Debug, Clone)]
pub struct OutputRequest {
    pub proj_dir: PathBuf,
    pub patient: String,
    pub workflow: String,
    pub history_name: String,
}

/// Result of a collection run.
#[derive(Debug, Clone, Default)]
pub struct CollectedOutputs {
    pub directory: PathBuf,
    pub downloaded: Vec<PathBuf>,
}

/// API key from the first line of `key_file`, falling back to `GALAXY_API_KEY`.
pub fn resolve_output_api_key(key_file: &Path) -> Result<String> {
    match read_api_key_file(key_file) {
        Ok(key) => Ok(key),
        Err(error) => {
            warn!("{error:#}; trying {}", API_KEY_ENV);
            env::var(API_KEY_ENV)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| GalaxyError::MissingCredential {
                    variable: API_KEY_ENV.to_string(),
                })
        }
    }
}

pub fn validate_workflow_name(name: &str) -> Result<()> {
    if KNOWN_WORKFLOWS.contains(&name) {
        Ok(())
    } else {
        Err(GalaxyError::UnknownWorkflow {
            name: name.to_string(),
            allowed: KNOWN_WORKFLOWS.join(", "),
        })
    }
}

/// `<proj_dir>/<patient>/<workflow>/<YYYYMMDD>_<history name with spaces as underscores>`.
///
/// `create_time` is an ISO timestamp such as `2018-03-02T17:21:05.123456`.
pub fn output_directory(request: &OutputRequest, history_name: &str, create_time: &str) -> Result<PathBuf> {
    let date_part = create_time.split('T').next().unwrap_or_default();
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|error| {
        GalaxyError::history_lookup(history_name, format!("unreadable create_time '{create_time}': {error}"))
    })?;
    let leaf = format!("{}_{}", date.format("%Y%m%d"), underscore_spaces(history_name));
    Ok(request
        .proj_dir
        .join(&request.patient)
        .join(&request.workflow)
        .join(leaf))
}

/// Download every finished dataset of the named history into the project directory.
pub async fn collect_outputs(api: &dyn GalaxyApi, request: &OutputRequest) -> Result<CollectedOutputs> {
    validate_workflow_name(&request.workflow)?;

    let history = find_history(api, &request.history_name)
        .await?
        .ok_or_else(|| GalaxyError::history_lookup(&request.history_name, "no history with that name"))?;
    let contents = api.history_contents(&history.id).await?;
    let first = contents
        .first()
        .ok_or_else(|| GalaxyError::history_lookup(&history.name, "history is empty"))?;
    info!("History found");

    let create_time = first.create_time.as_deref().unwrap_or_default();
    let directory = output_directory(request, &history.name, create_time)?;
    info!("Creating directory {}", directory.display());
    tokio::fs::create_dir_all(&directory)
        .await
        .with_context(|| format!("create {}", directory.display()))?;

    let metadata = serde_json::to_vec(&contents).context("serialize history contents")?;
    let metadata_path = directory.join(METADATA_FILE_NAME);
    tokio::fs::write(&metadata_path, metadata)
        .await
        .with_context(|| format!("write {}", metadata_path.display()))?;

    let mut downloaded = Vec::new();
    for content in contents.iter().filter(|content| content.is_ready_file()) {
        downloaded.push(download_content(api, content, &directory).await?);
    }

    Ok(CollectedOutputs { directory, downloaded })
}

async fn download_content(api: &dyn GalaxyApi, content: &HistoryContent, directory: &Path) -> Result<PathBuf> {
    info!("Downloading data from step named {}", content.name);
    let destination = directory.join(underscore_spaces(&content.name));
    api.download_dataset(&content.id, &destination, true).await?;
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::InMemoryGalaxy;

    fn request(proj_dir: &Path, workflow: &str) -> OutputRequest {
        OutputRequest {
            proj_dir: proj_dir.to_path_buf(),
            patient: "P1".into(),
            workflow: workflow.into(),
            history_name: "cancer_exome P1 x7k2ab01".into(),
        }
    }

    fn content(id: &str, name: &str, kind: &str, state: &str) -> HistoryContent {
        HistoryContent {
            id: id.into(),
            name: name.into(),
            kind: Some(kind.into()),
            state: Some(state.into()),
            create_time: Some("2018-03-02T17:21:05.123456".into()),
            ..HistoryContent::default()
        }
    }

    #[test]
    fn unknown_workflow_is_rejected() {
        assert!(validate_workflow_name("cnvkit").is_ok());
        let err = validate_workflow_name("bwa").unwrap_err();
        assert!(err.to_string().starts_with("bwa is not a valid workflow"));
    }

    #[test]
    fn directory_uses_history_date_and_name() {
        let req = request(Path::new("/proj"), "cancer_exome");
        let dir = output_directory(&req, "cancer exome P1 run", "2018-03-02T17:21:05").unwrap();
        assert_eq!(dir, PathBuf::from("/proj/P1/cancer_exome/20180302_cancer_exome_P1_run"));

        let err = output_directory(&req, "h", "yesterday").unwrap_err();
        assert!(matches!(err, GalaxyError::HistoryLookupFailure { .. }));
    }

    #[tokio::test]
    async fn downloads_only_finished_files() {
        let galaxy = InMemoryGalaxy::new();
        let history = galaxy.add_history("cancer_exome P1 x7k2ab01");
        galaxy.add_history_content(&history, content("d1", "tumor calls.vcf", "file", "ok"));
        galaxy.add_history_content(&history, content("d2", "pending.bam", "file", "running"));
        galaxy.add_history_content(&history, content("c1", "reads", "collection", "ok"));
        let proj = tempfile::tempdir().unwrap();

        let collected = collect_outputs(&galaxy, &request(proj.path(), "cancer_exome")).await.unwrap();

        let expected_dir = proj.path().join("P1/cancer_exome/20180302_cancer_exome_P1_x7k2ab01");
        assert_eq!(collected.directory, expected_dir);
        assert_eq!(collected.downloaded, vec![expected_dir.join("tumor_calls.vcf")]);
        assert_eq!(galaxy.call_count("download_dataset"), 1);

        let metadata: serde_json::Value =
            serde_json::from_slice(&std::fs::read(expected_dir.join(METADATA_FILE_NAME)).unwrap()).unwrap();
        assert_eq!(metadata.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn unknown_workflow_makes_no_remote_calls() {
        let galaxy = InMemoryGalaxy::new();
        let proj = tempfile::tempdir().unwrap();
        let err = collect_outputs(&galaxy, &request(proj.path(), "bwa")).await.unwrap_err();
        assert!(matches!(err, GalaxyError::UnknownWorkflow { .. }));
        assert_eq!(galaxy.call_count("list_histories"), 0);
    }

    #[tokio::test]
    async fn missing_or_empty_history_fails() {
        let galaxy = InMemoryGalaxy::new();
        let proj = tempfile::tempdir().unwrap();
        let err = collect_outputs(&galaxy, &request(proj.path(), "cnvkit")).await.unwrap_err();
        assert!(matches!(err, GalaxyError::HistoryLookupFailure { .. }));

        galaxy.add_history("cancer_exome P1 x7k2ab01");
        let err = collect_outputs(&galaxy, &request(proj.path(), "cnvkit")).await.unwrap_err();
        assert!(matches!(err, GalaxyError::HistoryLookupFailure { ref reason, .. } if reason == "history is empty"));
    }

    #[test]
    fn api_key_prefers_file_then_environment() {
        let dir = tempfile::tempdir().unwrap();
        let key_file = dir.path().join("api_key");
        std::fs::write(&key_file, "file-key\nignored\n").unwrap();

        temp_env::with_var(API_KEY_ENV, Some("env-key"), || {
            assert_eq!(resolve_output_api_key(&key_file).unwrap(), "file-key");
            assert_eq!(resolve_output_api_key(&dir.path().join("absent")).unwrap(), "env-key");
        });
        temp_env::with_var(API_KEY_ENV, None::<&str>, || {
            let err = resolve_output_api_key(&dir.path().join("absent")).unwrap_err();
            assert!(matches!(err, GalaxyError::MissingCredential { .. }));
        });
    }
}
