use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, anyhow, bail};
use async_trait::async_trait;
use futures_util::StreamExt;
use glxy_api::GalaxyClient;
use glxy_types::{
    CollectionRequest, History, HistoryContent, InvocationRequest, Library, LibraryEntry, WorkflowDescription, WorkflowSummary,
};
use glxy_util::http::execute_http_json_request;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::{GalaxyApi, ServerUpload};

/// Dataset states after which waiting is pointless.
const FAILED_DATASET_STATES: &[&str] = &["error", "failed_metadata", "discarded"];

/// Where a dataset stands while waiting for it to finish.
#[derive(Debug, PartialEq, Eq)]
enum DatasetProgress {
    Ready,
    Failed(String),
    Pending(String),
}

fn dataset_progress(dataset: &Value) -> DatasetProgress {
    let state = dataset.get("state").and_then(Value::as_str).unwrap_or_default();
    if state == "ok" {
        DatasetProgress::Ready
    } else if FAILED_DATASET_STATES.contains(&state) {
        DatasetProgress::Failed(state.to_string())
    } else {
        DatasetProgress::Pending(state.to_string())
    }
}

/// Server-side name filter for listings that support `q`/`qv`.
fn name_filter(name: &str) -> [(&'static str, String); 2] {
    [("q", "name".to_string()), ("qv", name.to_string())]
}

fn root_folder_of(library: Library) -> anyhow::Result<String> {
    library
        .root_folder_id
        .ok_or_else(|| anyhow!("library {} reports no root folder", library.id))
}

fn folder_request(folder_id: &str, folder_name: &str) -> Value {
    json!({
        "create_type": "folder",
        "folder_id": folder_id,
        "name": folder_name,
    })
}

fn upload_request(upload: &ServerUpload<'_>) -> Value {
    let link_data_only = if upload.link_only { "link_to_files" } else { "copy_files" };
    json!({
        "create_type": "file",
        "folder_id": upload.folder_id,
        "upload_option": "upload_paths",
        "filesystem_paths": upload.local_path.to_string_lossy(),
        "link_data_only": link_data_only,
        "file_type": upload.file_type,
        "dbkey": "?",
    })
}

fn copy_to_history_request(dataset_id: &str) -> Value {
    json!({
        "source": "library",
        "content": dataset_id,
        "from_ld_id": dataset_id,
    })
}

fn collection_request(request: &CollectionRequest) -> anyhow::Result<Value> {
    let mut body = serde_json::to_value(request)?;
    if let Value::Object(map) = &mut body {
        map.insert("type".into(), Value::String("dataset_collection".into()));
    }
    Ok(body)
}

/// [`GalaxyApi`] over the Galaxy REST API.
#[derive(Debug, Clone)]
pub struct HttpGalaxyApi {
    client: GalaxyClient,
    poll_interval: Duration,
    max_wait: Duration,
}

impl HttpGalaxyApi {
    pub fn new(client: GalaxyClient) -> Self {
        Self {
            client,
            poll_interval: Duration::from_secs(3),
            max_wait: Duration::from_secs(12_000),
        }
    }

    /// Build a client for `base_url` authenticated with `api_key`.
    pub fn connect(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        Ok(Self::new(GalaxyClient::new(base_url, api_key)?))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> anyhow::Result<T> {
        let payload = execute_http_json_request(&self.client, Method::GET, path, query, None).await?;
        serde_json::from_value(payload).with_context(|| format!("decode response of GET {path}"))
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> anyhow::Result<T> {
        let payload = execute_http_json_request(&self.client, Method::POST, path, &[], Some(body)).await?;
        serde_json::from_value(payload).with_context(|| format!("decode response of POST {path}"))
    }

    async fn root_folder_id(&self, library_id: &str) -> anyhow::Result<String> {
        let library: Library = self.get_json(&format!("/api/libraries/{library_id}"), &[]).await?;
        root_folder_of(library)
    }

    async fn wait_for_dataset(&self, dataset_id: &str) -> anyhow::Result<Value> {
        let started = Instant::now();
        loop {
            let dataset: Value = self.get_json(&format!("/api/datasets/{dataset_id}"), &[]).await?;
            let state = match dataset_progress(&dataset) {
                DatasetProgress::Ready => return Ok(dataset),
                DatasetProgress::Failed(state) => bail!("dataset {dataset_id} is in state '{state}'"),
                DatasetProgress::Pending(state) => state,
            };
            if started.elapsed() >= self.max_wait {
                bail!("dataset {dataset_id} not ready after {}s (state '{state}')", self.max_wait.as_secs());
            }
            debug!(dataset_id, state = %state, "waiting for dataset");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl GalaxyApi for HttpGalaxyApi {
    async fn list_libraries(&self, name: &str) -> anyhow::Result<Vec<Library>> {
        let libraries: Vec<Library> = self.get_json("/api/libraries", &[]).await?;
        Ok(libraries.into_iter().filter(|library| library.name == name).collect())
    }

    async fn create_library(&self, name: &str) -> anyhow::Result<Library> {
        self.post_json("/api/libraries", &json!({ "name": name })).await
    }

    async fn list_folders(&self, library_id: &str, name: &str) -> anyhow::Result<Vec<LibraryEntry>> {
        let contents = self.library_contents(library_id).await?;
        Ok(contents
            .into_iter()
            .filter(|entry| entry.is_folder() && entry.name == name)
            .collect())
    }

    async fn create_folder(
        &self,
        library_id: &str,
        folder_name: &str,
        parent_folder_id: Option<&str>,
    ) -> anyhow::Result<Vec<LibraryEntry>> {
        let folder_id = match parent_folder_id {
            Some(parent) => parent.to_string(),
            None => self.root_folder_id(library_id).await?,
        };
        self.post_json(
            &format!("/api/libraries/{library_id}/contents"),
            &folder_request(&folder_id, folder_name),
        )
        .await
    }

    async fn library_contents(&self, library_id: &str) -> anyhow::Result<Vec<LibraryEntry>> {
        self.get_json(&format!("/api/libraries/{library_id}/contents"), &[]).await
    }

    async fn upload_from_server_filesystem(&self, upload: ServerUpload<'_>) -> anyhow::Result<Vec<LibraryEntry>> {
        self.post_json(&format!("/api/libraries/{}/contents", upload.library_id), &upload_request(&upload))
            .await
    }

    async fn list_histories(&self, name: &str) -> anyhow::Result<Vec<History>> {
        let histories: Vec<History> = self.get_json("/api/histories", &name_filter(name)).await?;
        Ok(histories.into_iter().filter(|history| history.name == name).collect())
    }

    async fn create_history(&self, name: &str) -> anyhow::Result<History> {
        self.post_json("/api/histories", &json!({ "name": name })).await
    }

    async fn history_contents(&self, history_id: &str) -> anyhow::Result<Vec<HistoryContent>> {
        self.get_json(&format!("/api/histories/{history_id}/contents"), &[]).await
    }

    async fn copy_library_dataset_to_history(&self, history_id: &str, dataset_id: &str) -> anyhow::Result<HistoryContent> {
        self.post_json(
            &format!("/api/histories/{history_id}/contents"),
            &copy_to_history_request(dataset_id),
        )
        .await
    }

    async fn create_history_collection(&self, history_id: &str, request: &CollectionRequest) -> anyhow::Result<HistoryContent> {
        self.post_json(&format!("/api/histories/{history_id}/contents"), &collection_request(request)?)
            .await
    }

    async fn workflows_by_name(&self, name: &str) -> anyhow::Result<Vec<WorkflowSummary>> {
        let workflows: Vec<WorkflowSummary> = self.get_json("/api/workflows", &[]).await?;
        Ok(workflows.into_iter().filter(|workflow| workflow.name == name).collect())
    }

    async fn export_workflow(&self, workflow_id: &str) -> anyhow::Result<WorkflowDescription> {
        self.get_json(&format!("/api/workflows/{workflow_id}/download"), &[]).await
    }

    async fn invoke_workflow(&self, workflow_id: &str, request: &InvocationRequest) -> anyhow::Result<Value> {
        let body = serde_json::to_value(request)?;
        execute_http_json_request(
            &self.client,
            Method::POST,
            &format!("/api/workflows/{workflow_id}/invocations"),
            &[],
            Some(&body),
        )
        .await
    }

    async fn download_dataset(&self, dataset_id: &str, destination: &Path, wait_for_completion: bool) -> anyhow::Result<()> {
        let dataset = if wait_for_completion {
            self.wait_for_dataset(dataset_id).await?
        } else {
            self.get_json(&format!("/api/datasets/{dataset_id}"), &[]).await?
        };
        let extension = dataset
            .get("file_ext")
            .or_else(|| dataset.get("extension"))
            .and_then(Value::as_str)
            .unwrap_or("data")
            .to_string();

        let path = format!("/api/datasets/{dataset_id}/display");
        let response = self
            .client
            .request(Method::GET, &path)
            .query(&[("to_ext", extension.as_str())])
            .send()
            .await
            .with_context(|| format!("GET {path}"))?
            .error_for_status()
            .with_context(|| format!("GET {path}"))?;

        let mut file = tokio::fs::File::create(destination)
            .await
            .with_context(|| format!("create {}", destination.display()))?;
        let mut stream = response.bytes_stream();
        let mut written = 0usize;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.with_context(|| format!("read body of {path}"))?;
            written += chunk.len();
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        info!(dataset_id, bytes = written, destination = %destination.display(), "downloaded dataset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glxy_types::{DatasetSource, HistoryElement};

    fn upload(link_only: bool) -> ServerUpload<'static> {
        ServerUpload {
            library_id: "lib1",
            folder_id: "F2",
            local_path: Path::new("/data/s1 R1.fq"),
            link_only,
            file_type: "fastqsanger",
        }
    }

    #[test]
    fn upload_request_links_or_copies() {
        let linked = upload_request(&upload(true));
        assert_eq!(linked["link_data_only"], "link_to_files");
        assert_eq!(linked["create_type"], "file");
        assert_eq!(linked["upload_option"], "upload_paths");
        assert_eq!(linked["folder_id"], "F2");
        assert_eq!(linked["filesystem_paths"], "/data/s1 R1.fq");
        assert_eq!(linked["file_type"], "fastqsanger");
        assert_eq!(linked["dbkey"], "?");

        assert_eq!(upload_request(&upload(false))["link_data_only"], "copy_files");
    }

    #[test]
    fn folder_request_targets_the_given_folder() {
        assert_eq!(
            folder_request("F1", "bar"),
            json!({"create_type": "folder", "folder_id": "F1", "name": "bar"})
        );
    }

    #[test]
    fn root_folder_is_decoded_from_library_show() {
        let library: Library = serde_json::from_value(json!({
            "id": "lib1",
            "name": "refs",
            "deleted": false,
            "root_folder_id": "Fabc",
            "description": ""
        }))
        .unwrap();
        assert_eq!(root_folder_of(library).unwrap(), "Fabc");

        let bare: Library = serde_json::from_value(json!({"id": "lib2", "name": "refs"})).unwrap();
        let err = root_folder_of(bare).unwrap_err();
        assert!(err.to_string().contains("lib2"), "{err}");
    }

    #[test]
    fn copy_to_history_uses_library_source() {
        assert_eq!(
            copy_to_history_request("ld7"),
            json!({"source": "library", "content": "ld7", "from_ld_id": "ld7"})
        );
    }

    #[test]
    fn collection_request_is_tagged_as_dataset_collection() {
        let request = CollectionRequest::list(
            "s1",
            vec![HistoryElement {
                id: "h1".into(),
                src: DatasetSource::Hda,
                name: "r1".into(),
            }],
        );
        let body = collection_request(&request).unwrap();
        assert_eq!(body["type"], "dataset_collection");
        assert_eq!(body["collection_type"], "list");
        assert_eq!(body["name"], "s1");
        assert_eq!(body["element_identifiers"][0]["src"], "hda");
    }

    #[test]
    fn dataset_states_classify_for_waiting() {
        assert_eq!(dataset_progress(&json!({"state": "ok"})), DatasetProgress::Ready);
        for state in ["error", "failed_metadata", "discarded"] {
            assert_eq!(
                dataset_progress(&json!({"state": state})),
                DatasetProgress::Failed(state.to_string())
            );
        }
        assert_eq!(
            dataset_progress(&json!({"state": "running"})),
            DatasetProgress::Pending("running".into())
        );
        assert_eq!(dataset_progress(&json!({})), DatasetProgress::Pending(String::new()));
    }

    #[test]
    fn history_listing_filters_by_name_on_the_server() {
        let query = name_filter("align s1 abc");
        assert_eq!(query[0], ("q", "name".to_string()));
        assert_eq!(query[1], ("qv", "align s1 abc".to_string()));
    }
}
