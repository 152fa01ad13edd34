use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use glxy_types::{
    CollectionRequest, History, HistoryContent, InvocationRequest, Library, LibraryEntry, WorkflowDescription, WorkflowSummary,
};
use serde_json::{Value, json};

use super::{GalaxyApi, ServerUpload};

/// In-process Galaxy stand-in that keeps libraries, histories and workflows in memory.
///
/// Every trait call is recorded by method name so callers can assert which
/// remote operations a code path issued (for example, that an upload was
/// skipped).
#[derive(Debug, Default)]
pub struct InMemoryGalaxy {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    libraries: Vec<Library>,
    contents: HashMap<String, Vec<LibraryEntry>>,
    /// Library dataset id to file extension.
    dataset_extensions: HashMap<String, String>,
    histories: Vec<History>,
    history_contents: HashMap<String, Vec<HistoryContent>>,
    workflows: Vec<(WorkflowSummary, WorkflowDescription)>,
    invocations: Vec<(String, InvocationRequest)>,
    calls: Vec<String>,
}

impl State {
    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }
}

impl InMemoryGalaxy {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("in-memory galaxy lock poisoned")
    }

    /// Add a library with its root folder entry and return its id. Duplicate names are allowed.
    pub fn add_library(&self, name: &str, deleted: bool) -> String {
        let mut state = self.state();
        let id = state.fresh_id("lib");
        let root = state.fresh_id("F");
        state.libraries.push(Library {
            id: id.clone(),
            name: name.to_string(),
            deleted,
            root_folder_id: Some(root.clone()),
        });
        // Galaxy lists the root folder itself as `/`.
        state.contents.entry(id.clone()).or_default().push(LibraryEntry {
            id: root,
            name: "/".into(),
            kind: Some("folder".into()),
        });
        id
    }

    /// Add a folder entry with a full path such as `/bar/baz`, without checking parents.
    pub fn add_folder(&self, library_id: &str, full_path: &str) -> String {
        let mut state = self.state();
        let id = state.fresh_id("F");
        state.contents.entry(library_id.to_string()).or_default().push(LibraryEntry {
            id: id.clone(),
            name: full_path.to_string(),
            kind: Some("folder".into()),
        });
        id
    }

    /// Add a dataset entry with a full path such as `/bar/reads.fq`.
    pub fn add_dataset(&self, library_id: &str, full_path: &str, extension: &str) -> String {
        let mut state = self.state();
        let id = state.fresh_id("ld");
        state.contents.entry(library_id.to_string()).or_default().push(LibraryEntry {
            id: id.clone(),
            name: full_path.to_string(),
            kind: Some("file".into()),
        });
        state.dataset_extensions.insert(id.clone(), extension.to_string());
        id
    }

    /// Register a workflow and return its id.
    pub fn add_workflow(&self, name: &str, description: WorkflowDescription) -> String {
        let mut state = self.state();
        let id = state.fresh_id("wf");
        state.workflows.push((
            WorkflowSummary {
                id: id.clone(),
                name: name.to_string(),
            },
            description,
        ));
        id
    }

    pub fn add_history(&self, name: &str) -> String {
        let mut state = self.state();
        let id = state.fresh_id("hist");
        state.histories.push(History {
            id: id.clone(),
            name: name.to_string(),
        });
        state.history_contents.entry(id.clone()).or_default();
        id
    }

    pub fn add_history_content(&self, history_id: &str, content: HistoryContent) {
        self.state()
            .history_contents
            .entry(history_id.to_string())
            .or_default()
            .push(content);
    }

    pub fn libraries(&self) -> Vec<Library> {
        self.state().libraries.clone()
    }

    pub fn histories(&self) -> Vec<History> {
        self.state().histories.clone()
    }

    /// Snapshot of a library's flat contents.
    pub fn contents(&self, library_id: &str) -> Vec<LibraryEntry> {
        self.state().contents.get(library_id).cloned().unwrap_or_default()
    }

    pub fn history_items(&self, history_id: &str) -> Vec<HistoryContent> {
        self.state().history_contents.get(history_id).cloned().unwrap_or_default()
    }

    pub fn invocations(&self) -> Vec<(String, InvocationRequest)> {
        self.state().invocations.clone()
    }

    /// Number of recorded calls of one trait method.
    pub fn call_count(&self, method: &str) -> usize {
        self.state().calls.iter().filter(|call| call.as_str() == method).count()
    }

    fn record(&self, method: &str) {
        self.state().calls.push(method.to_string());
    }
}

#[async_trait]
impl GalaxyApi for InMemoryGalaxy {
    async fn list_libraries(&self, name: &str) -> anyhow::Result<Vec<Library>> {
        self.record("list_libraries");
        Ok(self.state().libraries.iter().filter(|l| l.name == name).cloned().collect())
    }

    async fn create_library(&self, name: &str) -> anyhow::Result<Library> {
        self.record("create_library");
        let id = self.add_library(name, false);
        self.state()
            .libraries
            .iter()
            .find(|library| library.id == id)
            .cloned()
            .ok_or_else(|| anyhow!("library {id} vanished"))
    }

    async fn list_folders(&self, library_id: &str, name: &str) -> anyhow::Result<Vec<LibraryEntry>> {
        self.record("list_folders");
        Ok(self
            .contents(library_id)
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
        self.record("create_folder");
        let full_path = match parent_folder_id {
            None => format!("/{folder_name}"),
            Some(parent_id) => {
                let parent = self
                    .contents(library_id)
                    .into_iter()
                    .find(|entry| entry.id == parent_id && entry.is_folder())
                    .ok_or_else(|| anyhow!("no folder {parent_id} in library {library_id}"))?;
                format!("{}/{folder_name}", parent.name.trim_end_matches('/'))
            }
        };
        let id = self.add_folder(library_id, &full_path);
        Ok(vec![LibraryEntry {
            id,
            name: folder_name.to_string(),
            kind: None,
        }])
    }

    async fn library_contents(&self, library_id: &str) -> anyhow::Result<Vec<LibraryEntry>> {
        self.record("library_contents");
        if !self.state().contents.contains_key(library_id) {
            bail!("no library {library_id}");
        }
        Ok(self.contents(library_id))
    }

    async fn upload_from_server_filesystem(&self, upload: ServerUpload<'_>) -> anyhow::Result<Vec<LibraryEntry>> {
        self.record("upload_from_server_filesystem");
        let file_name = upload
            .local_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("upload path has no file name"))?;
        let root = self
            .state()
            .libraries
            .iter()
            .find(|library| library.id == upload.library_id)
            .and_then(|library| library.root_folder_id.clone());
        let folder_path = if root.as_deref() == Some(upload.folder_id) {
            String::new()
        } else {
            self.contents(upload.library_id)
                .into_iter()
                .find(|entry| entry.id == upload.folder_id)
                .map(|entry| entry.name)
                .ok_or_else(|| anyhow!("no folder {} in library {}", upload.folder_id, upload.library_id))?
        };
        let full_path = format!("{folder_path}/{file_name}");
        let id = self.add_dataset(upload.library_id, &full_path, upload.file_type);
        Ok(vec![LibraryEntry {
            id,
            name: file_name,
            kind: Some("file".into()),
        }])
    }

    async fn list_histories(&self, name: &str) -> anyhow::Result<Vec<History>> {
        self.record("list_histories");
        Ok(self.state().histories.iter().filter(|h| h.name == name).cloned().collect())
    }

    async fn create_history(&self, name: &str) -> anyhow::Result<History> {
        self.record("create_history");
        let id = self.add_history(name);
        Ok(History {
            id,
            name: name.to_string(),
        })
    }

    async fn history_contents(&self, history_id: &str) -> anyhow::Result<Vec<HistoryContent>> {
        self.record("history_contents");
        self.state()
            .history_contents
            .get(history_id)
            .cloned()
            .ok_or_else(|| anyhow!("no history {history_id}"))
    }

    async fn copy_library_dataset_to_history(&self, history_id: &str, dataset_id: &str) -> anyhow::Result<HistoryContent> {
        self.record("copy_library_dataset_to_history");
        let (name, extension) = {
            let state = self.state();
            let entry = state
                .contents
                .values()
                .flatten()
                .find(|entry| entry.id == dataset_id && entry.is_dataset())
                .ok_or_else(|| anyhow!("no library dataset {dataset_id}"))?;
            let name = entry.name.rsplit('/').next().unwrap_or_default().to_string();
            (name, state.dataset_extensions.get(dataset_id).cloned())
        };
        let id = self.state().fresh_id("hda");
        let content = HistoryContent {
            id,
            name,
            kind: Some("file".into()),
            state: Some("ok".into()),
            extension,
            ..HistoryContent::default()
        };
        self.add_history_content(history_id, content.clone());
        Ok(content)
    }

    async fn create_history_collection(&self, history_id: &str, request: &CollectionRequest) -> anyhow::Result<HistoryContent> {
        self.record("create_history_collection");
        let id = self.state().fresh_id("hdca");
        let mut content = HistoryContent {
            id,
            name: request.name.clone(),
            kind: Some("collection".into()),
            ..HistoryContent::default()
        };
        content.extra.insert("collection_type".into(), json!(request.collection_type));
        content
            .extra
            .insert("element_count".into(), json!(request.element_identifiers.len()));
        self.add_history_content(history_id, content.clone());
        Ok(content)
    }

    async fn workflows_by_name(&self, name: &str) -> anyhow::Result<Vec<WorkflowSummary>> {
        self.record("workflows_by_name");
        Ok(self
            .state()
            .workflows
            .iter()
            .filter(|(summary, _)| summary.name == name)
            .map(|(summary, _)| summary.clone())
            .collect())
    }

    async fn export_workflow(&self, workflow_id: &str) -> anyhow::Result<WorkflowDescription> {
        self.record("export_workflow");
        self.state()
            .workflows
            .iter()
            .find(|(summary, _)| summary.id == workflow_id)
            .map(|(_, description)| description.clone())
            .ok_or_else(|| anyhow!("no workflow {workflow_id}"))
    }

    async fn invoke_workflow(&self, workflow_id: &str, request: &InvocationRequest) -> anyhow::Result<Value> {
        self.record("invoke_workflow");
        let mut state = self.state();
        let id = state.fresh_id("inv");
        state.invocations.push((workflow_id.to_string(), request.clone()));
        Ok(json!({
            "id": id,
            "workflow_id": workflow_id,
            "history_id": request.history.trim_start_matches("hist_id="),
            "state": "new",
        }))
    }

    async fn download_dataset(&self, dataset_id: &str, destination: &Path, _wait_for_completion: bool) -> anyhow::Result<()> {
        self.record("download_dataset");
        let known = self
            .state()
            .history_contents
            .values()
            .flatten()
            .any(|content| content.id == dataset_id);
        if !known {
            bail!("no dataset {dataset_id}");
        }
        tokio::fs::write(destination, format!("contents of {dataset_id}\n")).await?;
        Ok(())
    }
}
