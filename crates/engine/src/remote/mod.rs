//! Capability interface over the Galaxy server.
//!
//! Everything the engine does against Galaxy goes through [`GalaxyApi`]. The
//! HTTP implementation talks to a real server; the in-memory implementation
//! backs tests and lets callers exercise the engine without network access.

mod http;
mod memory;

use std::path::Path;

use async_trait::async_trait;
use glxy_types::{
    CollectionRequest, History, HistoryContent, InvocationRequest, Library, LibraryEntry, WorkflowDescription, WorkflowSummary,
};
use serde_json::Value;

pub use http::HttpGalaxyApi;
pub use memory::InMemoryGalaxy;

/// Arguments for importing a file that already lives on the Galaxy server's filesystem.
#[derive(Debug, Clone, Copy)]
pub struct ServerUpload<'a> {
    pub library_id: &'a str,
    pub folder_id: &'a str,
    pub local_path: &'a Path,
    /// Link to the file in place instead of copying it into Galaxy's store.
    pub link_only: bool,
    pub file_type: &'a str,
}

/// Remote library, history and workflow operations.
///
/// Name-based listings return every exact match; callers decide what zero or
/// several matches mean.
#[async_trait]
pub trait GalaxyApi: Send + Sync {
    async fn list_libraries(&self, name: &str) -> anyhow::Result<Vec<Library>>;

    async fn create_library(&self, name: &str) -> anyhow::Result<Library>;

    /// Folders of a library whose full path equals `name`.
    async fn list_folders(&self, library_id: &str, name: &str) -> anyhow::Result<Vec<LibraryEntry>>;

    /// Create `folder_name` under `parent_folder_id`, or under the library root when `None`.
    async fn create_folder(
        &self,
        library_id: &str,
        folder_name: &str,
        parent_folder_id: Option<&str>,
    ) -> anyhow::Result<Vec<LibraryEntry>>;

    /// Flat listing of every folder and dataset in a library.
    async fn library_contents(&self, library_id: &str) -> anyhow::Result<Vec<LibraryEntry>>;

    async fn upload_from_server_filesystem(&self, upload: ServerUpload<'_>) -> anyhow::Result<Vec<LibraryEntry>>;

    async fn list_histories(&self, name: &str) -> anyhow::Result<Vec<History>>;

    async fn create_history(&self, name: &str) -> anyhow::Result<History>;

    async fn history_contents(&self, history_id: &str) -> anyhow::Result<Vec<HistoryContent>>;

    async fn copy_library_dataset_to_history(&self, history_id: &str, dataset_id: &str) -> anyhow::Result<HistoryContent>;

    async fn create_history_collection(&self, history_id: &str, request: &CollectionRequest) -> anyhow::Result<HistoryContent>;

    async fn workflows_by_name(&self, name: &str) -> anyhow::Result<Vec<WorkflowSummary>>;

    async fn export_workflow(&self, workflow_id: &str) -> anyhow::Result<WorkflowDescription>;

    /// Start an invocation and return Galaxy's raw response.
    async fn invoke_workflow(&self, workflow_id: &str, request: &InvocationRequest) -> anyhow::Result<Value>;

    async fn download_dataset(&self, dataset_id: &str, destination: &Path, wait_for_completion: bool) -> anyhow::Result<()>;
}
