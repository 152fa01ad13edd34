//! Data library model: libraries, their flat content listings, and dataset references.

use serde::{Deserialize, Serialize};

/// Top-level named container in a Galaxy instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Library {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub deleted: bool,
    /// Folder that holds first-level folders and datasets.
    #[serde(default)]
    pub root_folder_id: Option<String>,
}

/// One row of a library's flat contents listing.
///
/// Galaxy reports every folder and dataset of a library in a single list where
/// `name` is the full slash-prefixed path (`/bar/baz` or `/bar/sample.bam`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LibraryEntry {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl LibraryEntry {
    pub fn is_folder(&self) -> bool {
        self.kind.as_deref() == Some("folder")
    }

    pub fn is_dataset(&self) -> bool {
        self.kind.as_deref() == Some("file")
    }
}

/// Result of resolving a filesystem-style path against the library tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalaxyEntity {
    Library(Library),
    Entry(LibraryEntry),
}

impl GalaxyEntity {
    pub fn id(&self) -> &str {
        match self {
            GalaxyEntity::Library(library) => &library.id,
            GalaxyEntity::Entry(entry) => &entry.id,
        }
    }

    /// Library name for a library, full path for a folder or dataset.
    pub fn name(&self) -> &str {
        match self {
            GalaxyEntity::Library(library) => &library.name,
            GalaxyEntity::Entry(entry) => &entry.name,
        }
    }
}

/// Where a workflow input dataset lives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DatasetSource {
    /// Library dataset.
    Ld,
    /// History dataset.
    Hda,
    /// History dataset collection.
    Hdca,
}

/// `{id, src}` pair used to wire a dataset into a workflow input step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatasetRef {
    pub id: String,
    pub src: DatasetSource,
}

impl DatasetRef {
    pub fn new(id: impl Into<String>, src: DatasetSource) -> Self {
        Self { id: id.into(), src }
    }

    pub fn library_dataset(id: impl Into<String>) -> Self {
        Self::new(id, DatasetSource::Ld)
    }
}
