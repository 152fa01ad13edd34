//! Filesystem-style access to Galaxy data libraries.
//!
//! Galaxy addresses libraries, folders and datasets by id. These helpers accept
//! a path such as `"My library/folder/subfolder/reads.fq"` instead: the first
//! segment names the library and the rest form the full folder or dataset path
//! inside it (`/folder/subfolder/reads.fq`).
//!
//! Given this tree:
//!
//! ```text
//! Library 1
//!   /Folder A
//!   /Folder B
//!     /Folder B/Folder C
//!       /Folder B/Folder C/File 1
//! ```
//!
//! `"Library 1/Folder B/Folder C/File 1"` resolves to the dataset,
//! `"Library 1/Folder B"` to the folder and `"Library 1"` to the library.
//!
//! Lookups always re-fetch from the server; nothing is cached between calls.

use glxy_types::{GalaxyEntity, Library, LibraryEntry};
use tracing::info;

use crate::error::{GalaxyError, Result};
use crate::remote::GalaxyApi;

/// Split a path into its library name and the folder/dataset segments below it.
///
/// Segments are kept as written, empty ones included: `lib/` yields `[""]`,
/// which names the library's root folder `/`.
pub fn split_library_path(path: &str) -> (&str, Vec<&str>) {
    let mut parts = path.split('/');
    let library_name = parts.next().unwrap_or_default();
    (library_name, parts.collect())
}

/// Full in-library path for a run of segments: `["bar", "baz"]` becomes `/bar/baz`.
pub fn folder_path(segments: &[&str]) -> String {
    format!("/{}", segments.join("/"))
}

/// Find the single library named `name`.
///
/// Returns `None` when no library matches and fails when several do.
pub async fn find_library(api: &dyn GalaxyApi, name: &str) -> Result<Option<Library>> {
    let mut libraries = api.list_libraries(name).await?;
    libraries.retain(|library| library.name == name);
    match libraries.len() {
        0 => Ok(None),
        1 => Ok(libraries.pop()),
        _ => Err(GalaxyError::AmbiguousLibrary { name: name.to_string() }),
    }
}

/// Resolve a filesystem-style path to a library, folder or dataset.
///
/// Returns `Ok(None)` when the library or the entry below it does not exist.
/// Fails with [`GalaxyError::AmbiguousLibrary`] when the library name matches
/// more than one library.
pub async fn get_path(api: &dyn GalaxyApi, path: &str) -> Result<Option<GalaxyEntity>> {
    let (library_name, remainder) = split_library_path(path);
    let Some(library) = find_library(api, library_name).await? else {
        return Ok(None);
    };

    if remainder.is_empty() {
        return Ok(Some(GalaxyEntity::Library(library)));
    }

    let subpath = folder_path(&remainder);
    let contents = api.library_contents(&library.id).await?;
    Ok(contents
        .into_iter()
        .find(|entry| entry.name == subpath)
        .map(GalaxyEntity::Entry))
}

/// Create the library and every folder in `path` that does not exist yet, like `mkdir -p`.
///
/// `make_path(api, "foo/bar/baz")` creates the library `foo` and the folders
/// `/bar` and `/bar/baz` as needed. Existing folders are left alone, so calling
/// this repeatedly with the same path, or a prefix of it, is safe.
pub async fn make_path(api: &dyn GalaxyApi, path: &str) -> Result<()> {
    let (library_name, segments) = split_library_path(path);

    let library = match find_library(api, library_name).await? {
        Some(library) => library,
        None => {
            info!("creating library: {}", library_name);
            api.create_library(library_name).await?
        }
    };

    if library.deleted {
        return Err(GalaxyError::DeletedLibraryConflict {
            name: library_name.to_string(),
        });
    }

    for (index, name) in segments.iter().enumerate() {
        let full = folder_path(&segments[..=index]);
        let existing = api.list_folders(&library.id, &full).await?;
        match existing.len() {
            0 => {
                let parent_folder_id = if index > 0 {
                    let parent = find_parent_folder(api, &library, &folder_path(&segments[..index])).await?;
                    Some(parent.id)
                } else {
                    None
                };
                info!("creating folder: {}{}", library_name, full);
                api.create_folder(&library.id, name, parent_folder_id.as_deref()).await?;
            }
            1 => {}
            _ => {
                return Err(GalaxyError::AmbiguousFolder {
                    library: library.name.clone(),
                    path: full,
                });
            }
        }
    }

    Ok(())
}

async fn find_parent_folder(api: &dyn GalaxyApi, library: &Library, parent_path: &str) -> Result<LibraryEntry> {
    let mut parents = api.list_folders(&library.id, parent_path).await?;
    match parents.len() {
        0 => Err(GalaxyError::MissingParentFolder {
            library: library.name.clone(),
            path: parent_path.to_string(),
        }),
        1 => Ok(parents.remove(0)),
        _ => Err(GalaxyError::AmbiguousParentFolder {
            library: library.name.clone(),
            path: parent_path.to_string(),
        }),
    }
}
