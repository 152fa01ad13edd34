//! Importing sample files from the Galaxy server's filesystem into a library folder.

use std::path::Path;

use glxy_types::{GalaxyEntity, Library};
use tracing::info;

use crate::error::{GalaxyError, Result};
use crate::library_fs::{find_library, get_path, make_path, split_library_path};
use crate::remote::{GalaxyApi, ServerUpload};

/// Library and folder id that uploads into `library_folder` target.
#[derive(Debug, Clone)]
pub struct UploadTarget {
    pub library: Library,
    pub folder_id: String,
}

/// Drop empty segments so `runs//s1/` names the same folder as `runs/s1`.
pub fn normalize_library_folder(library_folder: &str) -> String {
    let (library_name, segments) = split_library_path(library_folder);
    std::iter::once(library_name)
        .chain(segments.into_iter().filter(|segment| !segment.is_empty()))
        .collect::<Vec<_>>()
        .join("/")
}

/// Ensure `library_folder` exists and resolve the ids needed to upload into it.
///
/// A bare library name resolves to the library's root folder.
pub async fn resolve_library_folder(api: &dyn GalaxyApi, library_folder: &str) -> Result<UploadTarget> {
    let library_folder = &normalize_library_folder(library_folder);
    make_path(api, library_folder).await?;
    let missing = || GalaxyError::MissingFolder {
        path: library_folder.to_string(),
    };

    match get_path(api, library_folder).await?.ok_or_else(missing)? {
        GalaxyEntity::Library(library) => {
            let folder_id = library.root_folder_id.clone().ok_or_else(missing)?;
            Ok(UploadTarget { library, folder_id })
        }
        GalaxyEntity::Entry(folder) => {
            let (library_name, _) = split_library_path(library_folder);
            let library = find_library(api, library_name).await?.ok_or_else(missing)?;
            Ok(UploadTarget {
                library,
                folder_id: folder.id,
            })
        }
    }
}

/// Link `local_path` into `library_folder` unless a dataset with the same name is already there.
///
/// Returns the library dataset id, either the existing one or the new upload's.
pub async fn upload_dataset(api: &dyn GalaxyApi, local_path: &Path, file_type: &str, library_folder: &str) -> Result<String> {
    let library_folder = &normalize_library_folder(library_folder);
    let target = resolve_library_folder(api, library_folder).await?;
    let data_name = local_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let galaxy_dataset = format!("{library_folder}/{data_name}");

    if let Some(existing) = get_path(api, &galaxy_dataset).await? {
        info!("Skipping upload, file exists at \"{}\"", galaxy_dataset);
        return Ok(existing.id().to_string());
    }

    info!("Uploading: {}", galaxy_dataset);
    info!("File type: {}", file_type);
    info!("File path: {}", local_path.display());
    let mut uploaded = api
        .upload_from_server_filesystem(ServerUpload {
            library_id: &target.library.id,
            folder_id: &target.folder_id,
            local_path,
            link_only: true,
            file_type,
        })
        .await?;
    if uploaded.is_empty() {
        return Err(anyhow::anyhow!("upload of {} returned no datasets", local_path.display()).into());
    }
    Ok(uploaded.remove(0).id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::InMemoryGalaxy;

    #[tokio::test]
    async fn library_root_resolves_to_root_folder() {
        let galaxy = InMemoryGalaxy::new();
        let target = resolve_library_folder(&galaxy, "runs").await.unwrap();
        assert_eq!(Some(target.folder_id), target.library.root_folder_id);
    }

    #[tokio::test]
    async fn nested_folder_is_created_and_resolved() {
        let galaxy = InMemoryGalaxy::new();
        let target = resolve_library_folder(&galaxy, "runs/p1/s1").await.unwrap();
        let folder = galaxy
            .contents(&target.library.id)
            .into_iter()
            .find(|entry| entry.id == target.folder_id)
            .unwrap();
        assert_eq!(folder.name, "/p1/s1");
    }

    #[tokio::test]
    async fn uploads_new_file_into_folder() {
        let galaxy = InMemoryGalaxy::new();
        let id = upload_dataset(&galaxy, Path::new("/data/s1_R1.fq"), "fastqsanger", "runs/s1")
            .await
            .unwrap();

        let lib = galaxy.libraries()[0].id.clone();
        let entry = galaxy.contents(&lib).into_iter().find(|entry| entry.id == id).unwrap();
        assert_eq!(entry.name, "/s1/s1_R1.fq");
        assert_eq!(galaxy.call_count("upload_from_server_filesystem"), 1);
    }

    #[tokio::test]
    async fn existing_dataset_is_reused_without_upload() {
        let galaxy = InMemoryGalaxy::new();
        let lib = galaxy.add_library("runs", false);
        galaxy.add_folder(&lib, "/s1");
        let existing = galaxy.add_dataset(&lib, "/s1/s1_R1.fq", "fastqsanger");

        let id = upload_dataset(&galaxy, Path::new("/data/s1_R1.fq"), "fastqsanger", "runs/s1")
            .await
            .unwrap();

        assert_eq!(id, existing);
        assert_eq!(galaxy.call_count("upload_from_server_filesystem"), 0);
    }

    #[test]
    fn library_folder_loses_empty_segments() {
        assert_eq!(normalize_library_folder("runs//s1/"), "runs/s1");
        assert_eq!(normalize_library_folder("runs/"), "runs");
        assert_eq!(normalize_library_folder("runs/p1/s1"), "runs/p1/s1");
    }

    #[tokio::test]
    async fn doubled_and_trailing_slashes_upload_into_the_same_folder() {
        let galaxy = InMemoryGalaxy::new();
        let id = upload_dataset(&galaxy, Path::new("/data/s1_R1.fq"), "fastqsanger", "runs//s1/")
            .await
            .unwrap();

        let resolved = get_path(&galaxy, "runs/s1/s1_R1.fq").await.unwrap().unwrap();
        assert_eq!(resolved.id(), id);
        let again = upload_dataset(&galaxy, Path::new("/data/s1_R1.fq"), "fastqsanger", "runs/s1")
            .await
            .unwrap();
        assert_eq!(again, id);
        assert_eq!(galaxy.call_count("upload_from_server_filesystem"), 1);
    }

    #[tokio::test]
    async fn uploads_at_library_root() {
        let galaxy = InMemoryGalaxy::new();
        upload_dataset(&galaxy, Path::new("/data/ref.fa"), "fasta", "refs").await.unwrap();
        assert!(get_path(&galaxy, "refs/ref.fa").await.unwrap().is_some());
    }
}
