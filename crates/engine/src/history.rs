//! Histories: naming, lookup and populating them with sample datasets.

use std::path::Path;

use glxy_types::{CollectionRequest, DatasetRef, DatasetSource, History, HistoryElement};
use glxy_util::strip_extension;
use rand::Rng;
use tracing::info;

use crate::error::{GalaxyError, Result};
use crate::remote::GalaxyApi;

const SUFFIX_LEN: usize = 8;
const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Eight characters drawn uniformly from `[a-z0-9]`.
pub fn random_suffix() -> String {
    suffix_from(&mut rand::thread_rng())
}

fn suffix_from(rng: &mut impl Rng) -> String {
    (0..SUFFIX_LEN)
        .map(|_| char::from(SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())]))
        .collect()
}

/// History name for one run: `"<workflow> <sample> <suffix>"`.
pub fn history_name(workflow: &str, sample: &str, suffix: &str) -> String {
    format!("{workflow} {sample} {suffix}")
}

/// Find the single history named `name`; several matches fail.
pub async fn find_history(api: &dyn GalaxyApi, name: &str) -> Result<Option<History>> {
    let mut histories = api.list_histories(name).await?;
    histories.retain(|history| history.name == name);
    match histories.len() {
        0 => Ok(None),
        1 => Ok(histories.pop()),
        _ => Err(GalaxyError::history_lookup(name, "multiple histories found")),
    }
}

pub async fn get_or_create_history(api: &dyn GalaxyApi, name: &str) -> Result<History> {
    match find_history(api, name).await? {
        Some(history) => Ok(history),
        None => Ok(api.create_history(name).await?),
    }
}

/// Copy library datasets into a history and return what the sample input step should receive.
///
/// One dataset is used as is; several are grouped into a `list` collection
/// named after the sample.
pub async fn create_dataset_or_collection(
    api: &dyn GalaxyApi,
    sample_name: &str,
    history_id: &str,
    library_dataset_ids: &[String],
) -> Result<DatasetRef> {
    info!("Adding sample datasets to history");
    let mut elements = Vec::with_capacity(library_dataset_ids.len());
    for dataset_id in library_dataset_ids {
        let content = api.copy_library_dataset_to_history(history_id, dataset_id).await?;
        let name = element_name(&content.name, content.extension.as_deref());
        elements.push(HistoryElement {
            id: content.id,
            src: DatasetSource::Hda,
            name,
        });
    }

    match elements.len() {
        0 => Err(GalaxyError::EmptySample {
            name: sample_name.to_string(),
        }),
        1 => {
            let element = elements.remove(0);
            Ok(DatasetRef::new(element.id, element.src))
        }
        _ => {
            info!("Creating collection");
            let request = CollectionRequest::list(sample_name, elements);
            let collection = api.create_history_collection(history_id, &request).await?;
            Ok(DatasetRef::new(collection.id, DatasetSource::Hdca))
        }
    }
}

/// Collection element identifier: the base name without its `.extension` suffix.
fn element_name(dataset_name: &str, extension: Option<&str>) -> String {
    let base_name = Path::new(dataset_name)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| dataset_name.to_string());
    match extension {
        Some(extension) => strip_extension(&base_name, extension).to_string(),
        None => base_name,
    }
}
