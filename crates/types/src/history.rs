//! History model: named execution contexts and the datasets they hold.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::library::DatasetSource;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct History {
    pub id: String,
    pub name: String,
}

/// One item of a history's contents listing (a dataset or a collection).
///
/// Fields the tooling does not interpret are kept in `extra` so the listing can
/// be written back out unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryContent {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    /// File extension Galaxy assigned to the dataset (`bam`, `fastqsanger`, ...).
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl HistoryContent {
    /// True for datasets that finished successfully and can be downloaded.
    pub fn is_ready_file(&self) -> bool {
        self.kind.as_deref() == Some("file") && self.state.as_deref() == Some("ok")
    }
}

/// A dataset wired into a history and named for use as a collection element.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryElement {
    pub id: String,
    pub src: DatasetSource,
    pub name: String,
}

/// Body of a dataset collection creation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionRequest {
    pub collection_type: String,
    pub name: String,
    pub element_identifiers: Vec<HistoryElement>,
}

impl CollectionRequest {
    pub fn list(name: impl Into<String>, element_identifiers: Vec<HistoryElement>) -> Self {
        Self {
            collection_type: "list".to_string(),
            name: name.into(),
            element_identifiers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ready_file_requires_ok_state() {
        let pending: HistoryContent =
            serde_json::from_value(json!({"id": "a", "name": "out.vcf", "type": "file", "state": "running"})).unwrap();
        let done: HistoryContent =
            serde_json::from_value(json!({"id": "b", "name": "out.vcf", "type": "file", "state": "ok"})).unwrap();
        let collection: HistoryContent =
            serde_json::from_value(json!({"id": "c", "name": "reads", "type": "collection", "state": "ok"})).unwrap();

        assert!(!pending.is_ready_file());
        assert!(done.is_ready_file());
        assert!(!collection.is_ready_file());
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let raw = json!({"id": "a", "name": "out.vcf", "hid": 4, "visible": true});
        let content: HistoryContent = serde_json::from_value(raw).unwrap();
        assert_eq!(content.extra["hid"], json!(4));

        let back = serde_json::to_value(&content).unwrap();
        assert_eq!(back["visible"], json!(true));
        assert_eq!(back["name"], json!("out.vcf"));
    }

    #[test]
    fn list_collection_request_shape() {
        let request = CollectionRequest::list(
            "tumor",
            vec![HistoryElement {
                id: "1".into(),
                src: DatasetSource::Hda,
                name: "r1".into(),
            }],
        );
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["collection_type"], json!("list"));
        assert_eq!(value["element_identifiers"][0], json!({"id": "1", "src": "hda", "name": "r1"}));
    }
}
