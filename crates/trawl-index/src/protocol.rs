//! Request and response messages exchanged with the index worker.
//!
//! Every message serializes with camelCase field names so it can cross a
//! process or UI boundary unchanged.

use serde::{Deserialize, Serialize};

use crate::types::SearchOptions;

/// One file supplied in an index delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaFile {
    /// Stable identity of the file within the workspace
    pub file_key: String,
    /// Change-detection token; equal signatures skip re-parsing
    pub signature: String,
    /// Imported root the file belongs to
    pub root_id: String,
    /// Display name of the imported root
    pub source_name: String,
    /// Path of the file inside its root
    pub file_path: String,
    /// File text, or `None` when the collaborator could not read it
    #[serde(default)]
    pub text: Option<String>,
}

impl DeltaFile {
    /// Creates a readable delta file.
    #[must_use]
    pub fn new(
        file_key: impl Into<String>,
        signature: impl Into<String>,
        root_id: impl Into<String>,
        source_name: impl Into<String>,
        file_path: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            file_key: file_key.into(),
            signature: signature.into(),
            root_id: root_id.into(),
            source_name: source_name.into(),
            file_path: file_path.into(),
            text: Some(text.into()),
        }
    }

    /// Marks the file as unreadable.
    #[must_use]
    pub fn unreadable(mut self) -> Self {
        self.text = None;
        self
    }
}

/// Incremental update to one workspace index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDeltaRequest {
    /// Target workspace
    pub workspace_id: String,
    /// Clear the workspace before applying the delta
    #[serde(default)]
    pub replace: bool,
    /// Files to add or refresh
    #[serde(default)]
    pub files: Vec<DeltaFile>,
    /// Keys to remove
    #[serde(default)]
    pub removed_file_keys: Vec<String>,
    /// Number of files the collaborator expects in the workspace
    #[serde(default)]
    pub total_files: usize,
}

impl IndexDeltaRequest {
    /// Creates an empty delta for `workspace_id`.
    #[must_use]
    pub fn new(workspace_id: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            ..Self::default()
        }
    }

    /// Sets the replace flag.
    #[must_use]
    pub const fn with_replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    /// Adds a file.
    #[must_use]
    pub fn with_file(mut self, file: DeltaFile) -> Self {
        self.files.push(file);
        self
    }

    /// Adds a key to remove.
    #[must_use]
    pub fn with_removed(mut self, file_key: impl Into<String>) -> Self {
        self.removed_file_keys.push(file_key.into());
        self
    }

    /// Sets the expected total file count.
    #[must_use]
    pub const fn with_total_files(mut self, total: usize) -> Self {
        self.total_files = total;
        self
    }
}

/// Result of applying an index delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStatusResponse {
    /// Workspace that was updated
    pub workspace_id: String,
    /// Fully parsed files now in the index
    pub indexed_files: usize,
    /// Files re-parsed by this delta
    pub changed_files: usize,
    /// Expected total supplied by the caller
    pub total_files: usize,
}

/// Search over one workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Caller-chosen id echoed in the response
    pub request_id: u64,
    /// Workspace to search
    pub workspace_id: String,
    /// Text or regex query, possibly empty
    #[serde(default)]
    pub query: String,
    /// Query options
    #[serde(default)]
    pub options: SearchOptions,
}

impl SearchRequest {
    /// Creates a search with default options.
    #[must_use]
    pub fn new(request_id: u64, workspace_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            request_id,
            workspace_id: workspace_id.into(),
            query: query.into(),
            options: SearchOptions::default(),
        }
    }

    /// Replaces the options.
    #[must_use]
    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SearchFilters;

    #[test]
    fn delta_uses_camel_case() {
        let delta = IndexDeltaRequest::new("ws")
            .with_replace(true)
            .with_file(DeltaFile::new("k1", "sig", "root", "bundle.zip", "logs/a.log", "x"))
            .with_removed("k0")
            .with_total_files(2);

        let json = serde_json::to_value(&delta).expect("serialize");
        assert_eq!(json["workspaceId"], "ws");
        assert_eq!(json["removedFileKeys"][0], "k0");
        assert_eq!(json["totalFiles"], 2);
        assert_eq!(json["files"][0]["fileKey"], "k1");
        assert_eq!(json["files"][0]["sourceName"], "bundle.zip");
    }

    #[test]
    fn delta_missing_fields_default() {
        let delta: IndexDeltaRequest =
            serde_json::from_str(r#"{"workspaceId":"ws","files":[{"fileKey":"k","signature":"s","rootId":"r","sourceName":"n","filePath":"p"}]}"#)
                .expect("deserialize");
        assert!(!delta.replace);
        assert!(delta.removed_file_keys.is_empty());
        assert_eq!(delta.files[0].text, None);
    }

    #[test]
    fn unreadable_clears_text() {
        let file = DeltaFile::new("k", "s", "r", "n", "p", "body").unreadable();
        assert!(file.text.is_none());
    }

    #[test]
    fn search_request_options_default() {
        let req: SearchRequest =
            serde_json::from_str(r#"{"requestId":7,"workspaceId":"ws","query":"boom"}"#).expect("deserialize");
        assert_eq!(req.request_id, 7);
        assert_eq!(req.options, SearchOptions::default());

        let req = SearchRequest::new(8, "ws", "")
            .with_options(SearchOptions::default().with_filters(SearchFilters::new().with_level("error")));
        let json = serde_json::to_value(&req).expect("serialize");
        assert_eq!(json["options"]["filters"]["level"], "error");
        assert_eq!(json["options"]["contextLines"], 2);
    }
}
